use crate::error::{ModelError, Result};
use crate::overrides::AssumptionOverrides;
use crate::utils::{current_year, Timeline};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct RevenueSegment {
    #[schemars(description = "Display name of the business segment")]
    pub name: String,

    #[schemars(description = "Constant share of historical revenue and cost attributed to this segment (0.0 to 1.0)")]
    pub share: f64,
}

impl RevenueSegment {
    pub fn new(name: impl Into<String>, share: f64) -> Self {
        Self {
            name: name.into(),
            share,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FinancingMode {
    #[default]
    #[schemars(description = "Cash-flow debt line follows the debt schedule's net borrowing row")]
    ThreadDebtSchedule,

    #[schemars(description = "Cash-flow debt line is reserved and left at zero")]
    ReservedUnpopulated,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HistoricalAddBack {
    #[default]
    #[schemars(description = "Historical D&A add-back = reported operating cash flow - reported net profit; working-capital change 0")]
    BackedOutFromOperatingCashFlow,

    #[schemars(description = "Historical D&A add-back from the capex schedule; working-capital change from the working-capital schedule")]
    ReportedDepreciation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct ModelConfig {
    #[schemars(description = "Number of projected years after the last historical year")]
    pub forecast_years: u32,

    #[schemars(description = "Number of complete fiscal years before the as-of year that are retained")]
    pub history_window_years: u32,

    #[schemars(description = "Reference year for the history window; defaults to the current calendar year")]
    pub as_of_year: Option<i32>,

    #[schemars(description = "Divisor applied to raw values on the History sheet (1e6 reports millions)")]
    pub units_divisor: f64,

    #[schemars(description = "Day count used by turnover-cycle assumptions")]
    pub days_per_year: f64,

    pub segments: Vec<RevenueSegment>,

    #[schemars(description = "Forecast segment cost as a share of the segment's revenue")]
    pub segment_cost_ratio: f64,

    #[schemars(description = "Depreciation as a share of beginning PPE")]
    pub depreciation_rate: f64,

    #[schemars(description = "Interest as a share of the debt balance")]
    pub debt_interest_rate: f64,

    #[schemars(description = "Share of revenue used for income statement lines without a dedicated driver")]
    pub fallback_expense_rate: f64,

    pub financing_mode: FinancingMode,

    pub historical_add_back: HistoricalAddBack,

    #[schemars(description = "Maximum |assets - (liabilities + equity)| accepted by verification")]
    pub balance_tolerance: f64,

    #[schemars(description = "A forecast plug above this share of total assets is logged as a warning")]
    pub plug_warning_ratio: f64,

    pub output_dir: PathBuf,

    pub assumption_overrides: AssumptionOverrides,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            forecast_years: 5,
            history_window_years: 7,
            as_of_year: None,
            units_divisor: 1e6,
            days_per_year: 360.0,
            segments: vec![
                RevenueSegment::new("Core business A", 0.6),
                RevenueSegment::new("Core business B", 0.2),
                RevenueSegment::new("Other business", 0.2),
            ],
            segment_cost_ratio: 0.75,
            depreciation_rate: 0.10,
            debt_interest_rate: 0.04,
            fallback_expense_rate: 0.01,
            financing_mode: FinancingMode::default(),
            historical_add_back: HistoricalAddBack::default(),
            balance_tolerance: 0.01,
            plug_warning_ratio: 0.05,
            output_dir: PathBuf::from("generated_models"),
            assumption_overrides: AssumptionOverrides::default(),
        }
    }
}

impl ModelConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ModelConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn as_of_year(&self) -> i32 {
        self.as_of_year.unwrap_or_else(current_year)
    }

    /// Deterministic output location for a security's workbook.
    pub fn output_path(&self, security_id: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_financial_model.xlsx", security_id))
    }

    pub fn validate(&self) -> Result<()> {
        if self.forecast_years == 0 {
            return Err(ModelError::InvalidConfig(
                "forecast_years must be at least 1".to_string(),
            ));
        }
        if self.history_window_years == 0 {
            return Err(ModelError::InvalidConfig(
                "history_window_years must be at least 1".to_string(),
            ));
        }
        let periods = u64::from(self.history_window_years) + u64::from(self.forecast_years);
        if periods > Timeline::MAX_PERIODS as u64 {
            return Err(ModelError::InvalidConfig(format!(
                "history_window_years + forecast_years must not exceed {} columns, got {}",
                Timeline::MAX_PERIODS,
                periods
            )));
        }
        if self.units_divisor <= 0.0 {
            return Err(ModelError::InvalidConfig(format!(
                "units_divisor must be positive, got {}",
                self.units_divisor
            )));
        }
        if self.days_per_year <= 0.0 {
            return Err(ModelError::InvalidConfig(format!(
                "days_per_year must be positive, got {}",
                self.days_per_year
            )));
        }
        if self.segments.is_empty() {
            return Err(ModelError::InvalidConfig(
                "at least one revenue segment is required".to_string(),
            ));
        }

        let share_sum: f64 = self.segments.iter().map(|s| s.share).sum();
        if (share_sum - 1.0).abs() > 1e-6 {
            return Err(ModelError::InvalidConfig(format!(
                "segment shares must sum to 1.0, got {}",
                share_sum
            )));
        }

        let rates = [
            ("segment_cost_ratio", self.segment_cost_ratio),
            ("depreciation_rate", self.depreciation_rate),
            ("debt_interest_rate", self.debt_interest_rate),
            ("fallback_expense_rate", self.fallback_expense_rate),
            ("balance_tolerance", self.balance_tolerance),
            ("plug_warning_ratio", self.plug_warning_ratio),
        ];
        for (name, value) in rates {
            if value < 0.0 || !value.is_finite() {
                return Err(ModelError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        self.assumption_overrides.validate()?;

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ModelConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
