use crate::assumptions::build_assumptions_sheet;
use crate::balancer::{warn_on_large_plugs, AccountingBalancer, PlugDiagnostic};
use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use crate::evaluate::Evaluator;
use crate::forecast::balance_sheet::{build_balance_sheet, link_closing_cash};
use crate::forecast::capex::build_capex_sheet;
use crate::forecast::cash_flow::build_cash_flow_sheet;
use crate::forecast::debt::build_debt_sheet;
use crate::forecast::income_statement::build_income_statement_sheet;
use crate::forecast::revenue::build_revenue_sheet;
use crate::forecast::working_capital::build_working_capital_sheet;
use crate::history::build_history_sheet;
use crate::ingestion::{RawStatements, SecurityId, StatementSource};
use crate::normalizer::{DataPool, Normalizer};
use crate::reference::{Namespace, ReferenceMap};
use crate::schema::SchemaRegistry;
use crate::utils::Timeline;
use crate::workbook::{BuildContext, ModelWorkbook};
use crate::writer::save_workbook;
use log::{debug, info};
use serde::Serialize;
use std::path::PathBuf;

/// Headline figures of the latest historical year, in reporting units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub latest_year: i32,
    pub revenue: f64,
    pub net_profit: f64,
    pub total_assets: f64,
    pub balance_check: f64,
    pub historical_years: Vec<i32>,
    pub forecast_years: Vec<i32>,
}

impl ModelSummary {
    fn from_pool(pool: &DataPool, timeline: &Timeline, units_divisor: f64) -> Option<Self> {
        let latest_year = pool.latest_year()?;
        let scaled = |key: &str| pool.value(latest_year, key) / units_divisor;
        Some(Self {
            latest_year,
            revenue: scaled("TOTAL_OPERATE_INCOME"),
            net_profit: scaled("NETPROFIT"),
            total_assets: scaled("TOTAL_ASSETS"),
            balance_check: scaled("BALANCE_CHECK"),
            historical_years: timeline.historical().to_vec(),
            forecast_years: timeline.forecast().to_vec(),
        })
    }
}

/// A fully laid-out model: the logical workbook plus everything needed to
/// recalculate or render it.
#[derive(Debug, Clone)]
pub struct FinancialModel {
    pub security_id: SecurityId,
    pub schema: SchemaRegistry,
    pub timeline: Timeline,
    pub workbook: ModelWorkbook,
    pub references: ReferenceMap,
    pub pool: DataPool,
    pub summary: ModelSummary,
    pub plugs: Vec<PlugDiagnostic>,
}

impl FinancialModel {
    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.workbook)
    }

    /// Recalculated value of a recorded line in the given year.
    pub fn value(&self, namespace: Namespace, key: &str, year: i32) -> Result<f64> {
        let col = self.timeline.col_of_year(year).ok_or_else(|| {
            ModelError::InvalidConfig(format!("{} is outside the model timeline", year))
        })?;
        self.evaluator().value_of(&self.references, namespace, key, col)
    }
}

/// Runs the sheet builders in dependency order over a normalized pool.
pub struct ModelEngine {
    schema: SchemaRegistry,
    config: ModelConfig,
}

impl ModelEngine {
    pub fn new(schema: SchemaRegistry, config: ModelConfig) -> Result<Self> {
        schema.validate()?;
        config.validate()?;
        Ok(Self { schema, config })
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn normalize(&self, raw: &RawStatements) -> DataPool {
        Normalizer::new(
            &self.schema,
            self.config.as_of_year(),
            self.config.history_window_years,
        )
        .normalize(raw)
    }

    pub fn build(&self, security_id: SecurityId, pool: DataPool) -> Result<FinancialModel> {
        if pool.is_empty() {
            return Err(ModelError::NoData(security_id.to_string()));
        }

        let timeline = Timeline::new(pool.years(), self.config.forecast_years);
        let ctx = BuildContext {
            schema: &self.schema,
            config: &self.config,
            timeline: &timeline,
        };
        let mut workbook = ModelWorkbook::new();
        let mut refs = ReferenceMap::new();

        info!(
            "Building model for {}: history {:?}, forecast {:?}",
            security_id,
            timeline.historical(),
            timeline.forecast()
        );

        build_history_sheet(&ctx, &pool, workbook.sheet_mut(Namespace::History), &mut refs)?;
        build_assumptions_sheet(&ctx, workbook.sheet_mut(Namespace::Assumptions), &mut refs)?;
        build_revenue_sheet(&ctx, workbook.sheet_mut(Namespace::Revenue), &mut refs)?;
        build_capex_sheet(&ctx, workbook.sheet_mut(Namespace::Capex), &mut refs)?;
        build_debt_sheet(&ctx, workbook.sheet_mut(Namespace::Financing), &mut refs)?;
        build_working_capital_sheet(&ctx, workbook.sheet_mut(Namespace::WorkingCapital), &mut refs)?;
        build_income_statement_sheet(&ctx, workbook.sheet_mut(Namespace::IncomeStatement), &mut refs)?;

        let balancer = AccountingBalancer::new(&self.schema, &timeline);
        {
            let sheet = workbook.sheet_mut(Namespace::BalanceSheet);
            let totals_row = build_balance_sheet(&ctx, sheet, &mut refs)?;
            balancer.enforce_accounting_equation(sheet, &mut refs, totals_row)?;
        }

        build_cash_flow_sheet(&ctx, workbook.sheet_mut(Namespace::CashFlow), &mut refs)?;
        link_closing_cash(&ctx, workbook.sheet_mut(Namespace::BalanceSheet), &refs)?;

        for sheet in workbook.sheets() {
            debug!("{}: {} formulas", sheet.name(), sheet.formula_count());
        }

        let plugs = {
            let mut evaluator = Evaluator::new(&workbook);
            balancer.verify_accounting_equation(&mut evaluator, &refs, self.config.balance_tolerance)?;
            balancer.plug_diagnostics(&mut evaluator, &refs)?
        };
        let flagged = warn_on_large_plugs(&plugs, self.config.plug_warning_ratio);
        if flagged == 0 {
            debug!("All forecast plugs within {:.1}% of total assets", self.config.plug_warning_ratio * 100.0);
        }

        let summary = ModelSummary::from_pool(&pool, &timeline, self.config.units_divisor)
            .ok_or_else(|| ModelError::NoData(security_id.to_string()))?;

        info!("Built {} references across {} sheets", refs.len(), workbook.sheets().len());

        Ok(FinancialModel {
            security_id,
            schema: self.schema.clone(),
            timeline,
            workbook,
            references: refs,
            pool,
            summary,
            plugs,
        })
    }
}

/// Fetches statements, builds the model and writes it to disk.
pub struct ModelBuilder<S: StatementSource> {
    source: S,
    engine: ModelEngine,
}

impl<S: StatementSource> ModelBuilder<S> {
    pub fn new(source: S, config: ModelConfig) -> Result<Self> {
        Self::with_schema(source, SchemaRegistry::standard(), config)
    }

    pub fn with_schema(source: S, schema: SchemaRegistry, config: ModelConfig) -> Result<Self> {
        Ok(Self {
            source,
            engine: ModelEngine::new(schema, config)?,
        })
    }

    pub fn engine(&self) -> &ModelEngine {
        &self.engine
    }

    /// Builds the in-memory model, or `None` when the source has no usable
    /// fiscal years for this security.
    pub fn build(&self, security_id: &SecurityId) -> Result<Option<FinancialModel>> {
        let raw = self.source.fetch_statements(security_id)?;
        info!("Fetched {} raw rows for {}", raw.row_count(), security_id);

        let pool = self.engine.normalize(&raw);
        if pool.is_empty() {
            info!("No usable data for {}", security_id);
            return Ok(None);
        }

        self.engine.build(security_id.clone(), pool).map(Some)
    }

    /// Builds the model and saves it at `<output_dir>/<id>_financial_model.xlsx`.
    /// Returns `None` when there is nothing to model.
    pub fn build_model(&self, security_id: &SecurityId) -> Result<Option<PathBuf>> {
        let Some(model) = self.build(security_id)? else {
            return Ok(None);
        };

        let path = self.engine.config().output_path(security_id.as_str());
        save_workbook(&model.workbook, &path)?;
        info!(
            "Model for {} saved ({} historical, {} forecast years)",
            security_id,
            model.timeline.historical().len(),
            model.timeline.forecast().len()
        );
        Ok(Some(path))
    }
}
