use crate::error::{ModelError, Result};
use crate::schema::AssumptionCode;
use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Analyst adjustments to the derived forecast assumptions.
///
/// An override replaces the averaged forecast formula with a constant input
/// cell. Overrides never touch historical years.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct AssumptionOverrides {
    #[schemars(
        description = "Ordered list of assumption overrides. A year-specific override wins over a set_all override for the same code."
    )]
    #[serde(default)]
    pub overrides: Vec<AssumptionOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AssumptionOverride {
    /// Use `value` for every forecast year of the assumption.
    SetAll {
        #[schemars(description = "Assumption code, e.g. REV_GROWTH or DSO.")]
        code: AssumptionCode,
        value: f64,
    },

    /// Use `value` for a single forecast year.
    SetYear {
        code: AssumptionCode,
        #[schemars(description = "Forecast year the value applies to.")]
        year: i32,
        value: f64,
    },
}

impl AssumptionOverride {
    pub fn code(&self) -> AssumptionCode {
        match self {
            AssumptionOverride::SetAll { code, .. } | AssumptionOverride::SetYear { code, .. } => *code,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            AssumptionOverride::SetAll { value, .. } | AssumptionOverride::SetYear { value, .. } => *value,
        }
    }
}

impl AssumptionOverrides {
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn set_all(mut self, code: AssumptionCode, value: f64) -> Self {
        self.overrides.push(AssumptionOverride::SetAll { code, value });
        self
    }

    pub fn set_year(mut self, code: AssumptionCode, year: i32, value: f64) -> Self {
        self.overrides
            .push(AssumptionOverride::SetYear { code, year, value });
        self
    }

    /// The overriding value for `code` in forecast year `year`, if any.
    /// Later entries of the same kind win over earlier ones.
    pub fn value_for(&self, code: AssumptionCode, year: i32) -> Option<f64> {
        let year_specific = self.overrides.iter().rev().find_map(|o| match o {
            AssumptionOverride::SetYear { code: c, year: y, value } if *c == code && *y == year => Some(*value),
            _ => None,
        });

        year_specific.or_else(|| {
            self.overrides.iter().rev().find_map(|o| match o {
                AssumptionOverride::SetAll { code: c, value } if *c == code => Some(*value),
                _ => None,
            })
        })
    }

    /// Every override must carry a finite value; it becomes an input cell.
    pub fn validate(&self) -> Result<()> {
        match self.overrides.iter().find(|o| !o.value().is_finite()) {
            Some(o) => Err(ModelError::InvalidConfig(format!(
                "override of {} must be a finite number, got {}",
                o.code(),
                o.value()
            ))),
            None => Ok(()),
        }
    }

    /// Logs overrides that target a year outside the forecast horizon.
    pub fn warn_unused(&self, forecast_years: &[i32]) {
        for o in &self.overrides {
            if let AssumptionOverride::SetYear { code, year, .. } = o {
                if !forecast_years.contains(year) {
                    warn!(
                        "Override of {} for {} ignored: not a forecast year ({:?})",
                        code, year, forecast_years
                    );
                }
            }
        }
    }

    pub fn get_json_schema() -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(schemars::schema_for!(AssumptionOverrides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_non_finite_values() {
        let finite = AssumptionOverrides::default()
            .set_all(AssumptionCode::CapexRate, 0.07)
            .set_year(AssumptionCode::DivPayout, 2027, -0.1);
        assert!(finite.validate().is_ok());

        let nan = finite.clone().set_year(AssumptionCode::Dio, 2027, f64::NAN);
        let err = nan.validate().unwrap_err().to_string();
        assert!(err.contains("DIO"));

        let infinite = AssumptionOverrides::default().set_all(AssumptionCode::RevGrowth, f64::NEG_INFINITY);
        assert!(infinite.validate().is_err());
    }

    #[test]
    fn test_year_override_wins_over_set_all() {
        let overrides = AssumptionOverrides::default()
            .set_all(AssumptionCode::RevGrowth, 0.05)
            .set_year(AssumptionCode::RevGrowth, 2026, 0.08);

        assert_eq!(overrides.value_for(AssumptionCode::RevGrowth, 2025), Some(0.05));
        assert_eq!(overrides.value_for(AssumptionCode::RevGrowth, 2026), Some(0.08));
        assert_eq!(overrides.value_for(AssumptionCode::Dso, 2026), None);
    }

    #[test]
    fn test_later_entry_wins() {
        let overrides = AssumptionOverrides::default()
            .set_all(AssumptionCode::Dso, 30.0)
            .set_all(AssumptionCode::Dso, 45.0);
        assert_eq!(overrides.value_for(AssumptionCode::Dso, 2030), Some(45.0));
    }

    #[test]
    fn test_deserialize_tagged_actions() {
        let json = r#"{
            "overrides": [
                { "action": "set_all", "code": "CAPEX_RATE", "value": 0.07 },
                { "action": "set_year", "code": "DIV_PAYOUT", "year": 2027, "value": 0.5 }
            ]
        }"#;
        let overrides: AssumptionOverrides = serde_json::from_str(json).unwrap();
        assert_eq!(overrides.overrides.len(), 2);
        assert_eq!(overrides.overrides[1].code(), AssumptionCode::DivPayout);
        assert_eq!(overrides.value_for(AssumptionCode::DivPayout, 2027), Some(0.5));
        assert_eq!(overrides.value_for(AssumptionCode::DivPayout, 2028), None);
    }

    #[test]
    fn test_schema_lists_actions() {
        let schema = AssumptionOverrides::get_json_schema().unwrap().to_string();
        assert!(schema.contains("set_all"));
        assert!(schema.contains("set_year"));
    }
}
