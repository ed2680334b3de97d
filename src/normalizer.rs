use crate::ingestion::{RawRow, RawStatements};
use crate::schema::SchemaRegistry;
use crate::utils::{fiscal_year_of, trailing_window};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Column carrying the reporting date in every raw statement.
pub const REPORT_DATE_KEY: &str = "REPORT_DATE";

/// Canonical form of a provider column name.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Lenient numeric coercion: a bad cell becomes 0.0 instead of failing the
/// whole ingestion.
///
/// Accepts at most one leading minus sign and at most one decimal point
/// around an otherwise all-digit string.
pub fn parse_numeric(raw: &str) -> f64 {
    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let digits = unsigned.replacen('.', "", 1);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return 0.0;
    }
    raw.parse().ok().filter(|v: &f64| v.is_finite()).unwrap_or(0.0)
}

pub fn coerce_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_numeric(s),
        _ => 0.0,
    }
}

/// Canonical values of one fiscal year.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodRecord {
    values: BTreeMap<String, f64>,
}

impl PeriodRecord {
    /// Value of `key`, 0.0 when absent.
    pub fn get(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Historical data keyed by fiscal year, in ascending year order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataPool {
    periods: BTreeMap<i32, PeriodRecord>,
}

impl DataPool {
    pub fn years(&self) -> Vec<i32> {
        self.periods.keys().copied().collect()
    }

    pub fn get(&self, year: i32) -> Option<&PeriodRecord> {
        self.periods.get(&year)
    }

    /// Value of `key` in `year`, 0.0 when either is absent.
    pub fn value(&self, year: i32, key: &str) -> f64 {
        self.periods.get(&year).map_or(0.0, |record| record.get(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &PeriodRecord)> {
        self.periods.iter().map(|(y, r)| (*y, r))
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.periods.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    fn record_mut(&mut self, year: i32) -> &mut PeriodRecord {
        self.periods.entry(year).or_default()
    }
}

/// Turns raw provider rows into a [`DataPool`].
pub struct Normalizer<'a> {
    schema: &'a SchemaRegistry,
    window: RangeInclusive<i32>,
}

impl<'a> Normalizer<'a> {
    pub fn new(schema: &'a SchemaRegistry, as_of_year: i32, history_window_years: u32) -> Self {
        Self {
            schema,
            window: trailing_window(as_of_year, history_window_years),
        }
    }

    pub fn window(&self) -> &RangeInclusive<i32> {
        &self.window
    }

    /// Runs the full normalization. An empty pool means no usable periods.
    pub fn normalize(&self, raw: &RawStatements) -> DataPool {
        let mut pool = DataPool::default();

        // Later statements overwrite earlier ones on shared columns.
        for (name, rows) in [
            ("income statement", &raw.income),
            ("balance sheet", &raw.balance),
            ("cash flow", &raw.cash_flow),
        ] {
            let kept = rows
                .iter()
                .filter(|row| self.ingest_row(row, &mut pool))
                .count();
            debug!("{}: kept {} of {} rows", name, kept, rows.len());
        }

        if pool.is_empty() {
            warn!(
                "No fiscal-year rows within {}..={} survived normalization",
                self.window.start(),
                self.window.end()
            );
            return pool;
        }

        for (year, record) in pool.periods.iter_mut() {
            for key in self.schema.canonical_keys() {
                if !record.contains(key) {
                    record.set(key, 0.0);
                }
            }
            compute_derived_fields(*year, record);
        }

        info!("Normalized {} fiscal years: {:?}", pool.len(), pool.years());
        pool
    }

    fn ingest_row(&self, row: &RawRow, pool: &mut DataPool) -> bool {
        let Some(year) = self.fiscal_year(row) else {
            return false;
        };

        let record = pool.record_mut(year);
        for (column, value) in row {
            let key = normalize_key(column);
            if key == REPORT_DATE_KEY {
                continue;
            }
            record.set(key, coerce_value(value));
        }
        true
    }

    fn fiscal_year(&self, row: &RawRow) -> Option<i32> {
        let date = row
            .iter()
            .find(|(column, _)| normalize_key(column) == REPORT_DATE_KEY)
            .and_then(|(_, value)| value.as_str())?;
        fiscal_year_of(date).filter(|year| self.window.contains(year))
    }
}

fn compute_derived_fields(year: i32, record: &mut PeriodRecord) {
    // Interest back-fill: reported interest expense, else the financial
    // expense breakdown, else the whole financial expense line.
    if record.get("FE_INTEREST_EXPENSE") == 0.0 {
        record.set("FE_INTEREST_EXPENSE", record.get("FINANCE_EXPENSE"));
    }
    if record.get("INTEREST_EXPENSE") == 0.0 {
        record.set("INTEREST_EXPENSE", record.get("FE_INTEREST_EXPENSE"));
    }

    let ebit = record.get("TOTAL_PROFIT") + record.get("FINANCE_EXPENSE");
    record.set("EBIT_CALC", ebit);
    record.set("EBITDA_CALC", ebit);

    let mut total_equity = record.get("TOTAL_LIAB_EQUITY") - record.get("TOTAL_LIABILITIES");
    if total_equity <= 0.0 {
        total_equity = record.get("TOTAL_EQUITY") + record.get("MINORITY_EQUITY");
    }

    let liabilities_and_equity = record.get("TOTAL_LIABILITIES") + total_equity;
    record.set("TOTAL_LIABILITIES_AND_EQUITY_CALC", liabilities_and_equity);

    let check = record.get("TOTAL_ASSETS") - liabilities_and_equity;
    record.set("BALANCE_CHECK", check);
    if check.abs() > 0.5 {
        warn!(
            "{}: reported balance sheet does not balance (assets - liabilities - equity = {:.2})",
            year, check
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric("123.45"), 123.45);
        assert_eq!(parse_numeric("-7"), -7.0);
        assert_eq!(parse_numeric("42"), 42.0);
        assert_eq!(parse_numeric(".5"), 0.5);
        assert_eq!(parse_numeric("1.2.3"), 0.0);
        assert_eq!(parse_numeric("abc"), 0.0);
        assert_eq!(parse_numeric("--5"), 0.0);
        assert_eq!(parse_numeric("5-"), 0.0);
        assert_eq!(parse_numeric("1e5"), 0.0);
        assert_eq!(parse_numeric(""), 0.0);
        assert_eq!(parse_numeric("-"), 0.0);
        assert_eq!(parse_numeric("."), 0.0);
        assert_eq!(parse_numeric(&"9".repeat(400)), 0.0);
        assert_eq!(parse_numeric(&format!("-{}", "9".repeat(400))), 0.0);
    }

    #[test]
    fn test_coerce_value() {
        assert_eq!(coerce_value(&json!(12.5)), 12.5);
        assert_eq!(coerce_value(&json!(-3)), -3.0);
        assert_eq!(coerce_value(&json!("8")), 8.0);
        assert_eq!(coerce_value(&Value::Null), 0.0);
        assert_eq!(coerce_value(&json!(true)), 0.0);
        assert_eq!(coerce_value(&json!([1])), 0.0);
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  total_assets "), "TOTAL_ASSETS");
    }

    #[test]
    fn test_filters_non_fiscal_year_end_and_out_of_window_rows() {
        let schema = SchemaRegistry::standard();
        let raw = RawStatements {
            income: vec![
                row(&[("REPORT_DATE", json!("2023-12-31 00:00:00")), ("TOTAL_OPERATE_INCOME", json!("100"))]),
                row(&[("REPORT_DATE", json!("2024-06-30 00:00:00")), ("TOTAL_OPERATE_INCOME", json!("55"))]),
                row(&[("REPORT_DATE", json!("2010-12-31 00:00:00")), ("TOTAL_OPERATE_INCOME", json!("9"))]),
                row(&[("REPORT_DATE", json!("2025-12-31 00:00:00")), ("TOTAL_OPERATE_INCOME", json!("9"))]),
                row(&[("TOTAL_OPERATE_INCOME", json!("9"))]),
            ],
            ..RawStatements::default()
        };

        let pool = Normalizer::new(&schema, 2025, 7).normalize(&raw);
        assert_eq!(pool.years(), vec![2023]);
        assert_eq!(pool.value(2023, "TOTAL_OPERATE_INCOME"), 100.0);
    }

    #[test]
    fn test_every_canonical_key_is_present() {
        let schema = SchemaRegistry::standard();
        let raw = RawStatements {
            balance: vec![row(&[("report_date", json!("2022-12-31")), ("custom_column", json!("1"))])],
            ..RawStatements::default()
        };

        let pool = Normalizer::new(&schema, 2025, 7).normalize(&raw);
        let record = pool.get(2022).unwrap();
        for key in schema.canonical_keys() {
            assert!(record.contains(key), "missing {}", key);
        }
        assert_eq!(record.get("CUSTOM_COLUMN"), 1.0);
        assert!(!record.contains(REPORT_DATE_KEY));
    }

    #[test]
    fn test_later_statement_wins() {
        let schema = SchemaRegistry::standard();
        let raw = RawStatements {
            income: vec![row(&[("REPORT_DATE", json!("2023-12-31")), ("SHARED", json!(1))])],
            cash_flow: vec![row(&[("REPORT_DATE", json!("2023-12-31")), ("SHARED", json!(2))])],
            ..RawStatements::default()
        };
        let pool = Normalizer::new(&schema, 2025, 7).normalize(&raw);
        assert_eq!(pool.value(2023, "SHARED"), 2.0);
    }

    #[test]
    fn test_derived_fields() {
        let schema = SchemaRegistry::standard();
        let raw = RawStatements {
            income: vec![row(&[
                ("REPORT_DATE", json!("2023-12-31")),
                ("TOTAL_PROFIT", json!(80)),
                ("FINANCE_EXPENSE", json!(5)),
            ])],
            balance: vec![row(&[
                ("REPORT_DATE", json!("2023-12-31")),
                ("TOTAL_ASSETS", json!(1000)),
                ("TOTAL_LIABILITIES", json!(600)),
                ("TOTAL_LIAB_EQUITY", json!(990)),
            ])],
            ..RawStatements::default()
        };

        let pool = Normalizer::new(&schema, 2025, 7).normalize(&raw);
        assert_eq!(pool.value(2023, "EBIT_CALC"), 85.0);
        assert_eq!(pool.value(2023, "EBITDA_CALC"), 85.0);
        assert_eq!(pool.value(2023, "INTEREST_EXPENSE"), 5.0);
        assert_eq!(pool.value(2023, "TOTAL_LIABILITIES_AND_EQUITY_CALC"), 990.0);
        assert_eq!(pool.value(2023, "BALANCE_CHECK"), 10.0);
    }

    #[test]
    fn test_equity_falls_back_to_reported_components() {
        let schema = SchemaRegistry::standard();
        let raw = RawStatements {
            balance: vec![row(&[
                ("REPORT_DATE", json!("2023-12-31")),
                ("TOTAL_ASSETS", json!(100)),
                ("TOTAL_LIABILITIES", json!(40)),
                ("TOTAL_EQUITY", json!(55)),
                ("MINORITY_EQUITY", json!(5)),
            ])],
            ..RawStatements::default()
        };

        let pool = Normalizer::new(&schema, 2025, 7).normalize(&raw);
        assert_eq!(pool.value(2023, "TOTAL_LIABILITIES_AND_EQUITY_CALC"), 100.0);
        assert_eq!(pool.value(2023, "BALANCE_CHECK"), 0.0);
    }

    #[test]
    fn test_no_surviving_rows_gives_empty_pool() {
        let schema = SchemaRegistry::standard();
        let raw = RawStatements {
            income: vec![row(&[("REPORT_DATE", json!("2023-09-30"))])],
            ..RawStatements::default()
        };
        assert!(Normalizer::new(&schema, 2025, 7).normalize(&raw).is_empty());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let schema = SchemaRegistry::standard();
        let raw = RawStatements {
            income: vec![row(&[("REPORT_DATE", json!("2023-12-31")), ("NETPROFIT", json!("12.5"))])],
            ..RawStatements::default()
        };
        let normalizer = Normalizer::new(&schema, 2025, 7);
        let first = serde_json::to_string(&normalizer.normalize(&raw)).unwrap();
        let second = serde_json::to_string(&normalizer.normalize(&raw)).unwrap();
        assert_eq!(first, second);
    }
}
