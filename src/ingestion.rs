use crate::error::{ModelError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// One reporting period of one raw statement: column name to cell value.
pub type RawRow = BTreeMap<String, serde_json::Value>;

/// Raw statement tables as delivered by a data provider.
///
/// Column names are whatever the provider uses; values may be numbers,
/// numeric strings, nulls or junk. Normalization sorts it out.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawStatements {
    #[serde(default)]
    pub income: Vec<RawRow>,
    #[serde(default)]
    pub balance: Vec<RawRow>,
    #[serde(default)]
    pub cash_flow: Vec<RawRow>,
}

impl RawStatements {
    pub fn is_empty(&self) -> bool {
        self.income.is_empty() && self.balance.is_empty() && self.cash_flow.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.income.len() + self.balance.len() + self.cash_flow.len()
    }
}

/// A listed security code, e.g. `000895` or `600519`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityId(String);

impl SecurityId {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exchange prefix used by provider queries: codes starting with `0` or
    /// `3` trade in Shenzhen, everything else in Shanghai.
    pub fn exchange_code(&self) -> &'static str {
        if self.0.starts_with('0') || self.0.starts_with('3') {
            "SZ"
        } else {
            "SH"
        }
    }

    /// Provider symbol, e.g. `SZ000895`.
    pub fn symbol(&self) -> String {
        format!("{}{}", self.exchange_code(), self.0)
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SecurityId {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Supplier of raw statements for a security.
///
/// A source with no data for the security returns empty statements rather
/// than an error; errors are reserved for unreadable or malformed data.
pub trait StatementSource {
    fn fetch_statements(&self, security_id: &SecurityId) -> Result<RawStatements>;
}

/// Reads `<root>/<security_id>.json`, a serialized [`RawStatements`].
#[derive(Debug, Clone)]
pub struct JsonStatementSource {
    root: PathBuf,
}

impl JsonStatementSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, security_id: &SecurityId) -> PathBuf {
        self.root.join(format!("{}.json", security_id))
    }
}

impl StatementSource for JsonStatementSource {
    fn fetch_statements(&self, security_id: &SecurityId) -> Result<RawStatements> {
        let path = self.path_for(security_id);
        if !path.exists() {
            info!("No statement file for {} at {}", security_id, path.display());
            return Ok(RawStatements::default());
        }

        let json = std::fs::read_to_string(&path)?;
        let statements: RawStatements = serde_json::from_str(&json)?;
        debug!(
            "Loaded {} raw rows for {} from {}",
            statements.row_count(),
            security_id,
            path.display()
        );
        Ok(statements)
    }
}

/// Fixed statements keyed by security code.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    statements: BTreeMap<String, RawStatements>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, security_id: &str, statements: RawStatements) -> Self {
        self.statements.insert(security_id.to_string(), statements);
        self
    }
}

impl StatementSource for InMemorySource {
    fn fetch_statements(&self, security_id: &SecurityId) -> Result<RawStatements> {
        Ok(self
            .statements
            .get(security_id.as_str())
            .cloned()
            .unwrap_or_default())
    }
}

/// Parses a provider payload into raw statements.
pub fn statements_from_json(json: &str) -> Result<RawStatements> {
    serde_json::from_str(json).map_err(|e| ModelError::Source(format!("malformed statement payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, serde_json::Value)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_exchange_code() {
        assert_eq!(SecurityId::new("000895").exchange_code(), "SZ");
        assert_eq!(SecurityId::new("300750").exchange_code(), "SZ");
        assert_eq!(SecurityId::new("600519").exchange_code(), "SH");
        assert_eq!(SecurityId::new(" 600519 ").symbol(), "SH600519");
    }

    #[test]
    fn test_in_memory_source_returns_empty_for_unknown_security() {
        let statements = RawStatements {
            income: vec![row(&[("REPORT_DATE", json!("2023-12-31"))])],
            ..RawStatements::default()
        };
        let source = InMemorySource::new().with("000895", statements.clone());

        assert_eq!(source.fetch_statements(&"000895".into()).unwrap(), statements);
        assert!(source.fetch_statements(&"600519".into()).unwrap().is_empty());
    }

    #[test]
    fn test_json_source_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonStatementSource::new(dir.path());
        assert!(source.fetch_statements(&"000001".into()).unwrap().is_empty());
    }

    #[test]
    fn test_json_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("000895.json"),
            r#"{ "income": [ { "REPORT_DATE": "2023-12-31 00:00:00", "TOTAL_OPERATE_INCOME": "1000" } ] }"#,
        )
        .unwrap();

        let source = JsonStatementSource::new(dir.path());
        let statements = source.fetch_statements(&"000895".into()).unwrap();
        assert_eq!(statements.income.len(), 1);
        assert!(statements.balance.is_empty());
        assert_eq!(statements.row_count(), 1);
    }

    #[test]
    fn test_json_source_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("000895.json"), "{ not json").unwrap();

        let source = JsonStatementSource::new(dir.path());
        assert!(matches!(
            source.fetch_statements(&"000895".into()),
            Err(ModelError::Serialization(_))
        ));
    }

    #[test]
    fn test_statements_from_json_reports_source_error() {
        assert!(matches!(statements_from_json("[1, 2]"), Err(ModelError::Source(_))));
    }
}
