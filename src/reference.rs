use crate::error::{ModelError, Result};
use crate::utils::a1;
use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Logical sheets of the model. Each namespace owns exactly one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Namespace {
    History,
    Assumptions,
    Revenue,
    Capex,
    Financing,
    WorkingCapital,
    IncomeStatement,
    BalanceSheet,
    CashFlow,
}

impl Namespace {
    /// Sheet order of the produced workbook.
    pub const ALL: [Namespace; 9] = [
        Namespace::History,
        Namespace::Assumptions,
        Namespace::Revenue,
        Namespace::Capex,
        Namespace::Financing,
        Namespace::WorkingCapital,
        Namespace::IncomeStatement,
        Namespace::BalanceSheet,
        Namespace::CashFlow,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Namespace::History => "HIST",
            Namespace::Assumptions => "ASSUMP",
            Namespace::Revenue => "REV",
            Namespace::Capex => "INV",
            Namespace::Financing => "FIN",
            Namespace::WorkingCapital => "WC",
            Namespace::IncomeStatement => "IS",
            Namespace::BalanceSheet => "BS",
            Namespace::CashFlow => "CF",
        }
    }

    pub fn sheet_name(&self) -> &'static str {
        match self {
            Namespace::History => "1.History",
            Namespace::Assumptions => "2.Assumptions",
            Namespace::Revenue => "3.Revenue Build-up",
            Namespace::Capex => "4.Capex",
            Namespace::Financing => "5.Debt",
            Namespace::WorkingCapital => "6.Working Capital",
            Namespace::IncomeStatement => "7.Income Statement",
            Namespace::BalanceSheet => "8.Balance Sheet",
            Namespace::CashFlow => "9.Cash Flow",
        }
    }

    pub fn from_sheet_name(name: &str) -> Option<Namespace> {
        Self::ALL.into_iter().find(|ns| ns.sheet_name() == name)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single cell coordinate (0-based row and column) on a namespace's sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub sheet: Namespace,
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    pub fn new(sheet: Namespace, row: u32, col: u16) -> Self {
        Self { sheet, row, col }
    }

    /// A1 address without the sheet, e.g. `C7`.
    pub fn local(&self) -> String {
        a1(self.row, self.col)
    }

    /// Sheet-qualified address, e.g. `'1.History'!C7`.
    pub fn qualified(&self) -> String {
        format!("'{}'!{}", self.sheet.sheet_name(), self.local())
    }

    /// Address as seen from a formula on `from`: local when on the same sheet.
    pub fn from_sheet(&self, from: Namespace) -> String {
        if from == self.sheet {
            self.local()
        } else {
            self.qualified()
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// The model's symbol table: `(namespace, key) -> row`.
///
/// Every key is recorded exactly once. Looking a key up before it was
/// recorded means a stage ran out of order and is reported as an error.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferenceMap {
    rows: BTreeMap<Namespace, BTreeMap<String, u32>>,
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, namespace: Namespace, key: impl Into<String>, row: u32) -> Result<()> {
        let key = key.into();
        let entries = self.rows.entry(namespace).or_default();
        if entries.contains_key(&key) {
            return Err(ModelError::DuplicateReference { namespace, key });
        }
        debug!("Recorded {}:{} at row {}", namespace, key, row + 1);
        entries.insert(key, row);
        Ok(())
    }

    pub fn lookup(&self, namespace: Namespace, key: &str) -> Result<u32> {
        self.rows
            .get(&namespace)
            .and_then(|entries| entries.get(key))
            .copied()
            .ok_or_else(|| ModelError::MissingReference {
                namespace,
                key: key.to_string(),
            })
    }

    pub fn contains(&self, namespace: Namespace, key: &str) -> bool {
        self.rows
            .get(&namespace)
            .is_some_and(|entries| entries.contains_key(key))
    }

    pub fn cell(&self, namespace: Namespace, key: &str, col: u16) -> Result<CellRef> {
        Ok(CellRef::new(namespace, self.lookup(namespace, key)?, col))
    }

    /// Formula operand for an optional line: the cell address when the key was
    /// recorded, otherwise a literal `0` so the dependent formula still renders.
    pub fn operand_or_zero(&self, namespace: Namespace, key: &str, col: u16, from: Namespace) -> String {
        match self.lookup(namespace, key) {
            Ok(row) => CellRef::new(namespace, row, col).from_sheet(from),
            Err(_) => {
                warn!("{}:{} is not available; substituting 0", namespace, key);
                "0".to_string()
            }
        }
    }

    pub fn keys(&self, namespace: Namespace) -> impl Iterator<Item = (&str, u32)> {
        self.rows
            .get(&namespace)
            .into_iter()
            .flat_map(|entries| entries.iter().map(|(k, v)| (k.as_str(), *v)))
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
