use crate::schema::{CanonicalLineItem, Category, ForecastDriver, SchemaRegistry, Sign, StatementKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountEntry {
    pub key: String,
    pub label: String,
    pub category: Category,
    pub driver: String,
    pub is_subtotal: bool,
}

impl AccountEntry {
    fn from_item(item: &CanonicalLineItem) -> Self {
        Self {
            key: item.key.clone(),
            label: item.label.clone(),
            category: item.category,
            driver: describe_driver(&item.driver),
            is_subtotal: item.is_subtotal,
        }
    }
}

/// Schema listing grouped for review: balance-sheet lines by category,
/// income and cash-flow lines in statement order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartOfAccounts {
    pub assets: Vec<AccountEntry>,
    pub liabilities: Vec<AccountEntry>,
    pub equity: Vec<AccountEntry>,
    pub unclassified: Vec<AccountEntry>,
    pub income_statement: Vec<AccountEntry>,
    pub cash_flow: Vec<AccountEntry>,
}

impl ChartOfAccounts {
    pub fn from_registry(schema: &SchemaRegistry) -> Self {
        let mut assets = Vec::new();
        let mut liabilities = Vec::new();
        let mut equity = Vec::new();
        let mut unclassified = Vec::new();

        for item in keyed(schema, StatementKind::BalanceSheet) {
            let entry = AccountEntry::from_item(item);
            match item.category {
                Category::Asset => assets.push(entry),
                Category::Liability => liabilities.push(entry),
                Category::Equity => equity.push(entry),
                Category::None => unclassified.push(entry),
            }
        }

        Self {
            assets,
            liabilities,
            equity,
            unclassified,
            income_statement: keyed(schema, StatementKind::IncomeStatement)
                .map(AccountEntry::from_item)
                .collect(),
            cash_flow: keyed(schema, StatementKind::CashFlow)
                .map(AccountEntry::from_item)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.sections().map(|(_, entries)| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sections(&self) -> impl Iterator<Item = (&'static str, &[AccountEntry])> {
        [
            ("Assets", self.assets.as_slice()),
            ("Liabilities", self.liabilities.as_slice()),
            ("Equity", self.equity.as_slice()),
            ("Balance Sheet Totals", self.unclassified.as_slice()),
            ("Income Statement", self.income_statement.as_slice()),
            ("Cash Flow", self.cash_flow.as_slice()),
        ]
        .into_iter()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str("Section,Key,Label,Driver,Is Subtotal\n");

        for (section, entries) in self.sections() {
            for entry in entries {
                output.push_str(&format!(
                    "{},{},{},{},{}\n",
                    section,
                    csv_field(&entry.key),
                    csv_field(&entry.label),
                    csv_field(&entry.driver),
                    entry.is_subtotal
                ));
            }
        }

        output
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str("# Chart of Accounts\n\n");

        for (section, entries) in self.sections() {
            if entries.is_empty() {
                continue;
            }
            output.push_str(&format!("## {}\n\n", section));
            output.push_str("| Key | Label | Forecast driver |\n");
            output.push_str("|---|---|---|\n");
            for entry in entries {
                let label = if entry.is_subtotal {
                    format!("**{}**", entry.label)
                } else {
                    entry.label.clone()
                };
                output.push_str(&format!("| `{}` | {} | {} |\n", entry.key, label, entry.driver));
            }
            output.push('\n');
        }

        output
    }
}

fn keyed(schema: &SchemaRegistry, kind: StatementKind) -> impl Iterator<Item = &CanonicalLineItem> {
    schema.statement(kind).iter().filter(|item| item.has_key())
}

fn describe_driver(driver: &ForecastDriver) -> String {
    match driver {
        ForecastDriver::HistoryOnly => "history only".to_string(),
        ForecastDriver::Revenue => "revenue build-up total".to_string(),
        ForecastDriver::Cost => "cost build-up total".to_string(),
        ForecastDriver::Ratio { assumption } => format!("ratio ({})", assumption),
        ForecastDriver::Interest => "debt schedule interest".to_string(),
        ForecastDriver::Fallback => "flat share of revenue".to_string(),
        ForecastDriver::Subtotal { terms } => {
            let parts: Vec<String> = terms
                .iter()
                .enumerate()
                .map(|(i, term)| match (i, term.sign) {
                    (0, Sign::Plus) => term.key.clone(),
                    (_, Sign::Plus) => format!("+ {}", term.key),
                    (_, Sign::Minus) => format!("- {}", term.key),
                })
                .collect();
            format!("sum: {}", parts.join(" "))
        }
        ForecastDriver::Cash => "cash-flow closing cash".to_string(),
        ForecastDriver::Receivables => "working-capital receivables".to_string(),
        ForecastDriver::Inventory => "working-capital inventory".to_string(),
        ForecastDriver::FixedAssets => "capex schedule ending PPE".to_string(),
        ForecastDriver::ShortTermDebt => "debt schedule balance".to_string(),
        ForecastDriver::RetainedEarnings => "retained earnings roll-forward".to_string(),
        ForecastDriver::CarryForward => "carried forward".to_string(),
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_sheet_lines_grouped_by_category() {
        let chart = ChartOfAccounts::from_registry(&SchemaRegistry::standard());
        assert!(chart.assets.iter().any(|e| e.key == "MONETARYFUNDS"));
        assert!(chart.liabilities.iter().any(|e| e.key == "SHORT_LOAN"));
        assert!(chart.equity.iter().any(|e| e.key == "UNDISTRIBUTED_PROFIT"));
        assert!(chart.unclassified.iter().any(|e| e.key == "TOTAL_ASSETS"));
        assert!(chart.assets.iter().all(|e| e.category == Category::Asset));
    }

    #[test]
    fn test_csv_round_trips_through_csv_reader() {
        let chart = ChartOfAccounts::from_registry(&SchemaRegistry::standard());
        let csv_text = chart.to_csv();
        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        let records: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();

        assert_eq!(records.len(), chart.len());
        assert!(records.iter().all(|r| r.len() == 5));
        let netprofit = records.iter().find(|r| &r[1] == "NETPROFIT").unwrap();
        assert_eq!(&netprofit[0], "Income Statement");
        assert!(netprofit[3].starts_with("sum: "));
    }

    #[test]
    fn test_csv_quotes_multiline_fields() {
        let mut chart = ChartOfAccounts::from_registry(&SchemaRegistry::standard());
        chart.assets.push(AccountEntry {
            key: "CUSTOM,CASH".to_string(),
            label: "Cash held\r\nin escrow, \"restricted\"".to_string(),
            category: Category::Asset,
            driver: "carried forward".to_string(),
            is_subtotal: false,
        });

        let csv_text = chart.to_csv();
        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        let records: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();

        assert_eq!(records.len(), chart.len());
        assert!(records.iter().all(|r| r.len() == 5));
        let custom = records.iter().find(|r| &r[1] == "CUSTOM,CASH").unwrap();
        assert_eq!(&custom[0], "Assets");
        assert_eq!(&custom[2], "Cash held\r\nin escrow, \"restricted\"");
    }

    #[test]
    fn test_markdown_lists_drivers() {
        let markdown = ChartOfAccounts::from_registry(&SchemaRegistry::standard()).to_markdown();
        assert!(markdown.starts_with("# Chart of Accounts"));
        assert!(markdown.contains("## Assets"));
        assert!(markdown.contains("| `SALE_EXPENSE` | "));
        assert!(markdown.contains("ratio (SELL_RATE)"));
    }
}
