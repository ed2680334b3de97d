use crate::engine::FinancialModel;
use crate::error::{ModelError, Result};
use crate::evaluate::Evaluator;
use crate::reference::{Namespace, ReferenceMap};
use crate::schema::{Category, SchemaRegistry, StatementKind};
use crate::utils::{a1, Period, Timeline};
use crate::workbook::{CellStyle, Sheet};
use log::{debug, warn};
use serde::Serialize;

pub const TOTAL_ASSETS_KEY: &str = "TOTAL_ASSETS";
pub const TOTAL_LIABILITIES_KEY: &str = "TOTAL_LIABILITIES";
pub const TOTAL_EQUITY_EX_PLUG_KEY: &str = "TOTAL_EQUITY_EX_PLUG";
pub const PLUG_KEY: &str = "BS_PLUG";
pub const TOTAL_LIABILITIES_AND_EQUITY_KEY: &str = "TOTAL_LIABILITIES_AND_EQUITY_CALC";
pub const BALANCE_CHECK_KEY: &str = "BALANCE_CHECK";

const NS: Namespace = Namespace::BalanceSheet;

/// Plug value of one period, as computed by the workbook formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlugDiagnostic {
    pub year: i32,
    pub is_historical: bool,
    pub total_assets: f64,
    pub plug: f64,
}

impl PlugDiagnostic {
    /// |plug| as a share of |total assets|; 0 when there are no assets.
    pub fn ratio(&self) -> f64 {
        if self.total_assets == 0.0 {
            0.0
        } else {
            (self.plug / self.total_assets).abs()
        }
    }
}

/// Closes the balance sheet with a plug row so that
/// `assets = liabilities + equity + plug` holds in every period.
pub struct AccountingBalancer<'a> {
    schema: &'a SchemaRegistry,
    timeline: &'a Timeline,
}

impl<'a> AccountingBalancer<'a> {
    pub fn new(schema: &'a SchemaRegistry, timeline: &'a Timeline) -> Self {
        Self { schema, timeline }
    }

    /// Writes bucket totals, the plug and the balance check starting at `start_row`.
    pub fn enforce_accounting_equation(&self, sheet: &mut Sheet, refs: &mut ReferenceMap, start_row: u32) -> Result<()> {
        let assets = self.rows_in(refs, Category::Asset)?;
        let liabilities = self.rows_in(refs, Category::Liability)?;
        let equity = self.rows_in(refs, Category::Equity)?;
        debug!(
            "Reconciling {} asset, {} liability and {} equity lines",
            assets.len(),
            liabilities.len(),
            equity.len()
        );

        let total_assets = start_row;
        let total_liabilities = start_row + 1;
        let total_equity = start_row + 2;
        let plug = start_row + 3;
        let total_liabilities_and_equity = start_row + 4;
        let check = start_row + 5;

        let rows = [
            (TOTAL_ASSETS_KEY, "Total assets", total_assets),
            (TOTAL_LIABILITIES_KEY, "Total liabilities", total_liabilities),
            (TOTAL_EQUITY_EX_PLUG_KEY, "Total equity (excluding plug)", total_equity),
            (PLUG_KEY, "Balancing plug", plug),
            (TOTAL_LIABILITIES_AND_EQUITY_KEY, "Total liabilities and equity", total_liabilities_and_equity),
            (BALANCE_CHECK_KEY, "Balance check (should be 0)", check),
        ];
        for (key, label, row) in rows {
            refs.record(NS, key, row)?;
            sheet.write_text(row, Timeline::LABEL_COL, label, CellStyle::Label { indent: 0, bold: true });
        }

        for period in self.timeline.periods() {
            let col = period.col;
            let style = total_style(period);
            sheet.write_formula(total_assets, col, sum_rows(&assets, col), style);
            sheet.write_formula(total_liabilities, col, sum_rows(&liabilities, col), style);
            sheet.write_formula(total_equity, col, sum_rows(&equity, col), style);
            sheet.write_formula(
                plug,
                col,
                format!(
                    "={}-({}+{})",
                    a1(total_assets, col),
                    a1(total_liabilities, col),
                    a1(total_equity, col)
                ),
                CellStyle::Plug,
            );
            sheet.write_formula(
                total_liabilities_and_equity,
                col,
                format!(
                    "={}+{}+{}",
                    a1(total_liabilities, col),
                    a1(total_equity, col),
                    a1(plug, col)
                ),
                style,
            );
            sheet.write_formula(
                check,
                col,
                format!("={}-{}", a1(total_assets, col), a1(total_liabilities_and_equity, col)),
                CellStyle::Check,
            );
        }

        Ok(())
    }

    /// Recalculates the workbook and checks the accounting identity per period.
    pub fn verify_accounting_equation(&self, evaluator: &mut Evaluator, refs: &ReferenceMap, tolerance: f64) -> Result<()> {
        for period in self.timeline.periods() {
            let assets = evaluator.value_of(refs, NS, TOTAL_ASSETS_KEY, period.col)?;
            let liabilities_and_equity =
                evaluator.value_of(refs, NS, TOTAL_LIABILITIES_AND_EQUITY_KEY, period.col)?;
            let difference = assets - liabilities_and_equity;

            if difference.abs() > tolerance {
                return Err(ModelError::AccountingEquationViolation {
                    year: period.year,
                    assets,
                    liabilities_and_equity,
                    difference,
                });
            }
        }
        Ok(())
    }

    pub fn plug_diagnostics(&self, evaluator: &mut Evaluator, refs: &ReferenceMap) -> Result<Vec<PlugDiagnostic>> {
        self.timeline
            .periods()
            .map(|period| {
                Ok(PlugDiagnostic {
                    year: period.year,
                    is_historical: period.is_historical,
                    total_assets: evaluator.value_of(refs, NS, TOTAL_ASSETS_KEY, period.col)?,
                    plug: evaluator.value_of(refs, NS, PLUG_KEY, period.col)?,
                })
            })
            .collect()
    }

    fn rows_in(&self, refs: &ReferenceMap, category: Category) -> Result<Vec<u32>> {
        self.schema
            .statement(StatementKind::BalanceSheet)
            .iter()
            .filter(|item| item.category == category && refs.contains(NS, &item.key))
            .map(|item| refs.lookup(NS, &item.key))
            .collect()
    }
}

fn total_style(period: Period) -> CellStyle {
    CellStyle::Amount {
        forecast: !period.is_historical,
        bold: true,
    }
}

fn sum_rows(rows: &[u32], col: u16) -> String {
    if rows.is_empty() {
        return "=0".to_string();
    }
    let terms: Vec<String> = rows.iter().map(|row| a1(*row, col)).collect();
    format!("={}", terms.join("+"))
}

/// Fails with [`ModelError::AccountingEquationViolation`] if any period of
/// the model does not balance within `tolerance`.
pub fn verify_accounting_equation(model: &FinancialModel, tolerance: f64) -> Result<()> {
    let balancer = AccountingBalancer::new(&model.schema, &model.timeline);
    let mut evaluator = Evaluator::new(&model.workbook);
    balancer.verify_accounting_equation(&mut evaluator, &model.references, tolerance)
}

/// Per-period plug values of the model.
pub fn plug_diagnostics(model: &FinancialModel) -> Result<Vec<PlugDiagnostic>> {
    let balancer = AccountingBalancer::new(&model.schema, &model.timeline);
    let mut evaluator = Evaluator::new(&model.workbook);
    balancer.plug_diagnostics(&mut evaluator, &model.references)
}

/// Logs forecast plugs that exceed `warning_ratio` of total assets.
pub fn warn_on_large_plugs(diagnostics: &[PlugDiagnostic], warning_ratio: f64) -> usize {
    let mut flagged = 0;
    for d in diagnostics.iter().filter(|d| !d.is_historical) {
        if d.ratio() > warning_ratio {
            warn!(
                "{}: balancing plug {:.2} is {:.1}% of total assets; a schedule is not threaded into cash",
                d.year,
                d.plug,
                d.ratio() * 100.0
            );
            flagged += 1;
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::{CellValue, ModelWorkbook};

    fn schema_with(lines: &[(&str, Category)]) -> SchemaRegistry {
        let standard = SchemaRegistry::standard();
        let json = serde_json::json!({
            "income_statement": standard.statement(StatementKind::IncomeStatement),
            "balance_sheet": lines.iter().map(|(key, category)| serde_json::json!({
                "label": key, "key": key, "indent": 1, "is_subtotal": false,
                "category": category, "driver": { "driver": "CarryForward" }
            })).collect::<Vec<_>>(),
            "cash_flow": standard.statement(StatementKind::CashFlow),
            "assumptions": standard.assumptions(),
        });
        SchemaRegistry::from_json_str(&json.to_string()).unwrap()
    }

    #[test]
    fn test_plug_forces_balance_for_unbalanced_inputs() {
        let schema = schema_with(&[
            ("CASH", Category::Asset),
            ("LOAN", Category::Liability),
            ("CAPITAL", Category::Equity),
        ]);
        let timeline = Timeline::new(vec![2024], 1);
        let mut workbook = ModelWorkbook::new();
        let mut refs = ReferenceMap::new();
        let sheet = workbook.sheet_mut(NS);
        for (row, (key, value)) in [("CASH", 100.0), ("LOAN", 40.0), ("CAPITAL", 50.0)].iter().enumerate() {
            refs.record(NS, *key, row as u32 + 3).unwrap();
            for col in 1..=2 {
                sheet.write_number(row as u32 + 3, col, *value, CellStyle::Amount { forecast: false, bold: false });
            }
        }

        let balancer = AccountingBalancer::new(&schema, &timeline);
        balancer.enforce_accounting_equation(sheet, &mut refs, 7).unwrap();
        assert_eq!(
            sheet.cell(7, 1).unwrap().value,
            CellValue::Formula("=B4".to_string())
        );

        let mut evaluator = Evaluator::new(&workbook);
        for col in 1..=2 {
            assert_eq!(evaluator.value_of(&refs, NS, PLUG_KEY, col).unwrap(), 10.0);
            assert_eq!(evaluator.value_of(&refs, NS, TOTAL_LIABILITIES_AND_EQUITY_KEY, col).unwrap(), 100.0);
            assert_eq!(evaluator.value_of(&refs, NS, BALANCE_CHECK_KEY, col).unwrap(), 0.0);
        }
        assert!(balancer.verify_accounting_equation(&mut evaluator, &refs, 0.01).is_ok());

        let diagnostics = balancer.plug_diagnostics(&mut evaluator, &refs).unwrap();
        assert_eq!(diagnostics.len(), 2);
        assert!((diagnostics[1].ratio() - 0.1).abs() < 1e-12);
        assert_eq!(warn_on_large_plugs(&diagnostics, 0.05), 1);
        assert_eq!(warn_on_large_plugs(&diagnostics, 0.5), 0);
    }

    #[test]
    fn test_verify_reports_violation() {
        let schema = SchemaRegistry::standard();
        let timeline = Timeline::new(vec![2024], 1);
        let mut workbook = ModelWorkbook::new();
        let mut refs = ReferenceMap::new();
        let sheet = workbook.sheet_mut(NS);
        refs.record(NS, TOTAL_ASSETS_KEY, 3).unwrap();
        refs.record(NS, TOTAL_LIABILITIES_AND_EQUITY_KEY, 4).unwrap();
        for col in 1..=2 {
            sheet.write_number(3, col, 100.0, CellStyle::Plug);
            sheet.write_number(4, col, 90.0, CellStyle::Plug);
        }

        let balancer = AccountingBalancer::new(&schema, &timeline);
        let mut evaluator = Evaluator::new(&workbook);
        let err = balancer.verify_accounting_equation(&mut evaluator, &refs, 0.01).unwrap_err();
        assert!(matches!(err, ModelError::AccountingEquationViolation { year: 2024, .. }));
    }
}
