use super::capex::PPE_END_KEY;
use super::cash_flow::ENDING_CASH_KEY;
use super::debt::DEBT_KEY;
use super::working_capital::{INVENTORY_KEY, RECEIVABLES_KEY};
use super::{amount_style, history, operand, previous};
use crate::error::Result;
use crate::reference::{Namespace, ReferenceMap};
use crate::schema::{AssumptionCode, CanonicalLineItem, Category, ForecastDriver, StatementKind};
use crate::utils::Timeline;
use crate::workbook::{BuildContext, CellStyle, Sheet, FIRST_DATA_ROW};
use log::debug;

const NS: Namespace = Namespace::BalanceSheet;

/// Lines that appear on the forecast balance sheet: every classified,
/// non-subtotal line. Totals are rebuilt by reconciliation.
pub fn is_forecast_line(item: &CanonicalLineItem) -> bool {
    item.has_key() && !item.is_subtotal && item.category != Category::None
}

/// Lays out the balance sheet lines and returns the first free row below them.
///
/// Forecast cash is left empty here; [`link_closing_cash`] fills it once the
/// cash-flow statement exists.
pub fn build_balance_sheet(ctx: &BuildContext, sheet: &mut Sheet, refs: &mut ReferenceMap) -> Result<u32> {
    sheet.write_title("Balance Sheet");
    sheet.write_year_header("Line item", ctx.timeline.periods());

    let items = ctx.schema.statement(StatementKind::BalanceSheet);
    let mut row = FIRST_DATA_ROW;
    let mut placed = Vec::new();
    for item in items {
        if item.is_header() {
            sheet.write_text(row, Timeline::LABEL_COL, item.label.as_str(), CellStyle::Section);
            row += 1;
            continue;
        }
        if !is_forecast_line(item) {
            continue;
        }
        sheet.write_text(
            row,
            Timeline::LABEL_COL,
            item.label.as_str(),
            CellStyle::Label { indent: item.indent, bold: false },
        );
        refs.record(NS, item.key.as_str(), row)?;
        placed.push((row, item));
        row += 1;
    }

    for (row, item) in placed {
        for period in ctx.timeline.periods() {
            let col = period.col;
            let schedule = match item.driver {
                ForecastDriver::Receivables => Some((Namespace::WorkingCapital, RECEIVABLES_KEY)),
                ForecastDriver::Inventory => Some((Namespace::WorkingCapital, INVENTORY_KEY)),
                ForecastDriver::FixedAssets => Some((Namespace::Capex, PPE_END_KEY)),
                ForecastDriver::ShortTermDebt => Some((Namespace::Financing, DEBT_KEY)),
                _ => None,
            };

            let formula = match (schedule, period.is_historical, previous(row, period)) {
                (Some((namespace, key)), _, _) => operand(refs, namespace, key, col, NS)?,
                (None, true, _) | (None, false, None) => history(refs, &item.key, col, NS),
                (None, false, Some(prior)) => match item.driver {
                    ForecastDriver::Cash => continue,
                    ForecastDriver::RetainedEarnings => format!(
                        "{}+{}*(1-{})",
                        prior,
                        operand(refs, Namespace::IncomeStatement, "NETPROFIT", col, NS)?,
                        operand(refs, Namespace::Assumptions, AssumptionCode::DivPayout.as_str(), col, NS)?
                    ),
                    _ => prior,
                },
            };
            sheet.write_formula(row, col, format!("={}", formula), amount_style(period, false));
        }
    }

    debug!("Balance sheet: {} lines", refs.keys(NS).count());
    Ok(row + 1)
}

/// Points forecast cash at the cash-flow statement's closing balance.
pub fn link_closing_cash(ctx: &BuildContext, sheet: &mut Sheet, refs: &ReferenceMap) -> Result<()> {
    let cash_lines = ctx
        .schema
        .statement(StatementKind::BalanceSheet)
        .iter()
        .filter(|item| item.driver == ForecastDriver::Cash && refs.contains(NS, &item.key));

    for item in cash_lines {
        let row = refs.lookup(NS, &item.key)?;
        for period in ctx.timeline.forecast_periods() {
            let closing = operand(refs, Namespace::CashFlow, ENDING_CASH_KEY, period.col, NS)?;
            sheet.write_formula(row, period.col, format!("={}", closing), amount_style(period, false));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::schema::SchemaRegistry;
    use crate::workbook::CellValue;

    fn refs_for(schema: &SchemaRegistry) -> ReferenceMap {
        let mut refs = ReferenceMap::new();
        for (i, key) in schema.canonical_keys().enumerate() {
            refs.record(Namespace::History, key, 100 + i as u32).unwrap();
        }
        refs.record(Namespace::Assumptions, "DIV_PAYOUT", 13).unwrap();
        refs.record(Namespace::WorkingCapital, RECEIVABLES_KEY, 3).unwrap();
        refs.record(Namespace::WorkingCapital, INVENTORY_KEY, 4).unwrap();
        refs.record(Namespace::Capex, PPE_END_KEY, 6).unwrap();
        refs.record(Namespace::Financing, DEBT_KEY, 3).unwrap();
        refs.record(Namespace::IncomeStatement, "NETPROFIT", 26).unwrap();
        refs
    }

    #[test]
    fn test_lines_follow_their_drivers() {
        let schema = SchemaRegistry::standard();
        let config = ModelConfig::default();
        let timeline = Timeline::new(vec![2024], 1);
        let ctx = BuildContext {
            schema: &schema,
            config: &config,
            timeline: &timeline,
        };
        let mut refs = refs_for(&schema);
        let mut sheet = Sheet::new(NS);
        let next_row = build_balance_sheet(&ctx, &mut sheet, &mut refs).unwrap();

        let value = |key: &str, col: u16| {
            let row = refs.lookup(NS, key).unwrap();
            sheet.cell(row, col).map(|c| c.value.clone())
        };

        assert_eq!(value("ACCOUNTS_RECE", 1), Some(CellValue::Formula("='6.Working Capital'!B4".to_string())));
        assert_eq!(value("FIXED_ASSET", 2), Some(CellValue::Formula("='4.Capex'!C7".to_string())));
        assert_eq!(value("SHORT_LOAN", 2), Some(CellValue::Formula("='5.Debt'!C4".to_string())));

        let goodwill_row = refs.lookup(NS, "GOODWILL").unwrap();
        assert_eq!(
            value("GOODWILL", 2),
            Some(CellValue::Formula(format!("=B{}", goodwill_row + 1)))
        );

        let re_row = refs.lookup(NS, "UNDISTRIBUTED_PROFIT").unwrap();
        assert_eq!(
            value("UNDISTRIBUTED_PROFIT", 2),
            Some(CellValue::Formula(format!(
                "=B{}+'7.Income Statement'!C27*(1-'2.Assumptions'!C14)",
                re_row + 1
            )))
        );

        // Forecast cash waits for the cash-flow statement.
        assert!(value("MONETARYFUNDS", 1).is_some());
        assert!(value("MONETARYFUNDS", 2).is_none());

        // Subtotals are left to reconciliation.
        assert!(!refs.contains(NS, "TOTAL_ASSETS"));
        assert!(next_row > refs.lookup(NS, "MINORITY_EQUITY").unwrap());
    }

    #[test]
    fn test_link_closing_cash() {
        let schema = SchemaRegistry::standard();
        let config = ModelConfig::default();
        let timeline = Timeline::new(vec![2024], 2);
        let ctx = BuildContext {
            schema: &schema,
            config: &config,
            timeline: &timeline,
        };
        let mut refs = refs_for(&schema);
        let mut sheet = Sheet::new(NS);
        build_balance_sheet(&ctx, &mut sheet, &mut refs).unwrap();
        refs.record(Namespace::CashFlow, ENDING_CASH_KEY, 22).unwrap();
        link_closing_cash(&ctx, &mut sheet, &refs).unwrap();

        let row = refs.lookup(NS, "MONETARYFUNDS").unwrap();
        assert_eq!(
            sheet.cell(row, 3).unwrap().value,
            CellValue::Formula("='9.Cash Flow'!D23".to_string())
        );
    }
}
