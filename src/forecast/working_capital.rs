use super::revenue::{TOTAL_COST_KEY, TOTAL_REVENUE_KEY};
use super::{amount_style, history, labeled_row, operand};
use crate::error::Result;
use crate::reference::{Namespace, ReferenceMap};
use crate::schema::AssumptionCode;
use crate::utils::{a1, formula_literal};
use crate::workbook::{BuildContext, Sheet, FIRST_DATA_ROW};

pub const RECEIVABLES_KEY: &str = "AR";
pub const INVENTORY_KEY: &str = "INV";
pub const CHANGE_KEY: &str = "CHANGE";

const NS: Namespace = Namespace::WorkingCapital;

/// Receivables and inventory driven by day-count assumptions, plus the
/// cash effect of their change.
pub fn build_working_capital_sheet(ctx: &BuildContext, sheet: &mut Sheet, refs: &mut ReferenceMap) -> Result<()> {
    sheet.write_title("Working Capital Schedule");
    sheet.write_year_header("Operating working capital", ctx.timeline.periods());

    let receivables = FIRST_DATA_ROW;
    let inventory = receivables + 1;
    let change = receivables + 3;
    labeled_row(sheet, refs, RECEIVABLES_KEY, "Accounts receivable", receivables, 1, false)?;
    labeled_row(sheet, refs, INVENTORY_KEY, "Inventory", inventory, 1, false)?;
    labeled_row(sheet, refs, CHANGE_KEY, "Cash effect of working-capital change", change, 0, true)?;

    let days = formula_literal(ctx.config.days_per_year);
    for period in ctx.timeline.periods() {
        let style = amount_style(period, false);
        let col = period.col;

        if period.is_historical {
            sheet.write_formula(receivables, col, format!("={}", history(refs, "ACCOUNTS_RECE", col, NS)), style);
            sheet.write_formula(inventory, col, format!("={}", history(refs, "INVENTORY", col, NS)), style);
        } else {
            let revenue = operand(refs, Namespace::Revenue, TOTAL_REVENUE_KEY, col, NS)?;
            let cost = operand(refs, Namespace::Revenue, TOTAL_COST_KEY, col, NS)?;
            let dso = operand(refs, Namespace::Assumptions, AssumptionCode::Dso.as_str(), col, NS)?;
            let dio = operand(refs, Namespace::Assumptions, AssumptionCode::Dio.as_str(), col, NS)?;
            sheet.write_formula(receivables, col, format!("={}/{}*{}", revenue, days, dso), style);
            sheet.write_formula(inventory, col, format!("={}/{}*{}", cost, days, dio), style);
        }

        // An increase in working-capital assets consumes cash.
        match period.prev_col() {
            None => sheet.write_number(change, col, 0.0, amount_style(period, true)),
            Some(prev) => sheet.write_formula(
                change,
                col,
                format!(
                    "=-(({}-{})+({}-{}))",
                    a1(receivables, col),
                    a1(receivables, prev),
                    a1(inventory, col),
                    a1(inventory, prev)
                ),
                amount_style(period, true),
            ),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::schema::SchemaRegistry;
    use crate::utils::Timeline;
    use crate::workbook::CellValue;

    #[test]
    fn test_working_capital_formulas() {
        let schema = SchemaRegistry::standard();
        let config = ModelConfig::default();
        let timeline = Timeline::new(vec![2024], 1);
        let ctx = BuildContext {
            schema: &schema,
            config: &config,
            timeline: &timeline,
        };
        let mut refs = ReferenceMap::new();
        refs.record(Namespace::History, "ACCOUNTS_RECE", 10).unwrap();
        refs.record(Namespace::History, "INVENTORY", 11).unwrap();
        refs.record(Namespace::Revenue, TOTAL_REVENUE_KEY, 15).unwrap();
        refs.record(Namespace::Revenue, TOTAL_COST_KEY, 16).unwrap();
        refs.record(Namespace::Assumptions, "DSO", 9).unwrap();
        refs.record(Namespace::Assumptions, "DIO", 10).unwrap();

        let mut sheet = Sheet::new(Namespace::WorkingCapital);
        build_working_capital_sheet(&ctx, &mut sheet, &mut refs).unwrap();

        let value = |row: u32, col: u16| sheet.cell(row, col).unwrap().value.clone();
        assert_eq!(value(3, 1), CellValue::Formula("='1.History'!B11".to_string()));
        assert_eq!(
            value(3, 2),
            CellValue::Formula("='3.Revenue Build-up'!C16/360*'2.Assumptions'!C10".to_string())
        );
        assert_eq!(
            value(4, 2),
            CellValue::Formula("='3.Revenue Build-up'!C17/360*'2.Assumptions'!C11".to_string())
        );
        assert_eq!(value(6, 1), CellValue::Number(0.0));
        assert_eq!(value(6, 2), CellValue::Formula("=-((C4-B4)+(C5-B5))".to_string()));
    }
}
