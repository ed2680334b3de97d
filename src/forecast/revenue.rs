use super::{amount_style, history, labeled_row, operand, previous};
use crate::error::Result;
use crate::reference::{Namespace, ReferenceMap};
use crate::schema::AssumptionCode;
use crate::utils::{a1, formula_literal, Timeline};
use crate::workbook::{BuildContext, CellStyle, Sheet, FIRST_DATA_ROW};
use log::debug;

pub const TOTAL_REVENUE_KEY: &str = "TOTAL";
pub const TOTAL_COST_KEY: &str = "COST";

const NS: Namespace = Namespace::Revenue;

/// Segment revenue/cost build-up. Its totals are the only revenue and cost
/// figures the rest of the model reads.
pub fn build_revenue_sheet(ctx: &BuildContext, sheet: &mut Sheet, refs: &mut ReferenceMap) -> Result<()> {
    sheet.write_title("Revenue and Cost Build-up");
    sheet.write_year_header("Segment", ctx.timeline.periods());

    let cost_ratio = formula_literal(ctx.config.segment_cost_ratio);
    let mut revenue_rows = Vec::with_capacity(ctx.config.segments.len());
    let mut cost_rows = Vec::with_capacity(ctx.config.segments.len());

    let mut row = FIRST_DATA_ROW;
    for (i, segment) in ctx.config.segments.iter().enumerate() {
        sheet.write_text(
            row,
            Timeline::LABEL_COL,
            segment.name.as_str(),
            CellStyle::Label { indent: 0, bold: true },
        );
        let revenue_row = row + 1;
        let cost_row = row + 2;
        labeled_row(sheet, refs, &format!("SEGMENT_{}_REVENUE", i + 1), "Revenue", revenue_row, 1, false)?;
        labeled_row(sheet, refs, &format!("SEGMENT_{}_COST", i + 1), "Cost", cost_row, 1, false)?;

        let share = formula_literal(segment.share);
        for period in ctx.timeline.periods() {
            let style = amount_style(period, false);
            if period.is_historical {
                let total = history(refs, "TOTAL_OPERATE_INCOME", period.col, NS);
                let cost = history(refs, "OPERATE_COST", period.col, NS);
                sheet.write_formula(revenue_row, period.col, format!("={}*{}", total, share), style);
                sheet.write_formula(cost_row, period.col, format!("={}*{}", cost, share), style);
            } else {
                let growth = operand(refs, Namespace::Assumptions, AssumptionCode::RevGrowth.as_str(), period.col, NS)?;
                let prior = previous(revenue_row, period).unwrap_or_else(|| "0".to_string());
                sheet.write_formula(revenue_row, period.col, format!("={}*(1+{})", prior, growth), style);
                sheet.write_formula(
                    cost_row,
                    period.col,
                    format!("={}*{}", a1(revenue_row, period.col), cost_ratio),
                    style,
                );
            }
        }

        revenue_rows.push(revenue_row);
        cost_rows.push(cost_row);
        row += 4;
    }

    labeled_row(sheet, refs, TOTAL_REVENUE_KEY, "Total revenue", row, 0, true)?;
    labeled_row(sheet, refs, TOTAL_COST_KEY, "Total cost", row + 1, 0, true)?;
    for period in ctx.timeline.periods() {
        let style = amount_style(period, true);
        sheet.write_formula(row, period.col, sum_of(&revenue_rows, period.col), style);
        sheet.write_formula(row + 1, period.col, sum_of(&cost_rows, period.col), style);
    }

    debug!("Revenue build-up: {} segments", ctx.config.segments.len());
    Ok(())
}

fn sum_of(rows: &[u32], col: u16) -> String {
    let terms: Vec<String> = rows.iter().map(|row| a1(*row, col)).collect();
    format!("={}", terms.join("+"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::schema::SchemaRegistry;
    use crate::workbook::CellValue;

    #[test]
    fn test_revenue_build_up_formulas() {
        let schema = SchemaRegistry::standard();
        let config = ModelConfig::default();
        let timeline = Timeline::new(vec![2023, 2024], 5);
        let ctx = BuildContext {
            schema: &schema,
            config: &config,
            timeline: &timeline,
        };
        let mut refs = ReferenceMap::new();
        refs.record(Namespace::History, "TOTAL_OPERATE_INCOME", 4).unwrap();
        refs.record(Namespace::History, "OPERATE_COST", 7).unwrap();
        refs.record(Namespace::Assumptions, "REV_GROWTH", 3).unwrap();

        let mut sheet = Sheet::new(Namespace::Revenue);
        build_revenue_sheet(&ctx, &mut sheet, &mut refs).unwrap();

        let first = refs.lookup(Namespace::Revenue, "SEGMENT_1_REVENUE").unwrap();
        assert_eq!(first, 4);
        assert_eq!(
            sheet.cell(first, 1).unwrap().value,
            CellValue::Formula("='1.History'!B5*0.6".to_string())
        );
        assert_eq!(
            sheet.cell(first, 3).unwrap().value,
            CellValue::Formula("=C5*(1+'2.Assumptions'!D4)".to_string())
        );
        assert_eq!(
            sheet.cell(first + 1, 3).unwrap().value,
            CellValue::Formula("=D5*0.75".to_string())
        );

        let total = refs.lookup(Namespace::Revenue, TOTAL_REVENUE_KEY).unwrap();
        assert_eq!(
            sheet.cell(total, 1).unwrap().value,
            CellValue::Formula("=B5+B9+B13".to_string())
        );
        assert!(refs.contains(Namespace::Revenue, TOTAL_COST_KEY));
    }
}
