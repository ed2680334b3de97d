use super::debt::INTEREST_KEY;
use super::revenue::{TOTAL_COST_KEY, TOTAL_REVENUE_KEY};
use super::{amount_style, history, operand, previous};
use crate::error::{ModelError, Result};
use crate::reference::{Namespace, ReferenceMap};
use crate::schema::{ForecastDriver, Sign, StatementKind};
use crate::utils::{a1, formula_literal, Period, Timeline};
use crate::workbook::{BuildContext, CellStyle, Sheet, FIRST_DATA_ROW};
use log::debug;

const NS: Namespace = Namespace::IncomeStatement;

/// Income statement driven by the schema: rows are recorded first so that
/// rollups and ratio lines can point at rows further down the sheet.
pub fn build_income_statement_sheet(ctx: &BuildContext, sheet: &mut Sheet, refs: &mut ReferenceMap) -> Result<()> {
    sheet.write_title("Income Statement");
    sheet.write_year_header("Line item", ctx.timeline.periods());

    let items = ctx.schema.statement(StatementKind::IncomeStatement);
    let mut row = FIRST_DATA_ROW;
    let mut placed = Vec::with_capacity(items.len());
    for item in items {
        sheet.write_text(
            row,
            Timeline::LABEL_COL,
            item.label.as_str(),
            CellStyle::Label { indent: item.indent, bold: item.is_subtotal },
        );
        if item.has_key() {
            refs.record(NS, item.key.as_str(), row)?;
            placed.push((row, item));
        }
        row += 1;
    }

    let revenue_line = items
        .iter()
        .find(|item| item.driver == ForecastDriver::Revenue)
        .ok_or_else(|| ModelError::InvalidSchema("income statement has no revenue-driven line".to_string()))?;
    let revenue_row = refs.lookup(NS, &revenue_line.key)?;
    let fallback_rate = formula_literal(ctx.config.fallback_expense_rate);

    for (row, item) in placed {
        for period in ctx.timeline.periods() {
            let col = period.col;
            let style = amount_style(period, item.is_subtotal);

            let formula = match &item.driver {
                ForecastDriver::Revenue => operand(refs, Namespace::Revenue, TOTAL_REVENUE_KEY, col, NS)?,
                ForecastDriver::Cost => operand(refs, Namespace::Revenue, TOTAL_COST_KEY, col, NS)?,
                _ if period.is_historical => history(refs, &item.key, col, NS),
                ForecastDriver::Ratio { assumption } => {
                    let definition = ctx.schema.assumption(*assumption).ok_or_else(|| {
                        ModelError::InvalidSchema(format!("assumption {} is not defined", assumption))
                    })?;
                    format!(
                        "{}*{}",
                        operand(refs, NS, &definition.denominator_key, col, NS)?,
                        operand(refs, Namespace::Assumptions, assumption.as_str(), col, NS)?
                    )
                }
                ForecastDriver::Interest => operand(refs, Namespace::Financing, INTEREST_KEY, col, NS)?,
                ForecastDriver::Fallback => format!("{}*{}", a1(revenue_row, col), fallback_rate),
                ForecastDriver::Subtotal { terms } => {
                    let mut expr = String::new();
                    for term in terms {
                        let sign = match term.sign {
                            Sign::Plus if expr.is_empty() => "",
                            Sign::Plus => "+",
                            Sign::Minus => "-",
                        };
                        expr.push_str(sign);
                        expr.push_str(&operand(refs, NS, &term.key, col, NS)?);
                    }
                    if expr.is_empty() {
                        "0".to_string()
                    } else {
                        expr
                    }
                }
                ForecastDriver::HistoryOnly => continue,
                _ => carry_forward(row, period),
            };

            sheet.write_formula(row, col, format!("={}", formula), style);
        }
    }

    debug!("Income statement: {} formulas", sheet.formula_count());
    Ok(())
}

fn carry_forward(row: u32, period: Period) -> String {
    previous(row, period).unwrap_or_else(|| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::schema::SchemaRegistry;
    use crate::workbook::CellValue;

    fn build() -> (Sheet, ReferenceMap) {
        let schema = SchemaRegistry::standard();
        let config = ModelConfig::default();
        let timeline = Timeline::new(vec![2024], 1);
        let ctx = BuildContext {
            schema: &schema,
            config: &config,
            timeline: &timeline,
        };
        let mut refs = ReferenceMap::new();
        for (i, key) in schema.canonical_keys().enumerate() {
            refs.record(Namespace::History, key, 100 + i as u32).unwrap();
        }
        for (i, assumption) in schema.assumptions().iter().enumerate() {
            refs.record(Namespace::Assumptions, assumption.code.as_str(), 3 + i as u32).unwrap();
        }
        refs.record(Namespace::Revenue, TOTAL_REVENUE_KEY, 15).unwrap();
        refs.record(Namespace::Revenue, TOTAL_COST_KEY, 16).unwrap();
        refs.record(Namespace::Financing, INTEREST_KEY, 4).unwrap();

        let mut sheet = Sheet::new(NS);
        build_income_statement_sheet(&ctx, &mut sheet, &mut refs).unwrap();
        (sheet, refs)
    }

    fn formula_at(sheet: &Sheet, refs: &ReferenceMap, key: &str, col: u16) -> String {
        let row = refs.lookup(NS, key).unwrap();
        match &sheet.cell(row, col).unwrap().value {
            CellValue::Formula(f) => f.clone(),
            other => panic!("{} is not a formula: {:?}", key, other),
        }
    }

    #[test]
    fn test_revenue_and_cost_come_from_build_up_in_every_year() {
        let (sheet, refs) = build();
        assert_eq!(formula_at(&sheet, &refs, "TOTAL_OPERATE_INCOME", 1), "='3.Revenue Build-up'!B16");
        assert_eq!(formula_at(&sheet, &refs, "TOTAL_OPERATE_INCOME", 2), "='3.Revenue Build-up'!C16");
        assert_eq!(formula_at(&sheet, &refs, "OPERATE_COST", 2), "='3.Revenue Build-up'!C17");
    }

    #[test]
    fn test_historical_lines_reference_history() {
        let (sheet, refs) = build();
        assert!(formula_at(&sheet, &refs, "SALE_EXPENSE", 1).starts_with("='1.History'!B"));
        assert!(formula_at(&sheet, &refs, "NETPROFIT", 1).starts_with("='1.History'!B"));
    }

    #[test]
    fn test_forecast_drivers() {
        let (sheet, refs) = build();
        let revenue = refs.lookup(NS, "TOTAL_OPERATE_INCOME").unwrap() + 1;
        let profit = refs.lookup(NS, "TOTAL_PROFIT").unwrap() + 1;
        let tax = refs.lookup(NS, "INCOME_TAX").unwrap() + 1;

        assert_eq!(
            formula_at(&sheet, &refs, "SALE_EXPENSE", 2),
            format!("=C{}*'2.Assumptions'!C6", revenue)
        );
        assert_eq!(
            formula_at(&sheet, &refs, "INCOME_TAX", 2),
            format!("=C{}*'2.Assumptions'!C9", profit)
        );
        assert_eq!(formula_at(&sheet, &refs, "FINANCE_EXPENSE", 2), "='5.Debt'!C5");
        assert_eq!(
            formula_at(&sheet, &refs, "OTHER_INCOME", 2),
            format!("=C{}*0.01", revenue)
        );
        assert_eq!(
            formula_at(&sheet, &refs, "NETPROFIT", 2),
            format!("=C{}-C{}", profit, tax)
        );
    }
}
