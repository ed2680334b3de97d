use super::capex::{CAPEX_KEY, DEPRECIATION_KEY};
use super::debt::NET_BORROWING_KEY;
use super::working_capital::CHANGE_KEY;
use super::{amount_style, history, labeled_row, operand, previous};
use crate::config::{FinancingMode, HistoricalAddBack};
use crate::error::Result;
use crate::reference::{Namespace, ReferenceMap};
use crate::schema::AssumptionCode;
use crate::utils::{a1, Period, Timeline};
use crate::workbook::{BuildContext, CellStyle, Sheet, FIRST_DATA_ROW};

pub const NET_INCOME_KEY: &str = "NET_INCOME";
pub const DEPRECIATION_ADD_BACK_KEY: &str = "DEPRECIATION_ADD_BACK";
pub const WC_CHANGE_KEY: &str = "WC_CHANGE";
pub const OPERATING_KEY: &str = "OPERATING";
pub const CAPEX_OUTFLOW_KEY: &str = "CAPEX";
pub const INVESTING_KEY: &str = "INVESTING";
pub const DEBT_CHANGE_KEY: &str = "DEBT_CHANGE";
pub const DIVIDENDS_KEY: &str = "DIVIDENDS";
pub const FINANCING_KEY: &str = "FINANCING";
pub const NET_CHANGE_KEY: &str = "NET_CHANGE";
pub const BEGINNING_CASH_KEY: &str = "BEGINNING_CASH";
pub const ENDING_CASH_KEY: &str = "ENDING_CASH";

const NS: Namespace = Namespace::CashFlow;

struct Rows {
    net_income: u32,
    add_back: u32,
    wc_change: u32,
    operating: u32,
    capex: u32,
    investing: u32,
    debt_change: u32,
    dividends: u32,
    financing: u32,
    net_change: u32,
    beginning: u32,
    ending: u32,
}

/// Indirect-method cash-flow statement. Its closing cash feeds forecast
/// balance sheet cash.
pub fn build_cash_flow_sheet(ctx: &BuildContext, sheet: &mut Sheet, refs: &mut ReferenceMap) -> Result<()> {
    sheet.write_title("Cash Flow Statement");
    sheet.write_year_header("Line item", ctx.timeline.periods());

    let rows = lay_out(sheet, refs)?;
    for period in ctx.timeline.periods() {
        write_operating(ctx, sheet, refs, &rows, period)?;
        write_investing(sheet, refs, &rows, period)?;
        write_financing(ctx, sheet, refs, &rows, period)?;
        write_cash_roll_forward(ctx, sheet, refs, &rows, period)?;
    }
    Ok(())
}

fn lay_out(sheet: &mut Sheet, refs: &mut ReferenceMap) -> Result<Rows> {
    let mut row = FIRST_DATA_ROW;

    section(sheet, "Operating activities", &mut row);
    let net_income = line(sheet, refs, NET_INCOME_KEY, "Net income", false, &mut row)?;
    let add_back = line(sheet, refs, DEPRECIATION_ADD_BACK_KEY, "Add: depreciation and amortization", false, &mut row)?;
    let wc_change = line(sheet, refs, WC_CHANGE_KEY, "Change in working capital", false, &mut row)?;
    let operating = line(sheet, refs, OPERATING_KEY, "Net cash from operating activities", true, &mut row)?;
    row += 1;

    section(sheet, "Investing activities", &mut row);
    let capex = line(sheet, refs, CAPEX_OUTFLOW_KEY, "Capital expenditure", false, &mut row)?;
    let investing = line(sheet, refs, INVESTING_KEY, "Net cash from investing activities", true, &mut row)?;
    row += 1;

    section(sheet, "Financing activities", &mut row);
    let debt_change = line(sheet, refs, DEBT_CHANGE_KEY, "Net borrowing / (repayment)", false, &mut row)?;
    let dividends = line(sheet, refs, DIVIDENDS_KEY, "Dividends paid", false, &mut row)?;
    let financing = line(sheet, refs, FINANCING_KEY, "Net cash from financing activities", true, &mut row)?;
    row += 1;

    let net_change = line(sheet, refs, NET_CHANGE_KEY, "Net change in cash", true, &mut row)?;
    let beginning = line(sheet, refs, BEGINNING_CASH_KEY, "Beginning cash", false, &mut row)?;
    let ending = line(sheet, refs, ENDING_CASH_KEY, "Ending cash", true, &mut row)?;

    Ok(Rows {
        net_income,
        add_back,
        wc_change,
        operating,
        capex,
        investing,
        debt_change,
        dividends,
        financing,
        net_change,
        beginning,
        ending,
    })
}

fn section(sheet: &mut Sheet, title: &str, row: &mut u32) {
    sheet.write_text(*row, Timeline::LABEL_COL, title, CellStyle::Section);
    *row += 1;
}

fn line(sheet: &mut Sheet, refs: &mut ReferenceMap, key: &str, label: &str, bold: bool, row: &mut u32) -> Result<u32> {
    let placed = *row;
    labeled_row(sheet, refs, key, label, placed, if bold { 0 } else { 1 }, bold)?;
    *row += 1;
    Ok(placed)
}

fn write_operating(ctx: &BuildContext, sheet: &mut Sheet, refs: &ReferenceMap, rows: &Rows, period: Period) -> Result<()> {
    let col = period.col;
    let style = amount_style(period, false);

    let net_income = if period.is_historical {
        history(refs, "NETPROFIT", col, NS)
    } else {
        operand(refs, Namespace::IncomeStatement, "NETPROFIT", col, NS)?
    };
    sheet.write_formula(rows.net_income, col, format!("={}", net_income), style);

    let schedule_depreciation = operand(refs, Namespace::Capex, DEPRECIATION_KEY, col, NS)?;
    let schedule_wc_change = operand(refs, Namespace::WorkingCapital, CHANGE_KEY, col, NS)?;
    match (period.is_historical, ctx.config.historical_add_back) {
        (true, HistoricalAddBack::BackedOutFromOperatingCashFlow) => {
            // Reported operating cash flow less net income stands in for D&A.
            sheet.write_formula(
                rows.add_back,
                col,
                format!(
                    "={}-{}",
                    history(refs, "NETCASH_OPERATE", col, NS),
                    history(refs, "NETPROFIT", col, NS)
                ),
                style,
            );
            sheet.write_number(rows.wc_change, col, 0.0, style);
        }
        _ => {
            sheet.write_formula(rows.add_back, col, format!("={}", schedule_depreciation), style);
            sheet.write_formula(rows.wc_change, col, format!("={}", schedule_wc_change), style);
        }
    }

    sheet.write_formula(
        rows.operating,
        col,
        format!("=SUM({}:{})", a1(rows.net_income, col), a1(rows.wc_change, col)),
        amount_style(period, true),
    );
    Ok(())
}

fn write_investing(sheet: &mut Sheet, refs: &ReferenceMap, rows: &Rows, period: Period) -> Result<()> {
    let col = period.col;
    let capex = operand(refs, Namespace::Capex, CAPEX_KEY, col, NS)?;
    sheet.write_formula(rows.capex, col, format!("=-{}", capex), amount_style(period, false));
    sheet.write_formula(rows.investing, col, format!("={}", a1(rows.capex, col)), amount_style(period, true));
    Ok(())
}

fn write_financing(ctx: &BuildContext, sheet: &mut Sheet, refs: &ReferenceMap, rows: &Rows, period: Period) -> Result<()> {
    let col = period.col;
    let style = amount_style(period, false);

    match ctx.config.financing_mode {
        FinancingMode::ThreadDebtSchedule => {
            let net_borrowing = operand(refs, Namespace::Financing, NET_BORROWING_KEY, col, NS)?;
            sheet.write_formula(rows.debt_change, col, format!("={}", net_borrowing), style);
        }
        FinancingMode::ReservedUnpopulated => sheet.write_number(rows.debt_change, col, 0.0, style),
    }

    let dividends = if period.is_historical {
        format!("=-{}", history(refs, "ASSIGN_DIVIDEND_PORFIT", col, NS))
    } else {
        format!(
            "=-{}*{}",
            operand(refs, Namespace::IncomeStatement, "NETPROFIT", col, NS)?,
            operand(refs, Namespace::Assumptions, AssumptionCode::DivPayout.as_str(), col, NS)?
        )
    };
    sheet.write_formula(rows.dividends, col, dividends, style);

    sheet.write_formula(
        rows.financing,
        col,
        format!("={}+{}", a1(rows.debt_change, col), a1(rows.dividends, col)),
        amount_style(period, true),
    );
    Ok(())
}

fn write_cash_roll_forward(
    ctx: &BuildContext,
    sheet: &mut Sheet,
    refs: &ReferenceMap,
    rows: &Rows,
    period: Period,
) -> Result<()> {
    let col = period.col;
    let style = amount_style(period, false);

    // Historical years reproduce reported cash; forecast years sum the sections.
    let net_change = if period.is_historical {
        format!("={}", history(refs, "CASH_NETINCREASE", col, NS))
    } else {
        format!(
            "={}+{}+{}",
            a1(rows.operating, col),
            a1(rows.investing, col),
            a1(rows.financing, col)
        )
    };
    sheet.write_formula(rows.net_change, col, net_change, amount_style(period, true));

    let beginning = match previous(rows.ending, period) {
        Some(prior_ending) => format!("={}", prior_ending),
        None => {
            let first = ctx.timeline.historical_periods().next().map_or(col, |p| p.col);
            format!(
                "={}-{}",
                history(refs, "MONETARYFUNDS", first, NS),
                history(refs, "CASH_NETINCREASE", first, NS)
            )
        }
    };
    sheet.write_formula(rows.beginning, col, beginning, style);

    sheet.write_formula(
        rows.ending,
        col,
        format!("={}+{}", a1(rows.beginning, col), a1(rows.net_change, col)),
        amount_style(period, true),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::schema::SchemaRegistry;
    use crate::workbook::CellValue;

    fn build(config: &ModelConfig) -> (Sheet, ReferenceMap) {
        let schema = SchemaRegistry::standard();
        let timeline = Timeline::new(vec![2023, 2024], 1);
        let ctx = BuildContext {
            schema: &schema,
            config,
            timeline: &timeline,
        };
        let mut refs = ReferenceMap::new();
        for (i, key) in schema.canonical_keys().enumerate() {
            refs.record(Namespace::History, key, 100 + i as u32).unwrap();
        }
        refs.record(Namespace::Assumptions, "DIV_PAYOUT", 13).unwrap();
        refs.record(Namespace::Capex, CAPEX_KEY, 4).unwrap();
        refs.record(Namespace::Capex, DEPRECIATION_KEY, 5).unwrap();
        refs.record(Namespace::Financing, NET_BORROWING_KEY, 5).unwrap();
        refs.record(Namespace::WorkingCapital, CHANGE_KEY, 6).unwrap();
        refs.record(Namespace::IncomeStatement, "NETPROFIT", 26).unwrap();

        let mut sheet = Sheet::new(NS);
        build_cash_flow_sheet(&ctx, &mut sheet, &mut refs).unwrap();
        (sheet, refs)
    }

    fn value(sheet: &Sheet, refs: &ReferenceMap, key: &str, col: u16) -> CellValue {
        let row = refs.lookup(NS, key).unwrap();
        sheet.cell(row, col).unwrap().value.clone()
    }

    #[test]
    fn test_cash_roll_forward_chains_periods() {
        let config = ModelConfig::default();
        let (sheet, refs) = build(&config);
        let ending = refs.lookup(NS, ENDING_CASH_KEY).unwrap() + 1;

        assert_eq!(value(&sheet, &refs, BEGINNING_CASH_KEY, 2), CellValue::Formula(format!("=B{}", ending)));
        assert_eq!(value(&sheet, &refs, BEGINNING_CASH_KEY, 3), CellValue::Formula(format!("=C{}", ending)));
        match value(&sheet, &refs, BEGINNING_CASH_KEY, 1) {
            CellValue::Formula(f) => assert!(f.starts_with("='1.History'!B") && f.contains("-'1.History'!B")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_default_modes() {
        let config = ModelConfig::default();
        let (sheet, refs) = build(&config);

        assert_eq!(value(&sheet, &refs, WC_CHANGE_KEY, 1), CellValue::Number(0.0));
        assert_eq!(value(&sheet, &refs, WC_CHANGE_KEY, 3), CellValue::Formula("='6.Working Capital'!D7".to_string()));
        assert_eq!(value(&sheet, &refs, DEPRECIATION_ADD_BACK_KEY, 3), CellValue::Formula("='4.Capex'!D6".to_string()));
        assert_eq!(value(&sheet, &refs, DEBT_CHANGE_KEY, 1), CellValue::Formula("='5.Debt'!B6".to_string()));
        assert_eq!(value(&sheet, &refs, CAPEX_OUTFLOW_KEY, 3), CellValue::Formula("=-'4.Capex'!D5".to_string()));
        assert_eq!(
            value(&sheet, &refs, DIVIDENDS_KEY, 3),
            CellValue::Formula("=-'7.Income Statement'!D27*'2.Assumptions'!D14".to_string())
        );
    }

    #[test]
    fn test_alternative_modes() {
        let config = ModelConfig {
            financing_mode: FinancingMode::ReservedUnpopulated,
            historical_add_back: HistoricalAddBack::ReportedDepreciation,
            ..ModelConfig::default()
        };
        let (sheet, refs) = build(&config);

        assert_eq!(value(&sheet, &refs, DEBT_CHANGE_KEY, 3), CellValue::Number(0.0));
        assert_eq!(value(&sheet, &refs, DEPRECIATION_ADD_BACK_KEY, 1), CellValue::Formula("='4.Capex'!B6".to_string()));
        assert_eq!(value(&sheet, &refs, WC_CHANGE_KEY, 1), CellValue::Formula("='6.Working Capital'!B7".to_string()));
    }
}
