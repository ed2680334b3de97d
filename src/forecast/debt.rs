use super::{amount_style, history, labeled_row, operand, previous};
use crate::assumptions::DEBT_RATE_KEY;
use crate::error::Result;
use crate::reference::{Namespace, ReferenceMap};
use crate::utils::a1;
use crate::workbook::{BuildContext, Sheet, FIRST_DATA_ROW};

pub const DEBT_KEY: &str = "DEBT";
pub const INTEREST_KEY: &str = "INTEREST";
pub const NET_BORROWING_KEY: &str = "NET_BORROWING";

const NS: Namespace = Namespace::Financing;

/// Debt schedule. Forecast balances are held flat; net borrowing is the
/// change in balance so edits to the balance flow into the cash flow.
pub fn build_debt_sheet(ctx: &BuildContext, sheet: &mut Sheet, refs: &mut ReferenceMap) -> Result<()> {
    sheet.write_title("Debt Schedule");
    sheet.write_year_header("Short-term debt", ctx.timeline.periods());

    let debt = FIRST_DATA_ROW;
    let interest = debt + 1;
    let net_borrowing = debt + 2;
    labeled_row(sheet, refs, DEBT_KEY, "Debt balance", debt, 0, true)?;
    labeled_row(sheet, refs, INTEREST_KEY, "Interest expense", interest, 1, false)?;
    labeled_row(sheet, refs, NET_BORROWING_KEY, "Net borrowing / (repayment)", net_borrowing, 1, false)?;

    for period in ctx.timeline.periods() {
        let style = amount_style(period, false);
        let col = period.col;

        match (period.is_historical, previous(debt, period)) {
            (false, Some(prior)) => {
                sheet.write_formula(debt, col, format!("={}", prior), style);
                sheet.write_formula(net_borrowing, col, format!("={}-{}", a1(debt, col), prior), style);
            }
            _ => {
                sheet.write_formula(debt, col, format!("={}", history(refs, "SHORT_LOAN", col, NS)), style);
                sheet.write_formula(
                    net_borrowing,
                    col,
                    format!(
                        "={}-{}",
                        history(refs, "BORROW_CASH", col, NS),
                        history(refs, "PAY_DEBT_CASH", col, NS)
                    ),
                    style,
                );
            }
        }

        let rate = operand(refs, Namespace::Assumptions, DEBT_RATE_KEY, col, NS)?;
        sheet.write_formula(interest, col, format!("={}*{}", a1(debt, col), rate), style);
    }

    Ok(())
}
