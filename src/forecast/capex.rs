use super::revenue::TOTAL_REVENUE_KEY;
use super::{amount_style, history, labeled_row, operand, previous};
use crate::assumptions::DEPRECIATION_RATE_KEY;
use crate::error::Result;
use crate::reference::{Namespace, ReferenceMap};
use crate::schema::AssumptionCode;
use crate::utils::a1;
use crate::workbook::{BuildContext, Sheet, FIRST_DATA_ROW};

pub const PPE_BEGIN_KEY: &str = "PPE_BEGIN";
pub const CAPEX_KEY: &str = "CAPEX";
pub const DEPRECIATION_KEY: &str = "DEPRECIATION";
pub const PPE_END_KEY: &str = "PPE_END";

const NS: Namespace = Namespace::Capex;

/// PPE roll-forward: `end = beginning + capex - depreciation`.
pub fn build_capex_sheet(ctx: &BuildContext, sheet: &mut Sheet, refs: &mut ReferenceMap) -> Result<()> {
    sheet.write_title("Capex and PPE Schedule");
    sheet.write_year_header("PPE roll-forward", ctx.timeline.periods());

    let begin = FIRST_DATA_ROW;
    let capex = begin + 1;
    let depreciation = begin + 2;
    let end = begin + 3;
    labeled_row(sheet, refs, PPE_BEGIN_KEY, "Beginning PPE", begin, 0, false)?;
    labeled_row(sheet, refs, CAPEX_KEY, "Add: capital expenditure", capex, 1, false)?;
    labeled_row(sheet, refs, DEPRECIATION_KEY, "Less: depreciation", depreciation, 1, false)?;
    labeled_row(sheet, refs, PPE_END_KEY, "Ending PPE", end, 0, true)?;

    for period in ctx.timeline.periods() {
        let style = amount_style(period, false);
        let col = period.col;

        // Opening balance implied by the first reported year.
        let begin_formula = match previous(end, period) {
            Some(prior_end) => format!("={}", prior_end),
            None => format!(
                "={}-{}+{}",
                history(refs, "FIXED_ASSET", col, NS),
                a1(capex, col),
                a1(depreciation, col)
            ),
        };
        sheet.write_formula(begin, col, begin_formula, style);

        if period.is_historical {
            sheet.write_formula(capex, col, format!("={}", history(refs, "CONSTRUCT_LONG_ASSET", col, NS)), style);
            sheet.write_formula(depreciation, col, format!("={}", history(refs, "FA_IR_DEPR", col, NS)), style);
        } else {
            let revenue = operand(refs, Namespace::Revenue, TOTAL_REVENUE_KEY, col, NS)?;
            let capex_rate = operand(refs, Namespace::Assumptions, AssumptionCode::CapexRate.as_str(), col, NS)?;
            let depreciation_rate = operand(refs, Namespace::Assumptions, DEPRECIATION_RATE_KEY, col, NS)?;
            sheet.write_formula(capex, col, format!("={}*{}", revenue, capex_rate), style);
            sheet.write_formula(depreciation, col, format!("={}*{}", a1(begin, col), depreciation_rate), style);
        }

        sheet.write_formula(
            end,
            col,
            format!("={}+{}-{}", a1(begin, col), a1(capex, col), a1(depreciation, col)),
            amount_style(period, true),
        );
    }

    Ok(())
}
