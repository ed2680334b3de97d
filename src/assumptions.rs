use crate::error::Result;
use crate::reference::{CellRef, Namespace, ReferenceMap};
use crate::schema::{AssumptionKind, ForecastAssumption};
use crate::utils::{formula_literal, Period, Timeline};
use crate::workbook::{BuildContext, CellStyle, Sheet, FIRST_DATA_ROW};
use log::{debug, info};

pub const DEPRECIATION_RATE_KEY: &str = "DEPR_RATE";
pub const DEBT_RATE_KEY: &str = "DEBT_RATE";

/// Builds the Assumptions sheet: derived historical ratios, forecast
/// defaults and the fixed schedule rates. Records each row under `ASSUMP`.
pub fn build_assumptions_sheet(ctx: &BuildContext, sheet: &mut Sheet, refs: &mut ReferenceMap) -> Result<()> {
    sheet.write_title("Forecast Assumptions");
    sheet.write_year_header("Assumption", ctx.timeline.periods());
    ctx.config
        .assumption_overrides
        .warn_unused(ctx.timeline.forecast());

    let mut row = FIRST_DATA_ROW;
    for assumption in ctx.schema.assumptions() {
        refs.record(Namespace::Assumptions, assumption.code.as_str(), row)?;
        sheet.write_text(
            row,
            Timeline::LABEL_COL,
            assumption.display_name.as_str(),
            CellStyle::Label { indent: 1, bold: false },
        );

        let has_inputs = refs.contains(Namespace::History, &assumption.numerator_key)
            && refs.contains(Namespace::History, &assumption.denominator_key);
        if !has_inputs {
            info!(
                "{} inputs are not on the History sheet; using default {}",
                assumption.code, assumption.default_value
            );
        }

        for period in ctx.timeline.historical_periods() {
            write_historical_cell(ctx, sheet, refs, assumption, period, row, has_inputs)?;
        }
        for period in ctx.timeline.forecast_periods() {
            write_forecast_cell(ctx, sheet, assumption, period, row, has_inputs);
        }
        row += 1;
    }

    row += 1;
    for (key, label, rate) in [
        (DEPRECIATION_RATE_KEY, "Depreciation rate (% of beginning PPE)", ctx.config.depreciation_rate),
        (DEBT_RATE_KEY, "Interest rate on debt", ctx.config.debt_interest_rate),
    ] {
        refs.record(Namespace::Assumptions, key, row)?;
        sheet.write_text(row, Timeline::LABEL_COL, label, CellStyle::Label { indent: 1, bold: false });
        for period in ctx.timeline.periods() {
            sheet.write_number(row, period.col, rate, CellStyle::Input { percent: true });
        }
        row += 1;
    }

    debug!("Assumptions sheet: {} rows", refs.keys(Namespace::Assumptions).count());
    Ok(())
}

fn write_historical_cell(
    ctx: &BuildContext,
    sheet: &mut Sheet,
    refs: &ReferenceMap,
    assumption: &ForecastAssumption,
    period: Period,
    row: u32,
    has_inputs: bool,
) -> Result<()> {
    let style = if assumption.is_day_count() {
        CellStyle::Amount { forecast: false, bold: false }
    } else {
        CellStyle::Percent { forecast: false }
    };

    if !has_inputs {
        sheet.write_number(row, period.col, 0.0, style);
        return Ok(());
    }

    let numerator = refs
        .cell(Namespace::History, &assumption.numerator_key, period.col)?
        .from_sheet(Namespace::Assumptions);

    match assumption.kind {
        AssumptionKind::Growth => match period.prev_col() {
            None => sheet.write_number(row, period.col, 0.0, style),
            Some(prev) => {
                let previous = refs
                    .cell(Namespace::History, &assumption.numerator_key, prev)?
                    .from_sheet(Namespace::Assumptions);
                sheet.write_formula(row, period.col, format!("=IFERROR({}/{}-1,0)", numerator, previous), style);
            }
        },
        AssumptionKind::Ratio | AssumptionKind::DayCount => {
            let denominator = refs
                .cell(Namespace::History, &assumption.denominator_key, period.col)?
                .from_sheet(Namespace::Assumptions);
            let formula = if assumption.is_day_count() {
                format!(
                    "=IFERROR({}/{}*{},0)",
                    numerator,
                    denominator,
                    formula_literal(ctx.config.days_per_year)
                )
            } else {
                format!("=IFERROR({}/{},0)", numerator, denominator)
            };
            sheet.write_formula(row, period.col, formula, style);
        }
    }
    Ok(())
}

fn write_forecast_cell(
    ctx: &BuildContext,
    sheet: &mut Sheet,
    assumption: &ForecastAssumption,
    period: Period,
    row: u32,
    has_inputs: bool,
) {
    let percent = !assumption.is_day_count();
    let style = CellStyle::Input { percent };

    if let Some(value) = ctx
        .config
        .assumption_overrides
        .value_for(assumption.code, period.year)
    {
        debug!("{} {} overridden to {}", assumption.code, period.year, value);
        sheet.write_number(row, period.col, value, style);
        return;
    }

    if !has_inputs {
        sheet.write_number(row, period.col, assumption.default_value, style);
        return;
    }

    let last = ctx.timeline.last_historical_col();
    let first = last.saturating_sub(1).max(Timeline::FIRST_COL);
    let start = CellRef::new(Namespace::Assumptions, row, first);
    let end = CellRef::new(Namespace::Assumptions, row, last);
    sheet.write_formula(
        row,
        period.col,
        format!("=AVERAGE({}:{})", start.local(), end.local()),
        style,
    );
}
