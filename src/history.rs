use crate::error::Result;
use crate::normalizer::DataPool;
use crate::reference::{Namespace, ReferenceMap};
use crate::schema::StatementKind;
use crate::utils::Timeline;
use crate::workbook::{BuildContext, CellStyle, Sheet, FIRST_DATA_ROW};
use log::debug;

/// Lays out the three historical statements, one below the other, and
/// records every keyed line under `HIST`.
pub fn build_history_sheet(
    ctx: &BuildContext,
    pool: &DataPool,
    sheet: &mut Sheet,
    refs: &mut ReferenceMap,
) -> Result<()> {
    let divisor = ctx.config.units_divisor;
    sheet.write_title(&format!(
        "Historical Financial Statements (units: {})",
        units_label(divisor)
    ));
    sheet.write_year_header("Line item", ctx.timeline.historical_periods());

    let mut row = FIRST_DATA_ROW;
    for kind in StatementKind::ALL {
        sheet.write_text(row, Timeline::LABEL_COL, kind.title(), CellStyle::Section);
        row += 1;

        for item in ctx.schema.statement(kind) {
            let bold = item.is_subtotal;
            sheet.write_text(
                row,
                Timeline::LABEL_COL,
                item.label.as_str(),
                CellStyle::Label { indent: item.indent, bold },
            );

            if item.has_key() {
                refs.record(Namespace::History, item.key.as_str(), row)?;
                for period in ctx.timeline.historical_periods() {
                    let value = pool.value(period.year, &item.key) / divisor;
                    let style = if item.key == "BALANCE_CHECK" {
                        CellStyle::Check
                    } else {
                        CellStyle::Amount { forecast: false, bold }
                    };
                    sheet.write_number(row, period.col, value, style);
                }
            }
            row += 1;
        }

        // Blank separator between statements.
        row += 1;
    }

    debug!(
        "History sheet: {} keyed lines over {} years",
        refs.keys(Namespace::History).count(),
        ctx.timeline.historical().len()
    );
    Ok(())
}

fn units_label(divisor: f64) -> String {
    match divisor {
        d if d == 1.0 => "as reported".to_string(),
        d if d == 1e3 => "thousands".to_string(),
        d if d == 1e6 => "millions".to_string(),
        d if d == 1e8 => "hundred millions".to_string(),
        d => format!("1/{}", d),
    }
}
