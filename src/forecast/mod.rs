//! Forecast sheets, built in dependency order.
//!
//! Each builder only reads coordinates recorded by earlier builders. History
//! lookups degrade to a literal `0` when the schema does not carry the line;
//! lookups into other builders' namespaces are strict and fail when a stage
//! ran out of order.

pub mod balance_sheet;
pub mod capex;
pub mod cash_flow;
pub mod debt;
pub mod income_statement;
pub mod revenue;
pub mod working_capital;

use crate::error::Result;
use crate::reference::{Namespace, ReferenceMap};
use crate::utils::{a1, Period, Timeline};
use crate::workbook::{CellStyle, Sheet};

/// Address of a History line as seen from `from`, or `0` if it was not laid out.
pub(crate) fn history(refs: &ReferenceMap, key: &str, col: u16, from: Namespace) -> String {
    refs.operand_or_zero(Namespace::History, key, col, from)
}

/// Strict cross-sheet address.
pub(crate) fn operand(refs: &ReferenceMap, namespace: Namespace, key: &str, col: u16, from: Namespace) -> Result<String> {
    Ok(refs.cell(namespace, key, col)?.from_sheet(from))
}

pub(crate) fn amount_style(period: Period, bold: bool) -> CellStyle {
    CellStyle::Amount {
        forecast: !period.is_historical,
        bold,
    }
}

/// Writes a row label and records the row under `namespace`.
pub(crate) fn labeled_row(
    sheet: &mut Sheet,
    refs: &mut ReferenceMap,
    key: &str,
    label: &str,
    row: u32,
    indent: u8,
    bold: bool,
) -> Result<()> {
    refs.record(sheet.namespace(), key, row)?;
    sheet.write_text(row, Timeline::LABEL_COL, label, CellStyle::Label { indent, bold });
    Ok(())
}

/// Same-sheet address of `row` in the previous period's column.
pub(crate) fn previous(row: u32, period: Period) -> Option<String> {
    period.prev_col().map(|col| a1(row, col))
}
