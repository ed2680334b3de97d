use crate::error::Result;
use crate::reference::Namespace;
use crate::workbook::{CellStyle, CellValue, ModelWorkbook, Sheet, FIRST_DATA_ROW};
use log::{debug, info};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use std::path::Path;

const FONT: &str = "Arial";
const NAVY: u32 = 0x003366;
const FORECAST_NAVY: u32 = 0x1F4E79;
const SECTION_FILL: u32 = 0xD9E1F2;
const FORECAST_FILL: u32 = 0xFFF2CC;
const INPUT_FILL: u32 = 0xFFFFCC;
const PLUG_FILL: u32 = 0xE6E6E6;
const INPUT_BLUE: u32 = 0x0000FF;
const ALERT_RED: u32 = 0xFF0000;

const LABEL_WIDTH: f64 = 46.0;
const YEAR_WIDTH: f64 = 14.0;

/// Writes a model to disk, creating the parent directory if needed.
pub fn save_workbook(model: &ModelWorkbook, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut workbook = render(model)?;
    workbook.save(path)?;
    info!("Saved workbook to {}", path.display());
    Ok(())
}

/// Renders a model to xlsx bytes.
pub fn workbook_to_buffer(model: &ModelWorkbook) -> Result<Vec<u8>> {
    let mut workbook = render(model)?;
    Ok(workbook.save_to_buffer()?)
}

fn render(model: &ModelWorkbook) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    for sheet in model.sheets() {
        let worksheet = workbook.add_worksheet();
        render_sheet(sheet, worksheet)?;
    }
    Ok(workbook)
}

fn render_sheet(sheet: &Sheet, worksheet: &mut Worksheet) -> Result<()> {
    worksheet.set_name(sheet.name())?;
    worksheet.set_screen_gridlines(false);
    worksheet.set_tab_color(Color::RGB(tab_color(sheet.namespace())));
    worksheet.set_column_width(0, LABEL_WIDTH)?;

    let mut last_col = 0;
    for ((row, col), cell) in sheet.cells() {
        let format = format_for(cell.style);
        match &cell.value {
            CellValue::Text(text) => worksheet.write_string_with_format(row, col, text.as_str(), &format)?,
            CellValue::Number(value) => worksheet.write_number_with_format(row, col, *value, &format)?,
            CellValue::Formula(formula) => worksheet.write_formula_with_format(row, col, formula.as_str(), &format)?,
        };
        last_col = last_col.max(col);
    }

    for col in 1..=last_col {
        worksheet.set_column_width(col, YEAR_WIDTH)?;
    }
    worksheet.set_freeze_panes(FIRST_DATA_ROW, 1)?;

    debug!("Rendered sheet '{}' ({} formulas)", sheet.name(), sheet.formula_count());
    Ok(())
}

fn tab_color(namespace: Namespace) -> u32 {
    match namespace {
        Namespace::History => 0x808080,
        Namespace::Assumptions => 0xFFC000,
        Namespace::Revenue | Namespace::Capex | Namespace::Financing | Namespace::WorkingCapital => 0x70AD47,
        Namespace::IncomeStatement | Namespace::BalanceSheet | Namespace::CashFlow => 0x4472C4,
    }
}

fn base() -> Format {
    Format::new().set_font_name(FONT).set_font_size(10)
}

fn format_for(style: CellStyle) -> Format {
    match style {
        CellStyle::Title => base()
            .set_bold()
            .set_font_size(14)
            .set_font_color(Color::RGB(NAVY)),
        CellStyle::Section => base()
            .set_bold()
            .set_background_color(Color::RGB(SECTION_FILL)),
        CellStyle::YearHeader { forecast } => base()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(if forecast { FORECAST_NAVY } else { NAVY }))
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin),
        CellStyle::Label { indent, bold } => {
            let format = base().set_indent(indent);
            if bold {
                format.set_bold()
            } else {
                format
            }
        }
        CellStyle::Amount { forecast, bold } => {
            let mut format = base().set_num_format("#,##0.00");
            if forecast {
                format = format.set_background_color(Color::RGB(FORECAST_FILL));
            }
            if bold {
                format = format.set_bold().set_border_top(FormatBorder::Thin);
            }
            format
        }
        CellStyle::Percent { forecast } => {
            let format = base().set_num_format("0.00%");
            if forecast {
                format.set_background_color(Color::RGB(FORECAST_FILL))
            } else {
                format
            }
        }
        CellStyle::Input { percent } => base()
            .set_num_format(if percent { "0.00%" } else { "0.0" })
            .set_font_color(Color::RGB(INPUT_BLUE))
            .set_background_color(Color::RGB(INPUT_FILL))
            .set_border(FormatBorder::Thin),
        CellStyle::Plug => base()
            .set_bold()
            .set_num_format("#,##0.00")
            .set_font_color(Color::RGB(ALERT_RED))
            .set_background_color(Color::RGB(PLUG_FILL)),
        CellStyle::Check => base()
            .set_italic()
            .set_num_format("#,##0.00")
            .set_font_color(Color::RGB(ALERT_RED)),
    }
}
