use crate::config::ModelConfig;
use crate::reference::Namespace;
use crate::schema::SchemaRegistry;
use crate::utils::{Period, Timeline};
use serde::Serialize;
use std::collections::BTreeMap;

pub const TITLE_ROW: u32 = 0;
pub const HEADER_ROW: u32 = 2;
pub const FIRST_DATA_ROW: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CellValue {
    Text(String),
    Number(f64),
    /// Spreadsheet formula including the leading `=`.
    Formula(String),
}

/// Presentation role of a cell; the writer maps roles to formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellStyle {
    Title,
    Section,
    YearHeader { forecast: bool },
    Label { indent: u8, bold: bool },
    Amount { forecast: bool, bold: bool },
    Percent { forecast: bool },
    /// Editable assumption input.
    Input { percent: bool },
    Plug,
    Check,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

/// In-memory contents of one worksheet.
#[derive(Debug, Clone, Serialize)]
pub struct Sheet {
    namespace: Namespace,
    cells: BTreeMap<(u32, u16), Cell>,
}

impl Sheet {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            cells: BTreeMap::new(),
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn name(&self) -> &'static str {
        self.namespace.sheet_name()
    }

    pub fn write(&mut self, row: u32, col: u16, value: CellValue, style: CellStyle) {
        self.cells.insert((row, col), Cell { value, style });
    }

    pub fn write_text(&mut self, row: u32, col: u16, text: impl Into<String>, style: CellStyle) {
        self.write(row, col, CellValue::Text(text.into()), style);
    }

    pub fn write_number(&mut self, row: u32, col: u16, value: f64, style: CellStyle) {
        self.write(row, col, CellValue::Number(value), style);
    }

    pub fn write_formula(&mut self, row: u32, col: u16, formula: impl AsRef<str>, style: CellStyle) {
        let formula = formula.as_ref();
        let formula = if formula.starts_with('=') {
            formula.to_string()
        } else {
            format!("={}", formula)
        };
        self.write(row, col, CellValue::Formula(formula), style);
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn cells(&self) -> impl Iterator<Item = ((u32, u16), &Cell)> {
        self.cells.iter().map(|(pos, cell)| (*pos, cell))
    }

    pub fn formula_count(&self) -> usize {
        self.cells
            .values()
            .filter(|c| matches!(c.value, CellValue::Formula(_)))
            .count()
    }

    pub fn last_row(&self) -> Option<u32> {
        self.cells.keys().map(|(row, _)| *row).max()
    }

    pub fn write_title(&mut self, title: &str) {
        self.write_text(TITLE_ROW, Timeline::LABEL_COL, title, CellStyle::Title);
    }

    /// Year header row: `2023A ... 2025E ...`.
    pub fn write_year_header(&mut self, label: &str, periods: impl Iterator<Item = Period>) {
        self.write_text(HEADER_ROW, Timeline::LABEL_COL, label, CellStyle::YearHeader { forecast: false });
        for period in periods {
            let (text, forecast) = if period.is_historical {
                (format!("{}A", period.year), false)
            } else {
                (format!("{}E", period.year), true)
            };
            self.write_text(HEADER_ROW, period.col, text, CellStyle::YearHeader { forecast });
        }
    }
}

/// All nine sheets of a model, in workbook order.
#[derive(Debug, Clone, Serialize)]
pub struct ModelWorkbook {
    sheets: Vec<Sheet>,
}

impl Default for ModelWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelWorkbook {
    pub fn new() -> Self {
        Self {
            sheets: Namespace::ALL.into_iter().map(Sheet::new).collect(),
        }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, namespace: Namespace) -> &Sheet {
        &self.sheets[Self::index_of(namespace)]
    }

    pub fn sheet_mut(&mut self, namespace: Namespace) -> &mut Sheet {
        &mut self.sheets[Self::index_of(namespace)]
    }

    fn index_of(namespace: Namespace) -> usize {
        Namespace::ALL
            .iter()
            .position(|ns| *ns == namespace)
            .unwrap_or_default()
    }
}

/// Read-only inputs shared by every sheet builder.
pub struct BuildContext<'a> {
    pub schema: &'a SchemaRegistry,
    pub config: &'a ModelConfig,
    pub timeline: &'a Timeline,
}
