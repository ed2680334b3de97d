use chrono::{Datelike, Local};
use std::ops::RangeInclusive;

/// Month-day suffix of a fiscal-year-end reporting date.
pub const FISCAL_YEAR_END_MARKER: &str = "12-31";

/// Spreadsheet column letters for a 0-based column index (0 -> A, 26 -> AA).
pub fn column_name(col: u16) -> String {
    let mut n = u32::from(col) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A1-style address of a 0-based cell, e.g. `(4, 2) -> C5`.
pub fn a1(row: u32, col: u16) -> String {
    format!("{}{}", column_name(col), row + 1)
}

/// Renders a constant for use inside a formula.
pub fn formula_literal(value: f64) -> String {
    format!("{}", value)
}

/// Parses column letters back into a 0-based index.
pub fn column_index(letters: &str) -> Option<u16> {
    if letters.is_empty() {
        return None;
    }
    let mut n: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_uppercase() {
            return None;
        }
        n = n * 26 + (c as u32 - 'A' as u32 + 1);
        if n > u32::from(u16::MAX) {
            return None;
        }
    }
    u16::try_from(n - 1).ok()
}

pub fn current_year() -> i32 {
    Local::now().year()
}

/// Fiscal year of a reporting date string, if the date closes a fiscal year.
pub fn fiscal_year_of(report_date: &str) -> Option<i32> {
    if !report_date.contains(FISCAL_YEAR_END_MARKER) {
        return None;
    }
    report_date.get(..4)?.parse().ok()
}

/// The `window` complete years before `as_of_year`.
pub fn trailing_window(as_of_year: i32, window: u32) -> RangeInclusive<i32> {
    let window = i32::try_from(window).unwrap_or(i32::MAX);
    as_of_year.saturating_sub(window)..=as_of_year - 1
}

/// One year column of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub index: usize,
    pub year: i32,
    pub col: u16,
    pub is_historical: bool,
}

impl Period {
    pub fn prev_col(&self) -> Option<u16> {
        (self.index > 0).then(|| self.col - 1)
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }
}

/// Historical years followed by forecast years, laid out from column B.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    historical: Vec<i32>,
    forecast: Vec<i32>,
}

impl Timeline {
    pub const LABEL_COL: u16 = 0;
    pub const FIRST_COL: u16 = 1;
    /// Year columns that fit after the label column in an xlsx sheet.
    pub const MAX_PERIODS: usize = 16_383;

    /// `historical` must be sorted ascending and non-empty. The forecast is
    /// cut short when the sheet runs out of columns.
    pub fn new(historical: Vec<i32>, forecast_years: u32) -> Self {
        let last = historical.last().copied().unwrap_or_else(current_year);
        let room = Self::MAX_PERIODS.saturating_sub(historical.len());
        let horizon = usize::try_from(forecast_years).unwrap_or(usize::MAX).min(room);
        let forecast = (1..=horizon)
            .map_while(|i| i32::try_from(i).ok().and_then(|i| last.checked_add(i)))
            .collect();
        Self {
            historical,
            forecast,
        }
    }

    pub fn historical(&self) -> &[i32] {
        &self.historical
    }

    pub fn forecast(&self) -> &[i32] {
        &self.forecast
    }

    pub fn len(&self) -> usize {
        self.historical.len() + self.forecast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn periods(&self) -> impl Iterator<Item = Period> + '_ {
        let hist_len = self.historical.len();
        self.historical
            .iter()
            .chain(self.forecast.iter())
            .enumerate()
            .map(move |(index, &year)| Period {
                index,
                year,
                col: Self::col_at(index),
                is_historical: index < hist_len,
            })
    }

    pub fn historical_periods(&self) -> impl Iterator<Item = Period> + '_ {
        self.periods().filter(|p| p.is_historical)
    }

    pub fn forecast_periods(&self) -> impl Iterator<Item = Period> + '_ {
        self.periods().filter(|p| !p.is_historical)
    }

    pub fn col_of_year(&self, year: i32) -> Option<u16> {
        self.periods().find(|p| p.year == year).map(|p| p.col)
    }

    pub fn last_col(&self) -> u16 {
        Self::col_at(self.len().saturating_sub(1))
    }

    pub fn last_historical_col(&self) -> u16 {
        Self::col_at(self.historical.len().saturating_sub(1))
    }

    pub fn first_forecast_col(&self) -> u16 {
        Self::col_at(self.historical.len())
    }

    fn col_at(index: usize) -> u16 {
        u16::try_from(index)
            .ok()
            .and_then(|i| Self::FIRST_COL.checked_add(i))
            .unwrap_or(u16::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(1), "B");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_a1_and_literals() {
        assert_eq!(a1(4, 2), "C5");
        assert_eq!(formula_literal(360.0), "360");
        assert_eq!(formula_literal(0.75), "0.75");
    }

    #[test]
    fn test_column_index_inverts_column_name() {
        for col in [0u16, 1, 12, 25, 26, 51, 701, 702] {
            assert_eq!(column_index(&column_name(col)), Some(col));
        }
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("a"), None);
    }

    #[test]
    fn test_fiscal_year_of() {
        assert_eq!(fiscal_year_of("2023-12-31 00:00:00"), Some(2023));
        assert_eq!(fiscal_year_of("2023-12-31"), Some(2023));
        assert_eq!(fiscal_year_of("2023-06-30 00:00:00"), None);
        assert_eq!(fiscal_year_of("12-31"), None);
        assert_eq!(fiscal_year_of(""), None);
    }

    #[test]
    fn test_trailing_window() {
        let window = trailing_window(2025, 7);
        assert_eq!(*window.start(), 2018);
        assert_eq!(*window.end(), 2024);
        assert!(!window.contains(&2025));
    }

    #[test]
    fn test_timeline_layout() {
        let timeline = Timeline::new(vec![2023, 2024], 5);
        assert_eq!(timeline.forecast(), &[2025, 2026, 2027, 2028, 2029]);
        assert_eq!(timeline.len(), 7);

        let periods: Vec<Period> = timeline.periods().collect();
        assert_eq!(periods[0].col, 1);
        assert!(periods[0].is_first());
        assert_eq!(periods[0].prev_col(), None);
        assert!(periods[1].is_historical);
        assert!(!periods[2].is_historical);
        assert_eq!(periods[2].prev_col(), Some(2));

        assert_eq!(timeline.last_historical_col(), 2);
        assert_eq!(timeline.first_forecast_col(), 3);
        assert_eq!(timeline.last_col(), 7);
        assert_eq!(timeline.col_of_year(2026), Some(4));
    }

    #[test]
    fn test_timeline_stops_at_last_sheet_column() {
        let timeline = Timeline::new(vec![2023, 2024], 70_000);
        assert_eq!(timeline.len(), Timeline::MAX_PERIODS);
        assert_eq!(timeline.forecast().len(), Timeline::MAX_PERIODS - 2);
        assert_eq!(timeline.last_col(), 16_383);
        assert_eq!(column_name(timeline.last_col()), "XFD");
        assert!(timeline.periods().all(|p| p.col >= Timeline::FIRST_COL));
        assert_eq!(timeline.periods().last().map(|p| p.col), Some(16_383));
    }
}
