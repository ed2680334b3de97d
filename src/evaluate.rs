//! In-process recalculation of a [`ModelWorkbook`].
//!
//! Covers the formula subset the sheet builders emit: numbers, `+ - * /`,
//! unary minus, parentheses, A1 references (optionally sheet-qualified),
//! same-sheet ranges and the functions `IFERROR`, `AVERAGE` and `SUM`.
//! Spreadsheet error values propagate through arithmetic until caught by
//! `IFERROR`, as a spreadsheet application would.

use crate::error::{ModelError, Result};
use crate::reference::{CellRef, Namespace, ReferenceMap};
use crate::utils::column_index;
use crate::workbook::{CellValue, ModelWorkbook};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorValue {
    DivZero,
    Value,
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorValue::DivZero => f.write_str("#DIV/0!"),
            ErrorValue::Value => f.write_str("#VALUE!"),
        }
    }
}

/// Result of evaluating one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluated {
    Number(f64),
    Text,
    Empty,
    Error(ErrorValue),
}

impl Evaluated {
    fn scalar(self) -> std::result::Result<f64, ErrorValue> {
        match self {
            Evaluated::Number(v) => Ok(v),
            Evaluated::Empty => Ok(0.0),
            Evaluated::Text => Err(ErrorValue::Value),
            Evaluated::Error(e) => Err(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Ref(CellRef),
    Range(CellRef, CellRef),
    Neg(Box<Expr>),
    Binary(char, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

/// Memoizing evaluator over one workbook.
pub struct Evaluator<'a> {
    workbook: &'a ModelWorkbook,
    cache: HashMap<CellRef, Evaluated>,
    visiting: HashSet<CellRef>,
}

impl<'a> Evaluator<'a> {
    pub fn new(workbook: &'a ModelWorkbook) -> Self {
        Self {
            workbook,
            cache: HashMap::new(),
            visiting: HashSet::new(),
        }
    }

    /// Numeric value of a cell. Error values surface as [`ModelError::Evaluation`].
    pub fn value(&mut self, cell: CellRef) -> Result<f64> {
        match self.evaluate(cell)? {
            Evaluated::Number(v) => Ok(v),
            Evaluated::Empty => Ok(0.0),
            Evaluated::Text => Err(evaluation_error(cell, "cell holds text, not a number")),
            Evaluated::Error(e) => Err(evaluation_error(cell, &e.to_string())),
        }
    }

    /// Numeric value of the recorded `(namespace, key)` row in column `col`.
    pub fn value_of(&mut self, refs: &ReferenceMap, namespace: Namespace, key: &str, col: u16) -> Result<f64> {
        self.value(refs.cell(namespace, key, col)?)
    }

    pub fn evaluate(&mut self, cell: CellRef) -> Result<Evaluated> {
        if let Some(cached) = self.cache.get(&cell) {
            return Ok(*cached);
        }

        let content = self
            .workbook
            .sheet(cell.sheet)
            .cell(cell.row, cell.col)
            .map(|c| c.value.clone());

        let result = match content {
            None => Evaluated::Empty,
            Some(CellValue::Number(v)) => Evaluated::Number(v),
            Some(CellValue::Text(_)) => Evaluated::Text,
            Some(CellValue::Formula(formula)) => {
                if !self.visiting.insert(cell) {
                    return Err(evaluation_error(cell, "circular reference"));
                }
                let expr = Parser::new(&formula, cell.sheet)
                    .parse()
                    .map_err(|details| evaluation_error(cell, &format!("cannot parse '{}': {}", formula, details)))?;
                let value = self.eval(&expr);
                self.visiting.remove(&cell);
                match value? {
                    Ok(v) if v.is_finite() => Evaluated::Number(v),
                    Ok(_) => Evaluated::Error(ErrorValue::DivZero),
                    Err(e) => Evaluated::Error(e),
                }
            }
        };

        self.cache.insert(cell, result);
        Ok(result)
    }

    fn eval(&mut self, expr: &Expr) -> Result<std::result::Result<f64, ErrorValue>> {
        Ok(match expr {
            Expr::Number(v) => Ok(*v),
            Expr::Ref(cell) => self.evaluate(*cell)?.scalar(),
            Expr::Range(..) => Err(ErrorValue::Value),
            Expr::Neg(inner) => self.eval(inner)?.map(|v| -v),
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                match (lhs, rhs) {
                    (Err(e), _) | (_, Err(e)) => Err(e),
                    (Ok(a), Ok(b)) => match op {
                        '+' => Ok(a + b),
                        '-' => Ok(a - b),
                        '*' => Ok(a * b),
                        _ if b == 0.0 => Err(ErrorValue::DivZero),
                        _ => Ok(a / b),
                    },
                }
            }
            Expr::Call(name, args) => self.call(name, args)?,
        })
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> Result<std::result::Result<f64, ErrorValue>> {
        match name {
            "IFERROR" => {
                let (value, fallback) = match args {
                    [value, fallback] => (value, fallback),
                    _ => return Ok(Err(ErrorValue::Value)),
                };
                match self.eval(value)? {
                    Ok(v) => Ok(Ok(v)),
                    Err(_) => self.eval(fallback),
                }
            }
            "SUM" | "AVERAGE" => {
                let mut numbers = Vec::new();
                for arg in args {
                    if let Err(e) = self.collect_numbers(arg, &mut numbers)? {
                        return Ok(Err(e));
                    }
                }
                let total: f64 = numbers.iter().sum();
                if name == "SUM" {
                    Ok(Ok(total))
                } else if numbers.is_empty() {
                    Ok(Err(ErrorValue::DivZero))
                } else {
                    Ok(Ok(total / numbers.len() as f64))
                }
            }
            _ => Ok(Err(ErrorValue::Value)),
        }
    }

    /// Aggregate arguments: ranges contribute only their numeric cells.
    fn collect_numbers(&mut self, arg: &Expr, out: &mut Vec<f64>) -> Result<std::result::Result<(), ErrorValue>> {
        if let Expr::Range(start, end) = arg {
            for row in start.row.min(end.row)..=start.row.max(end.row) {
                for col in start.col.min(end.col)..=start.col.max(end.col) {
                    match self.evaluate(CellRef::new(start.sheet, row, col))? {
                        Evaluated::Number(v) => out.push(v),
                        Evaluated::Error(e) => return Ok(Err(e)),
                        Evaluated::Text | Evaluated::Empty => {}
                    }
                }
            }
            return Ok(Ok(()));
        }

        Ok(self.eval(arg)?.map(|v| out.push(v)))
    }
}

fn evaluation_error(cell: CellRef, details: &str) -> ModelError {
    ModelError::Evaluation {
        sheet: cell.sheet.sheet_name().to_string(),
        cell: cell.local(),
        details: details.to_string(),
    }
}

struct Parser<'s> {
    src: &'s [u8],
    pos: usize,
    sheet: Namespace,
}

impl<'s> Parser<'s> {
    fn new(formula: &'s str, sheet: Namespace) -> Self {
        let formula = formula.strip_prefix('=').unwrap_or(formula);
        Self {
            src: formula.as_bytes(),
            pos: 0,
            sheet,
        }
    }

    fn parse(mut self) -> std::result::Result<Expr, String> {
        let expr = self.expression()?;
        self.skip_spaces();
        if self.pos != self.src.len() {
            return Err(format!("unexpected input at offset {}", self.pos));
        }
        Ok(expr)
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_spaces();
        self.src.get(self.pos).copied()
    }

    fn skip_spaces(&mut self) {
        while self.src.get(self.pos).is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> std::result::Result<(), String> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(format!("expected '{}' at offset {}", byte as char, self.pos))
        }
    }

    fn expression(&mut self) -> std::result::Result<Expr, String> {
        let mut lhs = self.term()?;
        while let Some(op @ (b'+' | b'-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op as char, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> std::result::Result<Expr, String> {
        let mut lhs = self.unary()?;
        while let Some(op @ (b'*' | b'/')) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op as char, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> std::result::Result<Expr, String> {
        match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(b'+') => {
                self.pos += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> std::result::Result<Expr, String> {
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let inner = self.expression()?;
                self.expect(b')')?;
                Ok(inner)
            }
            Some(b) if b.is_ascii_digit() || b == b'.' => self.number(),
            Some(b'\'') => {
                let sheet = self.quoted_sheet()?;
                self.reference_or_range(sheet)
            }
            Some(b) if b.is_ascii_alphabetic() || b == b'$' => {
                let start = self.pos;
                let word = self.word();
                match self.src.get(self.pos) {
                    Some(b'(') => {
                        self.pos += 1;
                        self.call(word.to_ascii_uppercase())
                    }
                    Some(b'!') => {
                        self.pos += 1;
                        let sheet = Namespace::from_sheet_name(&word)
                            .ok_or_else(|| format!("unknown sheet '{}'", word))?;
                        self.reference_or_range(sheet)
                    }
                    _ => {
                        self.pos = start;
                        self.reference_or_range(self.sheet)
                    }
                }
            }
            other => Err(format!(
                "unexpected {} at offset {}",
                other.map_or("end of formula".to_string(), |b| format!("'{}'", b as char)),
                self.pos
            )),
        }
    }

    fn word(&mut self) -> String {
        let start = self.pos;
        while self
            .src
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'$'))
        {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
    }

    fn number(&mut self) -> std::result::Result<Expr, String> {
        let start = self.pos;
        while self
            .src
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_digit() || *b == b'.')
        {
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]);
        text.parse()
            .map(Expr::Number)
            .map_err(|_| format!("invalid number '{}'", text))
    }

    fn quoted_sheet(&mut self) -> std::result::Result<Namespace, String> {
        self.pos += 1;
        let start = self.pos;
        while self.src.get(self.pos).is_some_and(|b| *b != b'\'') {
            self.pos += 1;
        }
        let name = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        self.pos += 1;
        if self.src.get(self.pos) != Some(&b'!') {
            return Err(format!("expected '!' after sheet name '{}'", name));
        }
        self.pos += 1;
        Namespace::from_sheet_name(&name).ok_or_else(|| format!("unknown sheet '{}'", name))
    }

    fn reference_or_range(&mut self, sheet: Namespace) -> std::result::Result<Expr, String> {
        let start = self.cell(sheet)?;
        if self.src.get(self.pos) == Some(&b':') {
            self.pos += 1;
            let end = self.cell(sheet)?;
            return Ok(Expr::Range(start, end));
        }
        Ok(Expr::Ref(start))
    }

    fn cell(&mut self, sheet: Namespace) -> std::result::Result<CellRef, String> {
        let word = self.word().replace('$', "");
        let split = word
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| format!("'{}' is not a cell reference", word))?;
        let (letters, digits) = word.split_at(split);
        let col = column_index(&letters.to_ascii_uppercase())
            .ok_or_else(|| format!("'{}' is not a column", letters))?;
        let row: u32 = digits
            .parse()
            .ok()
            .filter(|r| *r > 0)
            .ok_or_else(|| format!("'{}' is not a row", digits))?;
        Ok(CellRef::new(sheet, row - 1, col))
    }

    fn call(&mut self, name: String) -> std::result::Result<Expr, String> {
        if !matches!(name.as_str(), "IFERROR" | "SUM" | "AVERAGE") {
            return Err(format!("unsupported function {}", name));
        }
        let mut args = Vec::new();
        if self.peek() == Some(b')') {
            self.pos += 1;
            return Ok(Expr::Call(name, args));
        }
        loop {
            args.push(self.expression()?);
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {
                    self.pos += 1;
                    return Ok(Expr::Call(name, args));
                }
                _ => return Err(format!("expected ',' or ')' in {} arguments", name)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::CellStyle;

    const STYLE: CellStyle = CellStyle::Amount { forecast: false, bold: false };

    fn workbook(cells: &[(Namespace, u32, u16, CellValue)]) -> ModelWorkbook {
        let mut workbook = ModelWorkbook::new();
        for (ns, row, col, value) in cells {
            workbook.sheet_mut(*ns).write(*row, *col, value.clone(), STYLE);
        }
        workbook
    }

    fn formula(f: &str) -> CellValue {
        CellValue::Formula(f.to_string())
    }

    #[test]
    fn test_arithmetic_and_precedence() {
        let wb = workbook(&[
            (Namespace::Capex, 0, 0, CellValue::Number(100.0)),
            (Namespace::Capex, 0, 1, formula("=A1+20-A1*0.1")),
            (Namespace::Capex, 0, 2, formula("=-(A1-B1)/2")),
        ]);
        let mut eval = Evaluator::new(&wb);
        assert_eq!(eval.value(CellRef::new(Namespace::Capex, 0, 1)).unwrap(), 110.0);
        assert_eq!(eval.value(CellRef::new(Namespace::Capex, 0, 2)).unwrap(), 5.0);
    }

    #[test]
    fn test_cross_sheet_reference() {
        let wb = workbook(&[
            (Namespace::History, 4, 1, CellValue::Number(7.0)),
            (Namespace::Revenue, 0, 1, formula("='1.History'!B5*2")),
        ]);
        let mut eval = Evaluator::new(&wb);
        assert_eq!(eval.value(CellRef::new(Namespace::Revenue, 0, 1)).unwrap(), 14.0);
    }

    #[test]
    fn test_iferror_catches_division_by_zero() {
        let wb = workbook(&[
            (Namespace::Assumptions, 0, 0, formula("=IFERROR(5/B1,0)")),
            (Namespace::Assumptions, 0, 2, formula("=5/B1")),
        ]);
        let mut eval = Evaluator::new(&wb);
        assert_eq!(eval.value(CellRef::new(Namespace::Assumptions, 0, 0)).unwrap(), 0.0);
        assert_eq!(
            eval.evaluate(CellRef::new(Namespace::Assumptions, 0, 2)).unwrap(),
            Evaluated::Error(ErrorValue::DivZero)
        );
        assert!(matches!(
            eval.value(CellRef::new(Namespace::Assumptions, 0, 2)),
            Err(ModelError::Evaluation { .. })
        ));
    }

    #[test]
    fn test_average_and_sum_over_ranges() {
        let wb = workbook(&[
            (Namespace::Assumptions, 3, 1, CellValue::Number(0.10)),
            (Namespace::Assumptions, 3, 2, CellValue::Number(0.12)),
            (Namespace::Assumptions, 3, 3, formula("=AVERAGE(B4:C4)")),
            (Namespace::Assumptions, 3, 4, formula("=SUM(B4:C4, 1)")),
            (Namespace::Assumptions, 3, 5, formula("=AVERAGE(H4:I4)")),
        ]);
        let mut eval = Evaluator::new(&wb);
        let avg = eval.value(CellRef::new(Namespace::Assumptions, 3, 3)).unwrap();
        assert!((avg - 0.11).abs() < 1e-12);
        let sum = eval.value(CellRef::new(Namespace::Assumptions, 3, 4)).unwrap();
        assert!((sum - 1.22).abs() < 1e-12);
        assert_eq!(
            eval.evaluate(CellRef::new(Namespace::Assumptions, 3, 5)).unwrap(),
            Evaluated::Error(ErrorValue::DivZero)
        );
    }

    #[test]
    fn test_cycle_is_reported() {
        let wb = workbook(&[
            (Namespace::Capex, 0, 0, formula("=B1")),
            (Namespace::Capex, 0, 1, formula("=A1+1")),
        ]);
        let mut eval = Evaluator::new(&wb);
        let err = eval.value(CellRef::new(Namespace::Capex, 0, 0)).unwrap_err();
        assert!(err.to_string().contains("circular"));
    }

    #[test]
    fn test_unparseable_formula_is_an_error() {
        let wb = workbook(&[(Namespace::Capex, 0, 0, formula("=VLOOKUP(1,2)"))]);
        let mut eval = Evaluator::new(&wb);
        assert!(eval.value(CellRef::new(Namespace::Capex, 0, 0)).is_err());
    }
}
