use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use thiserror::Error;

use super::{Cell, Table, TableRow};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Errors raised while turning bytes into a [`Table`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to open workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook contains no worksheets")]
    NoWorksheet,

    #[error("Sheet is empty")]
    Empty,

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
}

/// How the raw bytes are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    /// Any workbook calamine can open (xlsx, xlsm, xlsb, xls, ods).
    Workbook,
    Csv,
}

impl SheetFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, DecodeError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Workbook),
            "csv" => Ok(Self::Csv),
            _ => Err(DecodeError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Decode raw bytes into a table. The first non-empty line is the header.
pub fn decode(bytes: Vec<u8>, format: SheetFormat) -> Result<Table, DecodeError> {
    let lines = match format {
        SheetFormat::Workbook => workbook_lines(bytes)?,
        SheetFormat::Csv => csv_lines(&bytes)?,
    };

    let mut lines = lines.into_iter().skip_while(TableRow::is_empty);
    let header = lines.next().ok_or(DecodeError::Empty)?;
    let headers = header
        .cells
        .iter()
        .map(|cell| match cell {
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
            Cell::Empty => String::new(),
        })
        .collect();

    Ok(Table {
        headers,
        rows: lines.collect(),
    })
}

/// Render a number the way a spreadsheet shows it: integers without decimals.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn workbook_lines(bytes: Vec<u8>) -> Result<Vec<TableRow>, DecodeError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(DecodeError::NoWorksheet)??;

    // Ranges start at the first used cell, not at A1.
    let first_line = match range.start() {
        Some((row, _)) => row as usize + 1,
        None => return Err(DecodeError::Empty),
    };

    Ok(range
        .rows()
        .enumerate()
        .map(|(offset, row)| TableRow {
            line: first_line + offset,
            cells: row.iter().map(cell_from_data).collect(),
        })
        .collect())
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
    }
}

fn csv_lines(bytes: &[u8]) -> Result<Vec<TableRow>, DecodeError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(lines.len() + 1);
        let cells = record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        lines.push(TableRow { line, cells });
    }
    Ok(lines)
}
