//! Spreadsheet decoding and schema validation.
//!
//! Decoding turns raw bytes into a [`Table`] of loosely typed cells; the
//! [`schema`] then validates every data row and yields [`Row`]s, or every
//! problem it found.

mod decode;
pub mod schema;

pub use decode::*;
pub use schema::parse_rows;

use crate::error::ImportError;
use crate::models::Row;

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) | Self::Bool(_) => false,
        }
    }
}

/// One line of a decoded sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// 1-based line number in the source sheet.
    pub line: usize,
    pub cells: Vec<Cell>,
}

impl TableRow {
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }
}

/// A decoded sheet: the header line followed by data lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

/// Decode and validate a sheet in one step.
pub fn read_rows(bytes: Vec<u8>, format: SheetFormat) -> Result<Vec<Row>, ImportError> {
    let table = decode(bytes, format)?;
    let rows = parse_rows(&table)?;
    tracing::debug!("Parsed {} rows from {} sheet lines", rows.len(), table.rows.len());
    Ok(rows)
}
