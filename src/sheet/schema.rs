//! Declarative column schema of the import sheet.

use std::collections::HashMap;

use super::decode::format_number;
use super::{Cell, Table, TableRow};
use crate::error::{ValidationError, ValidationErrorKind};
use crate::models::{Row, RowType, WorkItemId};

/// Semantic field a column feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Type,
    Estimate,
    AssignedTo,
    Tags,
    ParentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Number,
    WorkItemId,
}

/// When a column must hold a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Always,
    Optional,
    /// Required only when the row's `Tipo` equals this type.
    WhenType(RowType),
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub header: &'static str,
    pub field: Field,
    pub kind: ValueKind,
    pub required: Requirement,
    pub one_of: Option<&'static [&'static str]>,
}

const ROW_TYPES: &[&str] = &["Feature", "UserStory", "Task"];

pub const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        header: "Nome",
        field: Field::Title,
        kind: ValueKind::Text,
        required: Requirement::Always,
        one_of: None,
    },
    ColumnSpec {
        header: "Tipo",
        field: Field::Type,
        kind: ValueKind::Text,
        required: Requirement::Always,
        one_of: Some(ROW_TYPES),
    },
    ColumnSpec {
        header: "Estimativa",
        field: Field::Estimate,
        kind: ValueKind::Number,
        required: Requirement::WhenType(RowType::Task),
        one_of: None,
    },
    ColumnSpec {
        header: "Responsavel",
        field: Field::AssignedTo,
        kind: ValueKind::Text,
        required: Requirement::WhenType(RowType::Task),
        one_of: None,
    },
    ColumnSpec {
        header: "Tags",
        field: Field::Tags,
        kind: ValueKind::Text,
        required: Requirement::Optional,
        one_of: None,
    },
    ColumnSpec {
        header: "ParentId",
        field: Field::ParentId,
        kind: ValueKind::WorkItemId,
        required: Requirement::Optional,
        one_of: None,
    },
];

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Text(String),
    Number(f64),
    Id(WorkItemId),
}

/// Validate every data line of `table` against [`COLUMNS`].
///
/// Either every non-empty line becomes a [`Row`], or all problems found in
/// the whole sheet are returned, in sheet order.
pub fn parse_rows(table: &Table) -> Result<Vec<Row>, Vec<ValidationError>> {
    let positions: HashMap<&str, usize> = table
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for line in table.rows.iter().filter(|line| !line.is_empty()) {
        match validate_line(line, &positions) {
            Ok(row) => rows.push(row),
            Err(mut line_errors) => errors.append(&mut line_errors),
        }
    }

    if errors.is_empty() {
        Ok(rows)
    } else {
        Err(errors)
    }
}

fn validate_line(
    line: &TableRow,
    positions: &HashMap<&str, usize>,
) -> Result<Row, Vec<ValidationError>> {
    let cell = |header: &str| {
        positions
            .get(header)
            .and_then(|&i| line.cells.get(i))
            .unwrap_or(&Cell::Empty)
    };

    // Conditional requirements look at the raw type, even when it is invalid.
    let row_type = text(cell("Tipo")).and_then(|t| RowType::from_str(&t));

    let mut values: HashMap<Field, Value> = HashMap::new();
    let mut errors = Vec::new();

    for spec in COLUMNS {
        let error = |kind| ValidationError {
            row: line.line,
            column: spec.header,
            kind,
        };

        match coerce(cell(spec.header), spec.kind) {
            Ok(Some(value)) => {
                if let (Some(allowed), Value::Text(s)) = (spec.one_of, &value) {
                    if !allowed.contains(&s.as_str()) {
                        errors.push(error(ValidationErrorKind::NotOneOf {
                            allowed: allowed.to_vec(),
                        }));
                        continue;
                    }
                }
                values.insert(spec.field, value);
            }
            Ok(None) => {
                let required = match spec.required {
                    Requirement::Always => true,
                    Requirement::Optional => false,
                    Requirement::WhenType(t) => row_type == Some(t),
                };
                if required {
                    errors.push(error(ValidationErrorKind::Required));
                }
            }
            Err(reason) => errors.push(error(ValidationErrorKind::Invalid { reason })),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut take_text = |field| match values.remove(&field) {
        Some(Value::Text(s)) => Some(s),
        _ => None,
    };
    let title = take_text(Field::Title).unwrap_or_default();
    let assigned_to = take_text(Field::AssignedTo);
    let tags = take_text(Field::Tags);

    let estimate = match values.get(&Field::Estimate) {
        Some(Value::Number(n)) => Some(*n),
        _ => None,
    };
    let parent_id = match values.get(&Field::ParentId) {
        Some(Value::Id(id)) => Some(*id),
        _ => None,
    };

    Ok(Row {
        line: line.line,
        title,
        // Tipo is required and checked against the allowed values above.
        row_type: row_type.unwrap_or(RowType::UserStory),
        estimate,
        assigned_to,
        tags,
        parent_id,
    })
}

fn text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Cell::Number(n) => Some(format_number(*n)),
        Cell::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
    }
}

fn coerce(cell: &Cell, kind: ValueKind) -> Result<Option<Value>, String> {
    let Some(raw) = text(cell) else {
        return Ok(None);
    };

    match kind {
        ValueKind::Text => Ok(Some(Value::Text(raw))),
        ValueKind::Number => {
            let n = match cell {
                Cell::Number(n) => *n,
                Cell::Text(_) => raw
                    .replace(',', ".")
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| format!("'{}' is not a number", raw))?,
                _ => return Err(format!("'{}' is not a number", raw)),
            };
            if n < 0.0 {
                return Err(format!("{} must not be negative", raw));
            }
            Ok(Some(Value::Number(n)))
        }
        ValueKind::WorkItemId => match cell {
            Cell::Number(n) if n.fract() != 0.0 => Err(format!("'{}' is not a work item id", raw)),
            _ => raw.parse::<WorkItemId>().map(|id| Some(Value::Id(id))),
        },
    }
}
