//! Error taxonomy of the import pipeline.
//!
//! Each stage owns one error type, and [`ImportError`] wraps whichever stage
//! stopped the pipeline so callers can tell them apart.

use thiserror::Error;

use crate::client::ClientError;
use crate::models::{WorkItemId, WorkItemKind};
use crate::sheet::DecodeError;

/// What was wrong with a single cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    Required,
    NotOneOf { allowed: Vec<&'static str> },
    Invalid { reason: String },
}

/// A schema violation at one cell of the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {row}, column '{column}': {}", describe(.kind))]
pub struct ValidationError {
    /// 1-based sheet row number.
    pub row: usize,
    pub column: &'static str,
    pub kind: ValidationErrorKind,
}

fn describe(kind: &ValidationErrorKind) -> String {
    match kind {
        ValidationErrorKind::Required => "value is required".to_string(),
        ValidationErrorKind::NotOneOf { allowed } => {
            format!("value must be one of {}", allowed.join(", "))
        }
        ValidationErrorKind::Invalid { reason } => reason.clone(),
    }
}

/// Failure to place a row in the hierarchy.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("row {row}: task '{title}' has no user story to attach to")]
    OrphanTask { row: usize, title: String },

    #[error("row {row}: failed to look up parent work item {parent_id}: {source}")]
    Lookup {
        row: usize,
        parent_id: WorkItemId,
        #[source]
        source: ClientError,
    },
}

/// Failure to create one node of the tree.
#[derive(Debug, Error)]
#[error("failed to create {kind} '{title}' (node {position}): {source}")]
pub struct CreationError {
    pub kind: WorkItemKind,
    pub title: String,
    /// 0-based pre-order position of the node in the tree.
    pub position: usize,
    #[source]
    pub source: ClientError,
}

/// The stage that stopped an import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("sheet has {} validation error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Creation(#[from] CreationError),
}

impl From<Vec<ValidationError>> for ImportError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}
