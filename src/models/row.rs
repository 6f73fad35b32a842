use serde::{Deserialize, Serialize};

use super::WorkItemId;

/// The kind of line a spreadsheet row describes (the `Tipo` column).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RowType {
    Feature,
    UserStory,
    Task,
}

impl RowType {
    pub const ALL: [RowType; 3] = [Self::Feature, Self::UserStory, Self::Task];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "Feature",
            Self::UserStory => "UserStory",
            Self::Task => "Task",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Feature" => Some(Self::Feature),
            "UserStory" => Some(Self::UserStory),
            "Task" => Some(Self::Task),
            _ => None,
        }
    }
}

/// A validated spreadsheet row.
///
/// `estimate` and `assigned_to` are guaranteed to be present when
/// `row_type` is [`RowType::Task`].
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// 1-based row number in the source sheet.
    pub line: usize,
    pub title: String,
    pub row_type: RowType,
    pub estimate: Option<f64>,
    pub assigned_to: Option<String>,
    pub tags: Option<String>,
    pub parent_id: Option<WorkItemId>,
}
