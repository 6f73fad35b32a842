//! JSON Patch documents accepted by the work item endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const FIELD_TITLE: &str = "System.Title";
pub const FIELD_WORK_ITEM_TYPE: &str = "System.WorkItemType";
pub const FIELD_STATE: &str = "System.State";
pub const FIELD_ITERATION_PATH: &str = "System.IterationPath";
pub const FIELD_TAGS: &str = "System.Tags";
pub const FIELD_ASSIGNED_TO: &str = "System.AssignedTo";
pub const FIELD_ORIGINAL_ESTIMATE: &str = "Microsoft.VSTS.Scheduling.OriginalEstimate";
pub const FIELD_REMAINING_WORK: &str = "Microsoft.VSTS.Scheduling.RemainingWork";

/// Relation a child carries towards its parent.
pub const HIERARCHY_REVERSE: &str = "System.LinkTypes.Hierarchy-Reverse";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
    Test,
}

/// One entry of a patch document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

/// Ordered list of operations, applied atomically by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PatchDocument(pub Vec<PatchOperation>);

impl PatchDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, e.g. `System.Title`.
    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.push(PatchOperation {
            op: PatchOp::Add,
            path: format!("/fields/{}", name),
            value: value.into(),
            from: None,
        });
        self
    }

    /// Append a hierarchy-reverse relation pointing at `parent_url`.
    pub fn parent_link(mut self, parent_url: &str) -> Self {
        self.0.push(PatchOperation {
            op: PatchOp::Add,
            path: "/relations/-".to_string(),
            value: json!({
                "rel": HIERARCHY_REVERSE,
                "url": parent_url,
                "attributes": { "comment": "Associated with" },
            }),
            from: None,
        });
        self
    }

    /// Value of the first operation setting `/fields/{name}`.
    pub fn field_value(&self, name: &str) -> Option<&Value> {
        let path = format!("/fields/{}", name);
        self.0.iter().find(|op| op.path == path).map(|op| &op.value)
    }

    /// URL of the parent relation, if the document links one.
    pub fn parent_url(&self) -> Option<&str> {
        self.0
            .iter()
            .filter(|op| op.path == "/relations/-")
            .find(|op| op.value["rel"] == HIERARCHY_REVERSE)
            .and_then(|op| op.value["url"].as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
