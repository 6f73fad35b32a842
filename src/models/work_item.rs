use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier assigned by the remote system when a work item is created.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WorkItemId(pub u64);

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WorkItemId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u64>() {
            Ok(0) => Err("work item ids start at 1".to_string()),
            Ok(id) => Ok(Self(id)),
            Err(_) => Err(format!("'{}' is not a work item id", s.trim())),
        }
    }
}

/// Whether a node still has to be created remotely.
///
/// Once `Created`, a node keeps its identifier for the rest of its life; the
/// creator only ever acts on `Pending` nodes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    #[default]
    Pending,
    Created(WorkItemId),
}

impl ItemState {
    pub fn id(&self) -> Option<WorkItemId> {
        match self {
            Self::Pending => None,
            Self::Created(id) => Some(*id),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Remote work item type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemKind {
    Feature,
    UserStory,
    Task,
}

impl WorkItemKind {
    /// The type name as Azure DevOps spells it (`System.WorkItemType`).
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Feature => "Feature",
            Self::UserStory => "User Story",
            Self::Task => "Task",
        }
    }
}

impl fmt::Display for WorkItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Leaf unit of work, always owned by a [`UserStory`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    #[serde(default)]
    pub state: ItemState,
    pub title: String,
    /// Original estimate in hours.
    pub estimate: f64,
    /// Remaining work in hours. Starts equal to `estimate`.
    pub remaining: f64,
    pub assigned_to: String,
    #[serde(default)]
    pub tags: Option<String>,
}

impl Task {
    pub fn new(title: impl Into<String>, estimate: f64, assigned_to: impl Into<String>) -> Self {
        Self {
            state: ItemState::Pending,
            title: title.into(),
            estimate,
            remaining: estimate,
            assigned_to: assigned_to.into(),
            tags: None,
        }
    }

    pub fn with_tags(mut self, tags: Option<String>) -> Self {
        self.tags = tags;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserStory {
    #[serde(default)]
    pub state: ItemState,
    pub title: String,
    /// Existing remote item to link to when the story is not nested under a
    /// feature of the same import.
    #[serde(default)]
    pub parent_id: Option<WorkItemId>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl UserStory {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            state: ItemState::Pending,
            title: title.into(),
            parent_id: None,
            tasks: Vec::new(),
        }
    }

    /// A story that already exists remotely, materialized from a lookup.
    pub fn existing(id: WorkItemId, title: impl Into<String>) -> Self {
        Self {
            state: ItemState::Created(id),
            ..Self::new(title)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    #[serde(default)]
    pub state: ItemState,
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<WorkItemId>,
    #[serde(default)]
    pub user_stories: Vec<UserStory>,
}

impl Feature {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            state: ItemState::Pending,
            title: title.into(),
            parent_id: None,
            user_stories: Vec::new(),
        }
    }
}

/// A top-level element of an import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Feature(Feature),
    UserStory(UserStory),
}

/// The hierarchy rebuilt from a spreadsheet, in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImportTree {
    pub nodes: Vec<TreeNode>,
}

impl ImportTree {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All user stories in pre-order, nested ones included.
    pub fn user_stories(&self) -> impl Iterator<Item = &UserStory> {
        self.nodes.iter().flat_map(|node| match node {
            TreeNode::Feature(feature) => feature.user_stories.iter(),
            TreeNode::UserStory(story) => std::slice::from_ref(story).iter(),
        })
    }

    /// Total node count, features, stories and tasks alike.
    pub fn len(&self) -> usize {
        let features = self
            .nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Feature(_)))
            .count();
        features
            + self
                .user_stories()
                .map(|story| 1 + story.tasks.len())
                .sum::<usize>()
    }

    /// Number of nodes still waiting to be created.
    pub fn pending(&self) -> usize {
        let features = self
            .nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Feature(f) if f.state.is_pending()))
            .count();
        features
            + self
                .user_stories()
                .map(|story| {
                    usize::from(story.state.is_pending())
                        + story.tasks.iter().filter(|t| t.state.is_pending()).count()
                })
                .sum::<usize>()
    }
}
