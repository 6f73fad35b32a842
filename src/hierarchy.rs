//! Rebuilds the Feature / User Story / Task hierarchy from validated rows.
//!
//! Rows arrive flat and in sheet order. A task row without `ParentId` belongs
//! to the most recently appended user story; a task row with `ParentId`
//! belongs to the story carrying that identifier, which is fetched from the
//! remote system when no story of this import has it.
//!
//! The build is a fold: [`Fold`] is the accumulator and each row is one
//! [`Fold::step`]. Nothing outside the fold sees intermediate state.

use crate::client::WorkItemLookup;
use crate::error::ResolutionError;
use crate::models::*;

/// Where a user story sits in the tree being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoryPos {
    Root(usize),
    Nested { feature: usize, story: usize },
}

#[derive(Debug, Default)]
struct Fold {
    nodes: Vec<TreeNode>,
    /// Index of the feature that parentless stories nest under.
    current_feature: Option<usize>,
    /// Most recently appended user story.
    current_story: Option<StoryPos>,
}

impl Fold {
    async fn step<L>(
        mut self,
        row: Row,
        project: &str,
        lookup: &L,
    ) -> Result<Self, ResolutionError>
    where
        L: WorkItemLookup + ?Sized,
    {
        match row.row_type {
            RowType::Feature => {
                let mut feature = Feature::new(row.title);
                feature.parent_id = row.parent_id;
                self.nodes.push(TreeNode::Feature(feature));
                self.current_feature = Some(self.nodes.len() - 1);
                self.current_story = None;
            }
            RowType::UserStory => {
                let mut story = UserStory::new(row.title);
                story.parent_id = row.parent_id;
                self.push_story(story);
            }
            RowType::Task => {
                let task = Task::new(
                    row.title.clone(),
                    row.estimate.unwrap_or_default(),
                    row.assigned_to.clone().unwrap_or_default(),
                )
                .with_tags(row.tags.clone());

                let pos = match row.parent_id {
                    None => self.current_story.ok_or_else(|| ResolutionError::OrphanTask {
                        row: row.line,
                        title: row.title.clone(),
                    })?,
                    Some(parent_id) => match self.find_story(parent_id) {
                        Some(pos) => pos,
                        None => {
                            let story = resolve_remote(&row, parent_id, project, lookup).await?;
                            self.nodes.push(TreeNode::UserStory(story));
                            let pos = StoryPos::Root(self.nodes.len() - 1);
                            self.current_story = Some(pos);
                            pos
                        }
                    },
                };

                let story = self.story_mut(pos).ok_or(ResolutionError::OrphanTask {
                    row: row.line,
                    title: row.title,
                })?;
                story.tasks.push(task);
            }
        }
        Ok(self)
    }

    /// Append a story. Without an explicit remote parent it nests under the
    /// open feature; with one it goes to the top level and closes the scope.
    fn push_story(&mut self, story: UserStory) {
        if story.parent_id.is_some() {
            self.current_feature = None;
        }
        if let Some(index) = self.current_feature {
            if let Some(TreeNode::Feature(feature)) = self.nodes.get_mut(index) {
                feature.user_stories.push(story);
                self.current_story = Some(StoryPos::Nested {
                    feature: index,
                    story: feature.user_stories.len() - 1,
                });
                return;
            }
        }
        self.nodes.push(TreeNode::UserStory(story));
        self.current_story = Some(StoryPos::Root(self.nodes.len() - 1));
    }

    /// Stories with an id are the ones fetched remotely, always top-level.
    fn find_story(&self, id: WorkItemId) -> Option<StoryPos> {
        self.nodes
            .iter()
            .position(|node| {
                matches!(node, TreeNode::UserStory(story) if story.state.id() == Some(id))
            })
            .map(StoryPos::Root)
    }

    fn story_mut(&mut self, pos: StoryPos) -> Option<&mut UserStory> {
        match pos {
            StoryPos::Root(i) => match self.nodes.get_mut(i) {
                Some(TreeNode::UserStory(story)) => Some(story),
                _ => None,
            },
            StoryPos::Nested { feature, story } => match self.nodes.get_mut(feature) {
                Some(TreeNode::Feature(f)) => f.user_stories.get_mut(story),
                _ => None,
            },
        }
    }

    fn finish(self) -> ImportTree {
        ImportTree { nodes: self.nodes }
    }
}

/// Materialize an existing remote story so tasks can hang off it.
async fn resolve_remote<L>(
    row: &Row,
    parent_id: WorkItemId,
    project: &str,
    lookup: &L,
) -> Result<UserStory, ResolutionError>
where
    L: WorkItemLookup + ?Sized,
{
    tracing::debug!("Looking up parent work item {} for row {}", parent_id, row.line);
    let item = lookup
        .fetch_work_item(project, parent_id)
        .await
        .map_err(|source| ResolutionError::Lookup {
            row: row.line,
            parent_id,
            source,
        })?;
    let title = item
        .title()
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{}", parent_id));
    Ok(UserStory::existing(parent_id, title))
}

/// Builds an [`ImportTree`] for one project.
pub struct HierarchyBuilder<'a, L: ?Sized> {
    project: &'a str,
    lookup: &'a L,
}

impl<'a, L> HierarchyBuilder<'a, L>
where
    L: WorkItemLookup + ?Sized,
{
    pub fn new(project: &'a str, lookup: &'a L) -> Self {
        Self { project, lookup }
    }

    /// Fold `rows` into a tree. Any resolution failure discards the whole build.
    pub async fn build(&self, rows: Vec<Row>) -> Result<ImportTree, ResolutionError> {
        let mut fold = Fold::default();
        for row in rows {
            fold = fold.step(row, self.project, self.lookup).await?;
        }
        let tree = fold.finish();
        tracing::info!(
            "Built import tree: {} top-level nodes, {} work items",
            tree.nodes.len(),
            tree.len()
        );
        Ok(tree)
    }
}
