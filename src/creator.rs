//! Replicates an [`ImportTree`] remotely, parents before children.
//!
//! Nodes that are already `Created` are skipped, so calling
//! [`WorkItemCreator::create_all`] again on a tree that failed halfway picks
//! up at the first node still pending.

use crate::client::*;
use crate::error::CreationError;
use crate::models::*;

/// Outcome of a successful walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreationReport {
    pub created: usize,
    pub skipped: usize,
}

/// Pre-order cursor over the tree.
#[derive(Debug, Default)]
struct Walk {
    position: usize,
    report: CreationReport,
}

pub struct WorkItemCreator<'a, S: ?Sized> {
    store: &'a S,
    project: &'a str,
    iteration_path: String,
}

impl<'a, S> WorkItemCreator<'a, S>
where
    S: WorkItemStore + ?Sized,
{
    /// `iteration` is the iteration name inside `project`, e.g. `Sprint 3`.
    pub fn new(store: &'a S, project: &'a str, iteration: &str) -> Self {
        Self {
            store,
            project,
            iteration_path: format!("{}\\{}", project, iteration),
        }
    }

    pub fn iteration_path(&self) -> &str {
        &self.iteration_path
    }

    /// Create every pending node of `tree`, writing assigned ids back in place.
    ///
    /// Stops at the first failure. Ids assigned before it stay in `tree`.
    pub async fn create_all(&self, tree: &mut ImportTree) -> Result<CreationReport, CreationError> {
        let mut walk = Walk::default();

        for node in tree.nodes.iter_mut() {
            match node {
                TreeNode::Feature(Feature {
                    state,
                    title,
                    parent_id,
                    user_stories,
                }) => {
                    let parent = *parent_id;
                    let title: &str = title;
                    let id = self
                        .visit(&mut walk, state, WorkItemKind::Feature, title, || {
                            self.document(WorkItemKind::Feature, title, parent)
                        })
                        .await?;
                    for story in user_stories.iter_mut() {
                        self.create_story(&mut walk, story, Some(id)).await?;
                    }
                }
                TreeNode::UserStory(story) => {
                    let parent = story.parent_id;
                    self.create_story(&mut walk, story, parent).await?;
                }
            }
        }

        tracing::info!(
            "Created {} work items, skipped {} already present",
            walk.report.created,
            walk.report.skipped
        );
        Ok(walk.report)
    }

    async fn create_story(
        &self,
        walk: &mut Walk,
        story: &mut UserStory,
        parent: Option<WorkItemId>,
    ) -> Result<(), CreationError> {
        let UserStory {
            ref mut state,
            ref title,
            ref mut tasks,
            ..
        } = *story;
        let story_id = self
            .visit(walk, state, WorkItemKind::UserStory, title, || {
                self.document(WorkItemKind::UserStory, title, parent)
            })
            .await?;

        for task in tasks.iter_mut() {
            let Task {
                ref mut state,
                ref title,
                estimate,
                remaining,
                ref assigned_to,
                ref tags,
            } = *task;
            self.visit(walk, state, WorkItemKind::Task, title, || {
                let doc = self
                    .document(WorkItemKind::Task, title, Some(story_id))
                    .field(FIELD_ASSIGNED_TO, assigned_to.as_str())
                    .field(FIELD_ORIGINAL_ESTIMATE, estimate)
                    .field(FIELD_REMAINING_WORK, remaining);
                match tags {
                    Some(tags) => doc.field(FIELD_TAGS, tags.as_str()),
                    None => doc,
                }
            })
            .await?;
        }
        Ok(())
    }

    /// Fields every created item carries, plus the parent link when known.
    fn document(
        &self,
        kind: WorkItemKind,
        title: &str,
        parent: Option<WorkItemId>,
    ) -> PatchDocument {
        let doc = PatchDocument::new()
            .field(FIELD_TITLE, title)
            .field(FIELD_WORK_ITEM_TYPE, kind.type_name())
            .field(FIELD_STATE, "New")
            .field(FIELD_ITERATION_PATH, self.iteration_path.as_str());
        match parent {
            Some(id) => doc.parent_link(&self.store.work_item_url(self.project, id)),
            None => doc,
        }
    }

    /// Create one node unless it already has an id. Returns the node's id.
    async fn visit(
        &self,
        walk: &mut Walk,
        state: &mut ItemState,
        kind: WorkItemKind,
        title: &str,
        document: impl FnOnce() -> PatchDocument,
    ) -> Result<WorkItemId, CreationError> {
        let position = walk.position;
        walk.position += 1;

        if let ItemState::Created(id) = *state {
            walk.report.skipped += 1;
            return Ok(id);
        }

        let id = self
            .store
            .create_work_item(self.project, kind, &document())
            .await
            .map_err(|source| {
                tracing::error!("Creating {} '{}' failed: {}", kind, title, source);
                CreationError {
                    kind,
                    title: title.to_string(),
                    position,
                    source,
                }
            })?;

        *state = ItemState::Created(id);
        walk.report.created += 1;
        tracing::info!("Created {} #{} '{}'", kind, id, title);
        Ok(id)
    }
}
