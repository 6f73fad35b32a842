//! Work item creator tests against an in-memory store.

use std::sync::Mutex;

use async_trait::async_trait;
use backlog_import::client::*;
use backlog_import::creator::{CreationReport, WorkItemCreator};
use backlog_import::models::*;
use serde_json::json;

/// Hands out ids from `next_id` upwards and remembers every call.
/// The call with index `fail_at` (0-based) returns a server error.
struct RecordingStore {
    next_id: Mutex<u64>,
    fail_at: Option<usize>,
    calls: Mutex<Vec<(WorkItemKind, PatchDocument)>>,
}

impl RecordingStore {
    fn starting_at(first_id: u64) -> Self {
        Self {
            next_id: Mutex::new(first_id),
            fail_at: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing_at(first_id: u64, call: usize) -> Self {
        Self {
            fail_at: Some(call),
            ..Self::starting_at(first_id)
        }
    }

    fn calls(&self) -> Vec<(WorkItemKind, PatchDocument)> {
        self.calls.lock().unwrap().clone()
    }

    fn titles(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|(_, doc)| {
                let title = doc.field_value(FIELD_TITLE).unwrap();
                title.as_str().unwrap().to_string()
            })
            .collect()
    }
}

#[async_trait]
impl WorkItemStore for RecordingStore {
    fn work_item_url(&self, project: &str, id: WorkItemId) -> String {
        format!("https://dev.azure.com/acme/{}/_apis/wit/workitems/{}", project, id)
    }

    async fn create_work_item(
        &self,
        _project: &str,
        kind: WorkItemKind,
        document: &PatchDocument,
    ) -> Result<WorkItemId, ClientError> {
        let mut calls = self.calls.lock().unwrap();
        if self.fail_at == Some(calls.len()) {
            return Err(ClientError::Server(
                "500 Internal Server Error: boom".to_string(),
            ));
        }
        calls.push((kind, document.clone()));
        let mut next = self.next_id.lock().unwrap();
        let id = WorkItemId(*next);
        *next += 1;
        Ok(id)
    }
}

fn tree_of(nodes: Vec<TreeNode>) -> ImportTree {
    ImportTree { nodes }
}

fn counts(created: usize, skipped: usize) -> CreationReport {
    CreationReport { created, skipped }
}

fn login_signup_tree() -> ImportTree {
    let mut login = UserStory::new("Login");
    login.tasks.push(Task::new("Build form", 4.0, "ana"));
    tree_of(vec![
        TreeNode::UserStory(login),
        TreeNode::UserStory(UserStory::new("Signup")),
    ])
}

fn story_at(tree: &ImportTree, index: usize) -> &UserStory {
    match &tree.nodes[index] {
        TreeNode::UserStory(story) => story,
        other => panic!("expected a user story, got {:?}", other),
    }
}

fn link_to(id: u64) -> String {
    format!("https://dev.azure.com/acme/Shop/_apis/wit/workitems/{}", id)
}

mod create_all {
    use super::*;

    #[tokio::test]
    async fn creates_parents_before_children_and_links_them() {
        let store = RecordingStore::starting_at(101);
        let creator = WorkItemCreator::new(&store, "Shop", "Sprint 1");
        let mut tree = login_signup_tree();

        let report = creator.create_all(&mut tree).await.expect("creation failed");

        assert_eq!(report, counts(3, 0));
        let login = story_at(&tree, 0);
        assert_eq!(login.state, ItemState::Created(WorkItemId(101)));
        assert_eq!(login.tasks[0].state, ItemState::Created(WorkItemId(102)));
        assert_eq!(story_at(&tree, 1).state, ItemState::Created(WorkItemId(103)));

        let calls = store.calls();
        let kinds: Vec<_> = calls.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(
            kinds,
            vec![WorkItemKind::UserStory, WorkItemKind::Task, WorkItemKind::UserStory]
        );
        assert_eq!(calls[0].1.parent_url(), None);
        assert_eq!(calls[1].1.parent_url(), Some(link_to(101).as_str()));
        assert_eq!(calls[2].1.parent_url(), None);
    }

    #[tokio::test]
    async fn fills_in_the_common_fields() {
        let store = RecordingStore::starting_at(1);
        let creator = WorkItemCreator::new(&store, "Shop", "Sprint 1");
        let mut tree = login_signup_tree();

        creator.create_all(&mut tree).await.expect("creation failed");

        let story = &store.calls()[0].1;
        assert_eq!(story.field_value(FIELD_TITLE), Some(&json!("Login")));
        assert_eq!(
            story.field_value(FIELD_WORK_ITEM_TYPE),
            Some(&json!("User Story"))
        );
        assert_eq!(story.field_value(FIELD_STATE), Some(&json!("New")));
        assert_eq!(
            story.field_value(FIELD_ITERATION_PATH),
            Some(&json!("Shop\\Sprint 1"))
        );
        assert_eq!(story.field_value(FIELD_ASSIGNED_TO), None);
    }

    #[tokio::test]
    async fn sends_task_scheduling_fields() {
        let store = RecordingStore::starting_at(1);
        let creator = WorkItemCreator::new(&store, "Shop", "Sprint 1");
        let mut story = UserStory::new("Login");
        story
            .tasks
            .push(Task::new("Build form", 4.0, "ana").with_tags(Some("ui".into())));
        story.tasks.push(Task::new("Review", 0.5, "rui"));
        let mut tree = tree_of(vec![TreeNode::UserStory(story)]);

        creator.create_all(&mut tree).await.expect("creation failed");

        let calls = store.calls();
        let form = &calls[1].1;
        assert_eq!(form.field_value(FIELD_WORK_ITEM_TYPE), Some(&json!("Task")));
        assert_eq!(form.field_value(FIELD_ASSIGNED_TO), Some(&json!("ana")));
        assert_eq!(form.field_value(FIELD_ORIGINAL_ESTIMATE), Some(&json!(4.0)));
        assert_eq!(form.field_value(FIELD_REMAINING_WORK), Some(&json!(4.0)));
        assert_eq!(form.field_value(FIELD_TAGS), Some(&json!("ui")));
        let review = &calls[2].1;
        assert_eq!(review.field_value(FIELD_TAGS), None);
        assert_eq!(review.parent_url(), Some(link_to(1).as_str()));
    }

    #[tokio::test]
    async fn nested_stories_link_to_their_feature() {
        let store = RecordingStore::starting_at(10);
        let creator = WorkItemCreator::new(&store, "Shop", "Sprint 1");
        let mut feature = Feature::new("Checkout");
        feature.parent_id = Some(WorkItemId(5));
        let mut card = UserStory::new("Pay by card");
        card.tasks.push(Task::new("Card form", 3.0, "ana"));
        feature.user_stories.push(card);
        feature.user_stories.push(UserStory::new("Pay by invoice"));
        let mut tree = tree_of(vec![TreeNode::Feature(feature)]);

        creator.create_all(&mut tree).await.expect("creation failed");

        let calls = store.calls();
        assert_eq!(
            store.titles(),
            vec!["Checkout", "Pay by card", "Card form", "Pay by invoice"]
        );
        assert_eq!(calls[0].0, WorkItemKind::Feature);
        assert_eq!(calls[0].1.parent_url(), Some(link_to(5).as_str()));
        assert_eq!(calls[1].1.parent_url(), Some(link_to(10).as_str()));
        assert_eq!(calls[2].1.parent_url(), Some(link_to(11).as_str()));
        assert_eq!(calls[3].1.parent_url(), Some(link_to(10).as_str()));
    }

    #[tokio::test]
    async fn top_level_stories_link_to_their_parent_id() {
        let store = RecordingStore::starting_at(1);
        let creator = WorkItemCreator::new(&store, "Shop", "Sprint 1");
        let mut story = UserStory::new("Login");
        story.parent_id = Some(WorkItemId(40));
        let mut tree = tree_of(vec![TreeNode::UserStory(story)]);

        creator.create_all(&mut tree).await.expect("creation failed");

        assert_eq!(store.calls()[0].1.parent_url(), Some(link_to(40).as_str()));
    }
}

mod resuming {
    use super::*;

    #[tokio::test]
    async fn a_fully_created_tree_issues_no_calls() {
        let store = RecordingStore::starting_at(101);
        let creator = WorkItemCreator::new(&store, "Shop", "Sprint 1");
        let mut tree = login_signup_tree();
        creator.create_all(&mut tree).await.expect("creation failed");
        let created = tree.clone();

        let second = RecordingStore::starting_at(500);
        let report = WorkItemCreator::new(&second, "Shop", "Sprint 1")
            .create_all(&mut tree)
            .await
            .expect("creation failed");

        assert!(second.calls().is_empty());
        assert_eq!(report, counts(0, 3));
        assert_eq!(tree, created);
    }

    #[tokio::test]
    async fn tasks_of_an_existing_story_link_to_it() {
        let store = RecordingStore::starting_at(1);
        let creator = WorkItemCreator::new(&store, "Shop", "Sprint 1");
        let mut legacy = UserStory::existing(WorkItemId(812), "Legacy login");
        legacy.tasks.push(Task::new("Fix redirect", 1.0, "rui"));
        let mut tree = tree_of(vec![TreeNode::UserStory(legacy)]);

        let report = creator.create_all(&mut tree).await.expect("creation failed");

        assert_eq!(report, counts(1, 1));
        let calls = store.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, WorkItemKind::Task);
        assert_eq!(calls[0].1.parent_url(), Some(link_to(812).as_str()));
    }

    #[tokio::test]
    async fn a_failure_stops_the_walk_and_keeps_earlier_ids() {
        // Calls: Login(0), Build form(1), Signup(2) fails.
        let store = RecordingStore::failing_at(101, 2);
        let creator = WorkItemCreator::new(&store, "Shop", "Sprint 1");
        let mut tree = login_signup_tree();
        story_at_mut(&mut tree, 1)
            .tasks
            .push(Task::new("Signup form", 2.0, "ana"));

        let err = creator
            .create_all(&mut tree)
            .await
            .expect_err("expected a failure");

        assert_eq!(err.kind, WorkItemKind::UserStory);
        assert_eq!(err.title, "Signup");
        assert_eq!(err.position, 2);
        assert!(matches!(err.source, ClientError::Server(_)));
        assert_eq!(store.titles(), vec!["Login", "Build form"]);

        let login = story_at(&tree, 0);
        assert_eq!(login.state, ItemState::Created(WorkItemId(101)));
        assert_eq!(login.tasks[0].state, ItemState::Created(WorkItemId(102)));
        let signup = story_at(&tree, 1);
        assert_eq!(signup.state, ItemState::Pending);
        assert_eq!(signup.tasks[0].state, ItemState::Pending);
        assert_eq!(tree.pending(), 2);
    }

    #[tokio::test]
    async fn a_second_run_resumes_at_the_first_pending_node() {
        let failing = RecordingStore::failing_at(101, 2);
        let mut tree = login_signup_tree();
        WorkItemCreator::new(&failing, "Shop", "Sprint 1")
            .create_all(&mut tree)
            .await
            .expect_err("expected a failure");

        let store = RecordingStore::starting_at(103);
        let report = WorkItemCreator::new(&store, "Shop", "Sprint 1")
            .create_all(&mut tree)
            .await
            .expect("creation failed");

        assert_eq!(report, counts(1, 2));
        assert_eq!(store.titles(), vec!["Signup"]);
        assert_eq!(story_at(&tree, 1).state, ItemState::Created(WorkItemId(103)));
    }
}

fn story_at_mut(tree: &mut ImportTree, index: usize) -> &mut UserStory {
    match &mut tree.nodes[index] {
        TreeNode::UserStory(story) => story,
        _ => panic!("expected a user story"),
    }
}
