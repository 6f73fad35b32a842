//! ASCII tree rendering for import previews.

use crate::models::{ImportTree, ItemState, Task, TreeNode, UserStory};

const PENDING: char = '◇';
const CREATED: char = '●';

/// Get the status symbol for a node state.
fn state_symbol(state: ItemState) -> char {
    match state {
        ItemState::Pending => PENDING,
        ItemState::Created(_) => CREATED,
    }
}

fn label(state: ItemState, kind: &str, title: &str) -> String {
    match state {
        ItemState::Pending => format!("{} {} {}", state_symbol(state), kind, title),
        ItemState::Created(id) => format!("{} {} #{} {}", state_symbol(state), kind, id, title),
    }
}

fn task_label(task: &Task) -> String {
    let mut text = format!(
        "{} ({}h, {})",
        label(task.state, "Task", &task.title),
        task.estimate,
        task.assigned_to
    );
    if let Some(ref tags) = task.tags {
        text.push_str(&format!(" [{}]", tags));
    }
    text
}

/// Render an import tree with status symbols.
///
/// Example output:
/// ```text
/// ◇ Feature Checkout
/// └── ◇ User Story Pay by card
///     └── ◇ Task Card form (4h, ana)
/// ● User Story #812 Legacy login
/// └── ◇ Task Fix redirect (1h, rui)
/// ```
pub fn render_tree(tree: &ImportTree) -> String {
    let mut output = String::new();
    for node in &tree.nodes {
        match node {
            TreeNode::Feature(feature) => {
                output.push_str(&label(feature.state, "Feature", &feature.title));
                output.push('\n');
                for (i, story) in feature.user_stories.iter().enumerate() {
                    let is_last = i == feature.user_stories.len() - 1;
                    render_story(&mut output, story, "", Some(is_last));
                }
            }
            TreeNode::UserStory(story) => render_story(&mut output, story, "", None),
        }
    }
    output
}

/// Render a story and its tasks. `is_last` is `None` for top-level stories.
fn render_story(output: &mut String, story: &UserStory, prefix: &str, is_last: Option<bool>) {
    let child_prefix = match is_last {
        None => {
            output.push_str(&label(story.state, "User Story", &story.title));
            output.push('\n');
            prefix.to_string()
        }
        Some(is_last) => {
            let branch = if is_last { "└── " } else { "├── " };
            output.push_str(prefix);
            output.push_str(branch);
            output.push_str(&label(story.state, "User Story", &story.title));
            output.push('\n');
            let continuation = if is_last { "    " } else { "│   " };
            format!("{}{}", prefix, continuation)
        }
    };

    for (i, task) in story.tasks.iter().enumerate() {
        let branch = if i == story.tasks.len() - 1 { "└── " } else { "├── " };
        output.push_str(&child_prefix);
        output.push_str(branch);
        output.push_str(&task_label(task));
        output.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Feature, WorkItemId};

    #[test]
    fn test_single_story() {
        let tree = ImportTree {
            nodes: vec![TreeNode::UserStory(UserStory::new("Login"))],
        };
        assert_eq!(render_tree(&tree), "◇ User Story Login\n");
    }

    #[test]
    fn test_story_with_tasks() {
        let mut story = UserStory::existing(WorkItemId(101), "Login");
        story.tasks.push(Task::new("Build form", 4.0, "ana"));
        story
            .tasks
            .push(Task::new("Wire API", 2.5, "rui").with_tags(Some("backend".into())));
        let tree = ImportTree {
            nodes: vec![TreeNode::UserStory(story)],
        };

        assert_eq!(
            render_tree(&tree),
            concat!(
                "● User Story #101 Login\n",
                "├── ◇ Task Build form (4h, ana)\n",
                "└── ◇ Task Wire API (2.5h, rui) [backend]\n",
            )
        );
    }

    #[test]
    fn test_nested_feature() {
        let mut first = UserStory::new("Pay by card");
        first.tasks.push(Task::new("Card form", 4.0, "ana"));
        let mut feature = Feature::new("Checkout");
        feature.user_stories.push(first);
        feature.user_stories.push(UserStory::new("Pay by invoice"));
        let tree = ImportTree {
            nodes: vec![TreeNode::Feature(feature)],
        };

        let expected = concat!(
            "◇ Feature Checkout\n",
            "├── ◇ User Story Pay by card\n",
            "│   └── ◇ Task Card form (4h, ana)\n",
            "└── ◇ User Story Pay by invoice\n",
        );
        assert_eq!(render_tree(&tree), expected);
    }
}
