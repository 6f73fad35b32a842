//! End-to-end import: sheet bytes to a tree, tree to remote work items.

use crate::client::{WorkItemLookup, WorkItemStore};
use crate::creator::{CreationReport, WorkItemCreator};
use crate::error::ImportError;
use crate::hierarchy::HierarchyBuilder;
use crate::models::ImportTree;
use crate::sheet::{self, SheetFormat};

/// Project and iteration every created item is filed under.
#[derive(Debug, Clone)]
pub struct ImportTarget {
    pub project: String,
    pub iteration: String,
}

/// Parse and validate a sheet, then build its hierarchy.
///
/// Validation errors stop here, before any remote call is made.
pub async fn load_tree<L>(
    bytes: Vec<u8>,
    format: SheetFormat,
    project: &str,
    lookup: &L,
) -> Result<ImportTree, ImportError>
where
    L: WorkItemLookup + ?Sized,
{
    let rows = sheet::read_rows(bytes, format)?;
    let tree = HierarchyBuilder::new(project, lookup).build(rows).await?;
    Ok(tree)
}

/// Create every pending node of `tree` under `target`.
pub async fn create_tree<S>(
    tree: &mut ImportTree,
    target: &ImportTarget,
    store: &S,
) -> Result<CreationReport, ImportError>
where
    S: WorkItemStore + ?Sized,
{
    let creator = WorkItemCreator::new(store, &target.project, &target.iteration);
    tracing::info!(
        "Creating {} pending work items in {}",
        tree.pending(),
        creator.iteration_path()
    );
    Ok(creator.create_all(tree).await?)
}
