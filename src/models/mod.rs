//! Domain models for backlog imports.
//!
//! # Core Concepts
//!
//! ## Transient
//!
//! - [`Row`]: One validated spreadsheet line. Produced by the sheet parser and
//!   consumed once by the hierarchy builder.
//!
//! ## Import Tree
//!
//! - [`ImportTree`]: Ordered top-level sequence of [`Feature`]s and [`UserStory`]s.
//! - [`Task`]: Leaf work unit, owned by exactly one [`UserStory`].
//! - [`ItemState`]: Whether a node still has to be created remotely or already
//!   carries the identifier the remote system assigned to it.
//!
//! ## Remote
//!
//! - [`ProjectInfo`], [`Iteration`], [`WorkItem`]: Payloads returned by Azure DevOps.

mod remote;
mod row;
mod work_item;

pub use remote::*;
pub use row::*;
pub use work_item::*;
