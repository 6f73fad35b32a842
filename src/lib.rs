//! Import a spreadsheet work breakdown into Azure DevOps.
//!
//! The pipeline has three stages, each with its own error type:
//!
//! 1. [`sheet`] decodes and validates the spreadsheet into [`models::Row`]s.
//! 2. [`hierarchy`] folds the rows into an [`models::ImportTree`].
//! 3. [`creator`] creates the tree's pending nodes, parents first.
//!
//! [`pipeline`] chains them; [`client`] talks to the REST API.

pub mod client;
pub mod config;
pub mod creator;
pub mod error;
pub mod hierarchy;
pub mod models;
pub mod pipeline;
pub mod sheet;
pub mod tree_render;
