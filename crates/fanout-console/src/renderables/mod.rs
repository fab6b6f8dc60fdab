//! Harness-specific renderables.
//!
//! - Raw statement results as tables
//! - Object graph summaries as trees

pub mod query_results;
pub mod tree;

pub use query_results::QueryResults;
pub use tree::TreeNode;
