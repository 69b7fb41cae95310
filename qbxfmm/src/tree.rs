//! Views of an externally constructed spatial tree, and the sparse adjacency data used to traverse it.
pub mod adjacency;
pub mod constants;
pub mod helpers;
pub mod types;

pub use adjacency::CsrList;
pub use types::{reorder_values, BoxTree, PointSet};
