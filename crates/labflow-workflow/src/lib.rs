//! Labflow Workflow
//!
//! The indexed form of a workflow document, ready for traversal.
//!
//! Key differences from `labflow-config`:
//! - Nodes are indexed by id (ids must be unique)
//! - The children index preserves edge order, which is sibling order
//! - Root nodes, dangling edge references and cycles are identified

mod error;
mod graph;
mod workflow;

pub use error::WorkflowError;
pub use graph::{DanglingEdge, DanglingEnd, Graph};
pub use workflow::Workflow;
