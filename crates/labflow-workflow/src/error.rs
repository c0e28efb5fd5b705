use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("duplicate node id: {0}")]
  DuplicateNode(String),

  #[error("no entry points found (all nodes have incoming edges)")]
  NoEntryPoints,

  #[error("workflow graph contains a cycle: {}", path.join(" -> "))]
  Cycle { path: Vec<String> },
}
