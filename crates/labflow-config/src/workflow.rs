use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::global::GlobalConfig;
use crate::node::NodeDef;

/// A workflow document as loaded from disk.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowDef {
  #[serde(default)]
  pub global_config: GlobalConfig,
  #[serde(default)]
  pub nodes: Vec<NodeDef>,
  #[serde(default)]
  pub edges: Vec<Edge>,
}

impl WorkflowDef {
  /// Parse a workflow document from JSON text.
  pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(content)
  }
}
