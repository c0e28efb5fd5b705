use serde::{Deserialize, Serialize};

/// Directed dependency: `target` runs after `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
  pub source: String,
  pub target: String,
}

impl Edge {
  pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
    Self {
      source: source.into(),
      target: target.into(),
    }
  }
}
