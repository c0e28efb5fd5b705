use std::collections::HashMap;

use labflow_config::{Edge, GlobalConfig, NodeDef, WorkflowDef};
use tracing::warn;

use crate::error::WorkflowError;
use crate::graph::{DanglingEnd, Graph};

/// A loaded workflow with its node index and graph.
///
/// Immutable for the duration of a run. Nodes stay owned by the workflow;
/// the index and graph refer to them by id.
#[derive(Debug, Clone)]
pub struct Workflow {
  def: WorkflowDef,
  index: HashMap<String, usize>,
  graph: Graph,
}

impl Workflow {
  /// Index a workflow document.
  ///
  /// Dangling edge references are logged here and skipped during traversal;
  /// only duplicate node ids are rejected. Call [`Workflow::validate`] before
  /// issuing any device command.
  pub fn from_def(def: WorkflowDef) -> Result<Self, WorkflowError> {
    let mut index = HashMap::with_capacity(def.nodes.len());
    for (position, node) in def.nodes.iter().enumerate() {
      if index.insert(node.id.clone(), position).is_some() {
        return Err(WorkflowError::DuplicateNode(node.id.clone()));
      }
    }

    let graph = Graph::new(def.nodes.iter().map(|n| n.id.as_str()), &def.edges);

    for dangling in graph.dangling() {
      let missing = match dangling.missing {
        DanglingEnd::Source => dangling.source.as_str(),
        DanglingEnd::Target | DanglingEnd::Both => dangling.target.as_str(),
      };
      warn!(
        source = %dangling.source,
        target = %dangling.target,
        missing_node = %missing,
        "edge references unknown node"
      );
    }

    Ok(Self { def, index, graph })
  }

  /// Check that the graph can be traversed: at least one root, no cycles.
  pub fn validate(&self) -> Result<(), WorkflowError> {
    if self.graph.roots().is_empty() {
      return Err(WorkflowError::NoEntryPoints);
    }
    if let Some(path) = self.graph.find_cycle() {
      return Err(WorkflowError::Cycle { path });
    }
    Ok(())
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&NodeDef> {
    self.index.get(node_id).map(|&i| &self.def.nodes[i])
  }

  pub fn nodes(&self) -> &[NodeDef] {
    &self.def.nodes
  }

  pub fn edges(&self) -> &[Edge] {
    &self.def.edges
  }

  pub fn global_config(&self) -> &GlobalConfig {
    &self.def.global_config
  }

  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  pub fn roots(&self) -> &[String] {
    self.graph.roots()
  }
}
