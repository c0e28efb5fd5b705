use std::collections::{HashMap, HashSet};

use labflow_config::Edge;
use serde::Serialize;

/// Which end of an edge names a node that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingEnd {
  Source,
  Target,
  Both,
}

/// An edge that references at least one unknown node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingEdge {
  pub source: String,
  pub target: String,
  pub missing: DanglingEnd,
}

/// Graph structure for traversal and analysis.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Node ids in declaration order.
  nodes: Vec<String>,
  known: HashSet<String>,
  /// node_id -> downstream node_ids, in edge order.
  children: HashMap<String, Vec<String>>,
  /// Nodes that are never the target of an edge, in declaration order.
  roots: Vec<String>,
  dangling: Vec<DanglingEdge>,
}

impl Graph {
  /// Build a graph from node ids (in declaration order) and edges.
  ///
  /// Edges are kept even when they reference unknown nodes: the target still
  /// counts as having an incoming edge, and a missing child is reported when
  /// traversal reaches it.
  pub fn new<'a>(node_ids: impl IntoIterator<Item = &'a str>, edges: &[Edge]) -> Self {
    let nodes: Vec<String> = node_ids.into_iter().map(str::to_string).collect();
    let known: HashSet<String> = nodes.iter().cloned().collect();

    let mut children: HashMap<String, Vec<String>> = HashMap::new();
    let mut targeted: HashSet<&str> = HashSet::new();
    let mut dangling = Vec::new();

    for edge in edges {
      children
        .entry(edge.source.clone())
        .or_default()
        .push(edge.target.clone());
      targeted.insert(edge.target.as_str());

      let missing = match (known.contains(&edge.source), known.contains(&edge.target)) {
        (true, true) => None,
        (false, true) => Some(DanglingEnd::Source),
        (true, false) => Some(DanglingEnd::Target),
        (false, false) => Some(DanglingEnd::Both),
      };
      if let Some(missing) = missing {
        dangling.push(DanglingEdge {
          source: edge.source.clone(),
          target: edge.target.clone(),
          missing,
        });
      }
    }

    let roots = nodes
      .iter()
      .filter(|id| !targeted.contains(id.as_str()))
      .cloned()
      .collect();

    Self {
      nodes,
      known,
      children,
      roots,
      dangling,
    }
  }

  /// Get entry points (nodes with no incoming edges).
  pub fn roots(&self) -> &[String] {
    &self.roots
  }

  /// Get downstream nodes for a given node, in edge order.
  pub fn children(&self, node_id: &str) -> &[String] {
    self
      .children
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Edges that reference unknown nodes.
  pub fn dangling(&self) -> &[DanglingEdge] {
    &self.dangling
  }

  /// Find a cycle among known nodes.
  ///
  /// Returns the path around the cycle, starting and ending at the same node.
  pub fn find_cycle(&self) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
      Visiting,
      Done,
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();

    for start in &self.nodes {
      if marks.contains_key(start.as_str()) {
        continue;
      }

      marks.insert(start.as_str(), Mark::Visiting);
      let mut stack: Vec<(&str, usize)> = vec![(start.as_str(), 0)];

      while let Some(top) = stack.last_mut() {
        let (node, next) = *top;
        top.1 += 1;

        let Some(child) = self.children(node).get(next) else {
          marks.insert(node, Mark::Done);
          stack.pop();
          continue;
        };

        let child = child.as_str();
        if !self.known.contains(child) {
          continue;
        }

        match marks.get(child) {
          Some(Mark::Visiting) => {
            let from = stack.iter().position(|(id, _)| *id == child).unwrap_or(0);
            let mut path: Vec<String> = stack[from..].iter().map(|(id, _)| id.to_string()).collect();
            path.push(child.to_string());
            return Some(path);
          }
          Some(Mark::Done) => {}
          None => {
            marks.insert(child, Mark::Visiting);
            stack.push((child, 0));
          }
        }
      }
    }

    None
  }
}
