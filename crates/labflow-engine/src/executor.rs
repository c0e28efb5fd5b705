//! Graph traversal.

use labflow_config::NodeDef;
use labflow_workflow::Workflow;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::dispatcher::{ActionDispatcher, ActionOutcome};
use crate::error::ExecutionError;
use crate::events::{ExecutionEvent, ExecutionNotifier};

/// Counts gathered during traversal.
///
/// Informational only: a run's verdict never depends on these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalReport {
  /// Node executions, counting a node once per path that reached it.
  pub nodes_visited: usize,
  pub actions_completed: usize,
  pub actions_skipped: usize,
  pub actions_failed: usize,
  pub dangling_references: usize,
}

/// Walks the workflow graph depth-first from each root.
///
/// Each node runs its manipulator actions in order, then its controller
/// directive, then each child in edge order. Traversal is not memoized, so a
/// node reached along several paths runs once per path.
pub struct GraphExecutor<'a> {
  dispatcher: &'a ActionDispatcher<'a>,
  notifier: &'a dyn ExecutionNotifier,
  execution_id: &'a str,
}

impl<'a> GraphExecutor<'a> {
  pub fn new(
    dispatcher: &'a ActionDispatcher<'a>,
    notifier: &'a dyn ExecutionNotifier,
    execution_id: &'a str,
  ) -> Self {
    Self {
      dispatcher,
      notifier,
      execution_id,
    }
  }

  /// Traverse the whole workflow.
  ///
  /// Fails only when the graph cannot be traversed (no roots, or a cycle);
  /// in that case no device call is issued.
  #[instrument(
    name = "graph_execute",
    skip(self, workflow),
    fields(execution_id = %self.execution_id)
  )]
  pub async fn run(&self, workflow: &Workflow) -> Result<TraversalReport, ExecutionError> {
    if let Err(e) = workflow.validate() {
      error!(error = %e, "workflow graph cannot be traversed");
      return Err(e.into());
    }

    let mut report = TraversalReport::default();
    for root in workflow.roots() {
      info!(node_id = %root, "starting from root node");
      self.walk(workflow, root, &mut report).await;
    }

    info!(
      nodes_visited = report.nodes_visited,
      actions_completed = report.actions_completed,
      actions_skipped = report.actions_skipped,
      actions_failed = report.actions_failed,
      dangling_references = report.dangling_references,
      "traversal finished"
    );
    Ok(report)
  }

  /// Depth-first walk from `root`, with an explicit stack in place of
  /// recursion. Children are pushed in reverse so they pop in edge order.
  async fn walk(&self, workflow: &Workflow, root: &str, report: &mut TraversalReport) {
    let mut stack: Vec<(Option<&str>, &str)> = vec![(None, root)];

    while let Some((parent, node_id)) = stack.pop() {
      let Some(node) = workflow.get_node(node_id) else {
        let parent_id = parent.unwrap_or_default();
        error!(node_id, parent_id, "node not found in the workflow");
        report.dangling_references += 1;
        self.notifier.notify(ExecutionEvent::DanglingReference {
          execution_id: self.execution_id.to_string(),
          parent_id: parent_id.to_string(),
          node_id: node_id.to_string(),
        });
        continue;
      };

      self.execute_node(node, report).await;

      for child in workflow.graph().children(node_id).iter().rev() {
        stack.push((Some(node_id), child.as_str()));
      }
    }
  }

  async fn execute_node(&self, node: &NodeDef, report: &mut TraversalReport) {
    info!(node_id = %node.id, label = %node.label, "node_started");
    report.nodes_visited += 1;
    self.notifier.notify(ExecutionEvent::NodeStarted {
      execution_id: self.execution_id.to_string(),
      node_id: node.id.clone(),
    });

    for entry in &node.params.ot2_actions {
      let outcome = self.dispatcher.dispatch(entry).await;
      let action = entry.tag().unwrap_or("<missing>");
      self.record(node, action, outcome, report);
    }

    if let Some(directive) = node.params.directive() {
      let outcome = self.dispatcher.dispatch_directive(directive).await;
      self.record(node, "arduino_control", outcome, report);
    }
  }

  fn record(&self, node: &NodeDef, action: &str, outcome: ActionOutcome, report: &mut TraversalReport) {
    match outcome {
      ActionOutcome::Completed => report.actions_completed += 1,
      ActionOutcome::Skipped { reason } => {
        warn!(node_id = %node.id, action, reason = %reason, "action skipped");
        report.actions_skipped += 1;
        self.notifier.notify(ExecutionEvent::ActionSkipped {
          execution_id: self.execution_id.to_string(),
          node_id: node.id.clone(),
          action: action.to_string(),
          reason,
        });
      }
      ActionOutcome::Failed { reason } => {
        warn!(node_id = %node.id, action, reason = %reason, "action failed, continuing");
        report.actions_failed += 1;
        self.notifier.notify(ExecutionEvent::ActionFailed {
          execution_id: self.execution_id.to_string(),
          node_id: node.id.clone(),
          action: action.to_string(),
          reason,
        });
      }
    }
  }
}
