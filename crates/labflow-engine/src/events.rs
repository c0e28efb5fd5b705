//! Execution events and notifiers for observability.
//!
//! Skipped and failed steps never change a run's verdict; they are only
//! visible in the log and through these events.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::executor::TraversalReport;

/// Events emitted during a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// The in-process run has started.
  RunStarted { execution_id: String },

  /// Traversal reached a node.
  NodeStarted {
    execution_id: String,
    node_id: String,
  },

  /// An action was not attempted (unresolved labware, missing controller,
  /// unrecognized action).
  ActionSkipped {
    execution_id: String,
    node_id: String,
    action: String,
    reason: String,
  },

  /// A device call failed; traversal continued.
  ActionFailed {
    execution_id: String,
    node_id: String,
    action: String,
    reason: String,
  },

  /// An edge pointed at a node that does not exist; that branch was abandoned.
  DanglingReference {
    execution_id: String,
    parent_id: String,
    node_id: String,
  },

  /// The run finished; skipped and failed actions are counted in the report.
  RunCompleted {
    execution_id: String,
    report: TraversalReport,
  },

  /// The run stopped on a fatal condition.
  RunFailed { execution_id: String, error: String },
}

/// Trait for receiving execution events.
///
/// The engine calls `notify` for each event; implementations decide what to
/// do with them (persist, stream, ignore).
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
///
/// Event volume is a handful per node, so an unbounded channel never holds
/// the run back behind a slow consumer.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
