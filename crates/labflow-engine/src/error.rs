//! Error types for workflow execution.

use labflow_device::DeviceError;
use labflow_labware::LabwareError;
use labflow_workflow::WorkflowError;
use thiserror::Error;

/// Errors that stop graph traversal before it starts.
#[derive(Debug, Error)]
pub enum ExecutionError {
  /// Workflow graph is invalid.
  #[error("invalid workflow graph: {0}")]
  InvalidGraph(#[from] WorkflowError),
}

/// Fatal conditions of a workflow run.
#[derive(Debug, Error)]
pub enum RunError {
  #[error("workflow rejected: {0}")]
  Workflow(#[from] WorkflowError),

  #[error("failed to connect to manipulator: {0}")]
  ManipulatorConnect(#[source] DeviceError),

  #[error("labware setup failed: {0}")]
  Setup(#[from] LabwareError),

  #[error("graph execution failed: {0}")]
  Execution(#[from] ExecutionError),
}

/// Errors reported by an alternate execution backend.
#[derive(Debug, Error)]
pub enum BackendError {
  #[error("backend '{name}' is unavailable: {message}")]
  Unavailable { name: String, message: String },
}
