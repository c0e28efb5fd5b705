//! Workflow run control.
//!
//! The `WorkflowRunner` owns one workflow and the devices it runs against.
//! It decides the run's verdict: connect, set up labware, traverse, and
//! optionally hand the whole run to an alternate backend first.

use std::fmt;

use async_trait::async_trait;
use labflow_device::{Controller, Manipulator};
use labflow_labware::{FsLabwareDefinitions, LabwareRegistry};
use labflow_workflow::Workflow;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::dispatcher::ActionDispatcher;
use crate::error::{BackendError, RunError};
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::executor::{GraphExecutor, TraversalReport};

/// An alternate place to execute a whole run (a remote orchestrator, a
/// scheduler).
///
/// `Ok(verdict)` is final. `Err` means the backend could not take the run,
/// and the runner executes it in-process instead.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
  fn name(&self) -> &str;

  async fn execute(&self, workflow: &Workflow) -> Result<bool, BackendError>;
}

/// Summary of a completed in-process run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
  pub execution_id: String,
  /// False when the controller failed to connect and the run continued
  /// without it.
  pub controller_connected: bool,
  pub traversal: TraversalReport,
}

/// Runs one workflow against a manipulator and an optional controller.
///
/// # Usage
///
/// ```ignore
/// let runner = WorkflowRunner::new(workflow, Box::new(manipulator), EngineConfig::default())
///   .with_controller(Box::new(controller));
///
/// if !runner.execute().await {
///   std::process::exit(1);
/// }
/// ```
pub struct WorkflowRunner<N: ExecutionNotifier = NoopNotifier> {
  workflow: Workflow,
  manipulator: Box<dyn Manipulator>,
  controller: Option<Box<dyn Controller>>,
  backend: Option<Box<dyn ExecutionBackend>>,
  config: EngineConfig,
  notifier: N,
}

impl WorkflowRunner<NoopNotifier> {
  pub fn new(workflow: Workflow, manipulator: Box<dyn Manipulator>, config: EngineConfig) -> Self {
    Self {
      workflow,
      manipulator,
      controller: None,
      backend: None,
      config,
      notifier: NoopNotifier,
    }
  }
}

impl<N: ExecutionNotifier> WorkflowRunner<N> {
  pub fn with_controller(mut self, controller: Box<dyn Controller>) -> Self {
    self.controller = Some(controller);
    self
  }

  pub fn with_backend(mut self, backend: Box<dyn ExecutionBackend>) -> Self {
    self.backend = Some(backend);
    self
  }

  /// Replace the notifier that receives execution events.
  pub fn with_notifier<M: ExecutionNotifier>(self, notifier: M) -> WorkflowRunner<M> {
    WorkflowRunner {
      workflow: self.workflow,
      manipulator: self.manipulator,
      controller: self.controller,
      backend: self.backend,
      config: self.config,
      notifier,
    }
  }

  /// Execute the workflow and return the success verdict.
  ///
  /// With a backend configured, the backend runs first. A backend error
  /// falls back to one in-process run.
  pub async fn execute(&self) -> bool {
    if let Some(backend) = &self.backend {
      match backend.execute(&self.workflow).await {
        Ok(verdict) => {
          info!(backend = %backend.name(), verdict, "backend run finished");
          return verdict;
        }
        Err(e) => {
          warn!(
            backend = %backend.name(),
            error = %e,
            "backend run failed, falling back to in-process execution"
          );
        }
      }
    }

    self.run().await.is_ok()
  }

  /// Run the workflow in-process.
  ///
  /// Fatal: a graph that cannot be traversed, a manipulator that does not
  /// connect, a pipette that does not load. A controller that does not
  /// connect only disables controller-dependent actions.
  #[instrument(name = "workflow_run", skip(self), fields(execution_id = tracing::field::Empty))]
  pub async fn run(&self) -> Result<RunReport, RunError> {
    let execution_id = Uuid::new_v4().to_string();
    tracing::Span::current().record("execution_id", execution_id.as_str());

    info!(
      nodes = self.workflow.nodes().len(),
      edges = self.workflow.edges().len(),
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::RunStarted {
      execution_id: execution_id.clone(),
    });

    match self.run_inner(&execution_id).await {
      Ok(report) => {
        info!(
          nodes_visited = report.traversal.nodes_visited,
          actions_skipped = report.traversal.actions_skipped,
          actions_failed = report.traversal.actions_failed,
          "workflow_completed"
        );
        self.notifier.notify(ExecutionEvent::RunCompleted {
          execution_id,
          report: report.traversal.clone(),
        });
        Ok(report)
      }
      Err(e) => {
        error!(error = %e, "workflow_failed");
        self.notifier.notify(ExecutionEvent::RunFailed {
          execution_id,
          error: e.to_string(),
        });
        Err(e)
      }
    }
  }

  async fn run_inner(&self, execution_id: &str) -> Result<RunReport, RunError> {
    // Reject untraversable graphs before touching any device.
    self.workflow.validate()?;

    self
      .manipulator
      .connect()
      .await
      .map_err(RunError::ManipulatorConnect)?;
    info!("manipulator connected");

    let controller = self.connect_controller().await;

    let definitions = FsLabwareDefinitions::new(&self.config.labware_dir);
    let registry = LabwareRegistry::new(self.manipulator.as_ref(), &definitions)
      .with_standard_prefix(self.config.standard_labware_prefix.clone());

    let global = self.workflow.global_config();
    let bindings = registry.register(&global.labware).await;
    registry
      .setup_pipette(global.instruments.pipette.as_ref())
      .await?;

    self.prepare_manipulator().await;

    let dispatcher = ActionDispatcher::new(
      self.manipulator.as_ref(),
      controller,
      &bindings,
      &self.config.dispatch,
    );
    let executor = GraphExecutor::new(&dispatcher, &self.notifier, execution_id);
    let traversal = executor.run(&self.workflow).await?;

    Ok(RunReport {
      execution_id: execution_id.to_string(),
      controller_connected: controller.is_some(),
      traversal,
    })
  }

  async fn connect_controller(&self) -> Option<&dyn Controller> {
    let Some(controller) = self.controller.as_deref() else {
      warn!("no controller configured, controller actions will be skipped");
      return None;
    };

    match controller.connect().await {
      Ok(()) => {
        info!("controller connected");
        Some(controller)
      }
      Err(e) => {
        warn!(error = %e, "controller connection failed, continuing without it");
        None
      }
    }
  }

  /// Lights on, then home. Neither failure stops the run.
  async fn prepare_manipulator(&self) {
    if let Err(e) = self.manipulator.set_lights(true).await {
      warn!(error = %e, "failed to turn on lights");
    }
    if let Err(e) = self.manipulator.home().await {
      warn!(error = %e, "failed to home manipulator");
    }
  }
}

impl<N: ExecutionNotifier> fmt::Debug for WorkflowRunner<N> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("WorkflowRunner")
      .field("nodes", &self.workflow.nodes().len())
      .field("has_controller", &self.controller.is_some())
      .field("backend", &self.backend.as_ref().map(|b| b.name()))
      .field("config", &self.config)
      .finish()
  }
}
