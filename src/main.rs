use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use labflow_config::WorkflowDef;
use labflow_device::{CallLog, SimulatedController, SimulatedManipulator};
use labflow_engine::{BackendError, EngineConfig, ExecutionBackend, WorkflowRunner};
use labflow_workflow::Workflow;

/// Labflow - runs lab automation workflows on a liquid handler and its
/// auxiliary controller
#[derive(Parser)]
#[command(name = "labflow")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a workflow against simulated devices
  Run {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// Directory holding custom labware definitions
    #[arg(long, env = "LABFLOW_LABWARE_DIR", default_value = "labware")]
    labware_dir: PathBuf,

    /// Serial port of the auxiliary controller
    #[arg(long, default_value = "COM3")]
    controller_port: String,

    /// Run without an auxiliary controller
    #[arg(long)]
    no_controller: bool,

    /// Try an unreachable remote backend first, then fall back to in-process
    #[arg(long)]
    backend_unavailable: bool,
  },

  /// Print a summary of a workflow without running it
  Inspect {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },
}

fn main() -> Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("labflow=info,warn")),
    )
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Run {
      workflow_file,
      labware_dir,
      controller_port,
      no_controller,
      backend_unavailable,
    }) => {
      let options = RunOptions {
        labware_dir,
        controller_port: (!no_controller).then_some(controller_port),
        backend_unavailable,
      };
      run_workflow(workflow_file, options)
    }
    Some(Commands::Inspect { workflow_file }) => {
      inspect_workflow(&workflow_file)?;
      Ok(ExitCode::SUCCESS)
    }
    None => {
      println!("labflow - use --help to see available commands");
      Ok(ExitCode::SUCCESS)
    }
  }
}

struct RunOptions {
  labware_dir: PathBuf,
  controller_port: Option<String>,
  backend_unavailable: bool,
}

fn run_workflow(workflow_file: PathBuf, options: RunOptions) -> Result<ExitCode> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_workflow_async(workflow_file, options).await })
}

async fn run_workflow_async(workflow_file: PathBuf, options: RunOptions) -> Result<ExitCode> {
  let workflow = load_workflow(&workflow_file).await?;
  eprintln!(
    "Loaded workflow with {} nodes and {} edges",
    workflow.nodes().len(),
    workflow.edges().len()
  );

  let log = CallLog::new();
  let address = workflow.global_config().hardware.ot2.ip.clone();
  let manipulator = SimulatedManipulator::new(address, log.clone());

  let config = EngineConfig {
    labware_dir: options.labware_dir,
    ..Default::default()
  };

  let mut runner = WorkflowRunner::new(workflow, Box::new(manipulator), config);
  if let Some(port) = options.controller_port {
    runner = runner.with_controller(Box::new(SimulatedController::new(port, log.clone())));
  }
  if options.backend_unavailable {
    runner = runner.with_backend(Box::new(UnreachableBackend));
  }

  let success = runner.execute().await;
  eprintln!("Device calls issued: {}", log.len());

  if success {
    eprintln!("Workflow completed");
    Ok(ExitCode::SUCCESS)
  } else {
    eprintln!("Workflow failed");
    Ok(ExitCode::FAILURE)
  }
}

fn inspect_workflow(workflow_file: &Path) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  let workflow = rt.block_on(load_workflow(workflow_file))?;

  let graph = workflow.graph();
  let labware: Vec<serde_json::Value> = workflow
    .global_config()
    .labware
    .iter()
    .map(|entry| {
      serde_json::json!({
        "name": entry.name,
        "type": entry.decl.labware_type,
        "slot": entry.decl.slot,
      })
    })
    .collect();

  let summary = serde_json::json!({
    "robot_ip": workflow.global_config().hardware.ot2.ip,
    "labware": labware,
    "pipette": workflow.global_config().instruments.pipette,
    "nodes": workflow.nodes().len(),
    "edges": workflow.edges().len(),
    "roots": graph.roots(),
    "dangling": graph.dangling(),
    "validation_error": workflow.validate().err().map(|e| e.to_string()),
  });

  println!("{}", serde_json::to_string_pretty(&summary)?);
  Ok(())
}

async fn load_workflow(workflow_file: &Path) -> Result<Workflow> {
  let content = tokio::fs::read_to_string(workflow_file)
    .await
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  let def = WorkflowDef::from_json(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;

  let workflow = Workflow::from_def(def).context("failed to index workflow")?;
  info!(
    nodes = workflow.nodes().len(),
    roots = workflow.roots().len(),
    "workflow loaded"
  );
  Ok(workflow)
}

/// Stands in for a remote orchestrator that cannot be reached.
struct UnreachableBackend;

#[async_trait]
impl ExecutionBackend for UnreachableBackend {
  fn name(&self) -> &str {
    "remote"
  }

  async fn execute(&self, _workflow: &Workflow) -> Result<bool, BackendError> {
    Err(BackendError::Unavailable {
      name: self.name().to_string(),
      message: "no orchestrator reachable".to_string(),
    })
  }
}
