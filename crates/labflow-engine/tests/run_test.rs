//! End-to-end runs against simulated devices.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use labflow_config::WorkflowDef;
use labflow_device::{
  CallLog, DeviceCall, OffsetStart, Operation, SimulatedController, SimulatedManipulator, WellOffset,
  WellSite,
};
use labflow_engine::{
  BackendError, ChannelNotifier, EngineConfig, ExecutionBackend, ExecutionEvent, RunError,
  WorkflowRunner,
};
use labflow_workflow::Workflow;
use serde_json::{Value, json};
use tokio::sync::mpsc;

fn document() -> Value {
  json!({
    "global_config": {
      "hardware": { "ot2": { "ip": "10.0.0.5" } },
      "labware": {
        "tips": { "type": "opentrons_96_tiprack_1000ul", "slot": 1 },
        "reactor": { "type": "nis_reactor_v2", "slot": 4 }
      },
      "instruments": { "pipette": { "type": "p1000_single_gen2", "mount": "right" } }
    },
    "nodes": [
      { "id": "A", "label": "Home", "params": { "ot2_actions": [{ "action": "home" }] } },
      {
        "id": "B",
        "label": "Tip",
        "params": {
          "ot2_actions": [{
            "action": "pick_up_tip",
            "labware": "tips",
            "well": "A1",
            "offset": { "x": 0.5, "y": -0.5, "z": 2.0 }
          }]
        }
      },
      { "id": "C", "label": "Dose", "params": { "arduino_control": { "pump0_ml": 5 } } }
    ],
    "edges": [
      { "source": "A", "target": "B" },
      { "source": "B", "target": "C" }
    ]
  })
}

fn workflow(doc: Value) -> Workflow {
  let def: WorkflowDef = serde_json::from_value(doc).unwrap();
  Workflow::from_def(def).unwrap()
}

fn labware_dir() -> tempfile::TempDir {
  let dir = tempfile::tempdir().unwrap();
  std::fs::write(
    dir.path().join("nis_reactor_v2.json"),
    json!({ "metadata": { "name": "NIS Reactor" }, "wells": {} }).to_string(),
  )
  .unwrap();
  dir
}

fn config(dir: &tempfile::TempDir) -> EngineConfig {
  EngineConfig {
    labware_dir: dir.path().to_path_buf(),
    ..Default::default()
  }
}

struct Devices {
  log: CallLog,
  manipulator: SimulatedManipulator,
  controller: SimulatedController,
}

impl Devices {
  fn new() -> Self {
    let log = CallLog::new();
    Self {
      manipulator: SimulatedManipulator::new("10.0.0.5", log.clone()),
      controller: SimulatedController::new("COM3", log.clone()),
      log,
    }
  }
}

fn tip_site() -> WellSite {
  WellSite::new("sim-1-opentrons_96_tiprack_1000ul", "A1", "p1000_single_gen2")
}

#[tokio::test]
async fn test_linear_workflow_issues_setup_then_node_calls() {
  let dir = labware_dir();
  let devices = Devices::new();
  let log = devices.log.clone();
  let runner = WorkflowRunner::new(workflow(document()), Box::new(devices.manipulator), config(&dir))
    .with_controller(Box::new(devices.controller));

  let report = runner.run().await.unwrap();

  assert!(report.controller_connected);
  assert_eq!(report.traversal.nodes_visited, 3);
  assert_eq!(report.traversal.actions_completed, 3);
  assert_eq!(
    log.calls(),
    vec![
      DeviceCall::ConnectManipulator {
        address: "10.0.0.5".to_string(),
      },
      DeviceCall::ConnectController {
        port: "COM3".to_string(),
      },
      DeviceCall::LoadStandardLabware {
        slot: 1,
        load_name: "opentrons_96_tiprack_1000ul".to_string(),
      },
      DeviceCall::LoadCustomLabware {
        slot: 4,
        name: "NIS Reactor".to_string(),
      },
      DeviceCall::LoadPipette {
        pipette: "p1000_single_gen2".to_string(),
        mount: "right".to_string(),
      },
      DeviceCall::SetLights { on: true },
      DeviceCall::Home,
      // A
      DeviceCall::Home,
      // B
      DeviceCall::MoveToWell {
        site: tip_site(),
        start: OffsetStart::Top,
        offset: WellOffset::new(0.5, -0.5, 2.0),
        speed: 100,
      },
      DeviceCall::PickUpTip {
        site: tip_site(),
        offset_x: 0.5,
        offset_y: -0.5,
      },
      // C
      DeviceCall::DispenseVolume {
        pump: 0,
        volume_ml: 5.0,
      },
    ]
  );
}

#[tokio::test]
async fn test_wash_node_and_dangling_edge() {
  let dir = labware_dir();
  let mut doc = document();
  doc["nodes"][2]["params"] = json!({
    "ot2_actions": [{ "action": "wash", "arduino_actions": { "pump0_ml": 5 } }]
  });
  doc["edges"]
    .as_array_mut()
    .unwrap()
    .push(json!({ "source": "B", "target": "X" }));
  let devices = Devices::new();
  let log = devices.log.clone();
  let runner = WorkflowRunner::new(workflow(doc), Box::new(devices.manipulator), config(&dir))
    .with_controller(Box::new(devices.controller));

  let report = runner.run().await.unwrap();

  assert_eq!(report.traversal.nodes_visited, 3);
  assert_eq!(report.traversal.dangling_references, 1);
  assert_eq!(report.traversal.actions_completed, 3);
  let calls = log.calls();
  let node_calls = &calls[calls.len() - 4..];
  assert_eq!(
    node_calls,
    &[
      DeviceCall::Home,
      DeviceCall::MoveToWell {
        site: tip_site(),
        start: OffsetStart::Top,
        offset: WellOffset::new(0.5, -0.5, 2.0),
        speed: 100,
      },
      DeviceCall::PickUpTip {
        site: tip_site(),
        offset_x: 0.5,
        offset_y: -0.5,
      },
      DeviceCall::DispenseVolume {
        pump: 0,
        volume_ml: 5.0,
      },
    ]
  );
}

#[tokio::test]
async fn test_execute_returns_true_despite_skips() {
  let dir = labware_dir();
  let mut doc = document();
  doc["nodes"][1]["params"]["ot2_actions"][0]["labware"] = json!("missing_rack");
  doc["nodes"][0]["params"]["ot2_actions"]
    .as_array_mut()
    .unwrap()
    .push(json!({ "action": "centrifuge" }));
  let devices = Devices::new();

  let runner = WorkflowRunner::new(workflow(doc), Box::new(devices.manipulator), config(&dir))
    .with_controller(Box::new(devices.controller));

  assert!(runner.execute().await);
  assert!(
    !devices
      .log
      .operations()
      .contains(&Operation::PickUpTip)
  );
}

#[tokio::test]
async fn test_no_roots_fails_before_any_device_call() {
  let dir = labware_dir();
  let mut doc = document();
  doc["edges"]
    .as_array_mut()
    .unwrap()
    .push(json!({ "source": "C", "target": "A" }));
  let devices = Devices::new();

  let runner = WorkflowRunner::new(workflow(doc), Box::new(devices.manipulator), config(&dir))
    .with_controller(Box::new(devices.controller));

  assert!(!runner.execute().await);
  assert!(devices.log.is_empty());
}

#[tokio::test]
async fn test_cycle_fails_before_any_device_call() {
  let dir = labware_dir();
  let mut doc = document();
  doc["edges"]
    .as_array_mut()
    .unwrap()
    .push(json!({ "source": "C", "target": "B" }));
  let devices = Devices::new();

  let runner = WorkflowRunner::new(workflow(doc), Box::new(devices.manipulator), config(&dir));

  let err = runner.run().await.unwrap_err();
  assert!(matches!(err, RunError::Workflow(_)));
  assert!(devices.log.is_empty());
}

#[tokio::test]
async fn test_controller_connect_failure_degrades() {
  let dir = labware_dir();
  let devices = Devices::new();
  let controller = devices.controller.failing(Operation::Connect);

  let runner = WorkflowRunner::new(workflow(document()), Box::new(devices.manipulator), config(&dir))
    .with_controller(Box::new(controller));

  let report = runner.run().await.unwrap();

  assert!(!report.controller_connected);
  assert_eq!(report.traversal.actions_skipped, 1);
  assert!(
    !devices
      .log
      .operations()
      .contains(&Operation::DispenseVolume)
  );
  assert!(devices.log.operations().contains(&Operation::PickUpTip));
}

#[tokio::test]
async fn test_manipulator_connect_failure_is_fatal() {
  let dir = labware_dir();
  let devices = Devices::new();
  let manipulator = devices.manipulator.failing(Operation::Connect);

  let runner = WorkflowRunner::new(workflow(document()), Box::new(manipulator), config(&dir))
    .with_controller(Box::new(devices.controller));

  let err = runner.run().await.unwrap_err();
  assert!(matches!(err, RunError::ManipulatorConnect(_)));
  assert_eq!(devices.log.operations(), vec![Operation::Connect]);
}

#[tokio::test]
async fn test_pipette_failure_is_fatal() {
  let dir = labware_dir();
  let devices = Devices::new();
  let manipulator = devices.manipulator.failing(Operation::LoadPipette);

  let runner = WorkflowRunner::new(workflow(document()), Box::new(manipulator), config(&dir))
    .with_controller(Box::new(devices.controller));

  assert!(!runner.execute().await);
  let operations = devices.log.operations();
  assert!(!operations.contains(&Operation::Home));
  assert!(!operations.contains(&Operation::MoveToWell));
}

#[tokio::test]
async fn test_missing_custom_definition_binds_synthetic_id() {
  let dir = tempfile::tempdir().unwrap();
  let mut doc = document();
  doc["nodes"][1]["params"]["ot2_actions"][0] = json!({
    "action": "move_to",
    "labware": "reactor",
    "well": "B2"
  });
  let devices = Devices::new();

  let runner = WorkflowRunner::new(workflow(doc), Box::new(devices.manipulator), config(&dir))
    .with_controller(Box::new(devices.controller));

  runner.run().await.unwrap();

  let moved_to: Vec<String> = devices
    .log
    .calls()
    .into_iter()
    .filter_map(|call| match call {
      DeviceCall::MoveToWell { site, .. } => Some(site.labware_id),
      _ => None,
    })
    .collect();
  assert_eq!(moved_to, vec!["nis_reactor_v2_4"]);
}

#[tokio::test]
async fn test_events_follow_the_run() {
  let dir = labware_dir();
  let devices = Devices::new();
  let (tx, mut rx) = mpsc::unbounded_channel();

  let runner = WorkflowRunner::new(workflow(document()), Box::new(devices.manipulator), config(&dir))
    .with_notifier(ChannelNotifier::new(tx));

  let report = runner.run().await.unwrap();

  let mut events = Vec::new();
  while let Ok(event) = rx.try_recv() {
    events.push(event);
  }

  assert_eq!(
    events.first(),
    Some(&ExecutionEvent::RunStarted {
      execution_id: report.execution_id.clone(),
    })
  );
  let started: Vec<&str> = events
    .iter()
    .filter_map(|e| match e {
      ExecutionEvent::NodeStarted { node_id, .. } => Some(node_id.as_str()),
      _ => None,
    })
    .collect();
  assert_eq!(started, vec!["A", "B", "C"]);
  assert!(events.iter().any(|e| matches!(
    e,
    ExecutionEvent::ActionSkipped { node_id, action, .. } if node_id == "C" && action == "arduino_control"
  )));
  assert_eq!(
    events.last(),
    Some(&ExecutionEvent::RunCompleted {
      execution_id: report.execution_id.clone(),
      report: report.traversal.clone(),
    })
  );
}

struct FixedBackend {
  calls: Arc<AtomicUsize>,
  result: fn() -> Result<bool, BackendError>,
}

#[async_trait]
impl ExecutionBackend for FixedBackend {
  fn name(&self) -> &str {
    "fixed"
  }

  async fn execute(&self, _workflow: &Workflow) -> Result<bool, BackendError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    (self.result)()
  }
}

#[tokio::test]
async fn test_backend_verdict_is_final() {
  let dir = labware_dir();
  let devices = Devices::new();
  let calls = Arc::new(AtomicUsize::new(0));
  let backend = FixedBackend {
    calls: calls.clone(),
    result: || Ok(false),
  };

  let runner = WorkflowRunner::new(workflow(document()), Box::new(devices.manipulator), config(&dir))
    .with_controller(Box::new(devices.controller))
    .with_backend(Box::new(backend));

  assert!(!runner.execute().await);
  assert_eq!(calls.load(Ordering::SeqCst), 1);
  assert!(devices.log.is_empty());
}

#[tokio::test]
async fn test_backend_error_falls_back_once() {
  let dir = labware_dir();
  let devices = Devices::new();
  let calls = Arc::new(AtomicUsize::new(0));
  let backend = FixedBackend {
    calls: calls.clone(),
    result: || {
      Err(BackendError::Unavailable {
        name: "fixed".to_string(),
        message: "connection refused".to_string(),
      })
    },
  };

  let runner = WorkflowRunner::new(workflow(document()), Box::new(devices.manipulator), config(&dir))
    .with_controller(Box::new(devices.controller))
    .with_backend(Box::new(backend));

  assert!(runner.execute().await);
  assert_eq!(calls.load(Ordering::SeqCst), 1);
  let connects = devices
    .log
    .calls()
    .into_iter()
    .filter(|call| matches!(call, DeviceCall::ConnectManipulator { .. }))
    .count();
  assert_eq!(connects, 1);
}
