//! Integration tests for labware registration against a simulated manipulator.

use labflow_config::{LabwareEntry, PipetteDecl};
use labflow_device::{CallLog, DeviceCall, Operation, SimulatedManipulator};
use labflow_labware::{FsLabwareDefinitions, LabwareError, LabwareRegistry, synthetic_id};

fn definitions_dir() -> tempfile::TempDir {
  let dir = tempfile::tempdir().expect("failed to create temp dir");
  std::fs::write(
    dir.path().join("nis_reactor_v2.json"),
    r#"{ "metadata": { "name": "NIS Reactor" }, "wells": {} }"#,
  )
  .expect("failed to write definition");
  std::fs::write(dir.path().join("broken_rack.json"), "{ \"metadata\": ").expect("failed to write definition");
  dir
}

fn pipette() -> PipetteDecl {
  PipetteDecl {
    pipette_type: "p1000_single_gen2".to_string(),
    mount: "right".to_string(),
  }
}

#[tokio::test]
async fn test_standard_and_custom_labware_bind_device_ids() {
  let dir = definitions_dir();
  let definitions = FsLabwareDefinitions::new(dir.path());
  let log = CallLog::new();
  let manipulator = SimulatedManipulator::new("sim", log.clone());
  let registry = LabwareRegistry::new(&manipulator, &definitions);

  let bindings = registry
    .register(&[
      LabwareEntry::new("tips", "opentrons_96_tiprack_1000ul", 1),
      LabwareEntry::new("reactor", "nis_reactor_v2", 4),
    ])
    .await;

  assert_eq!(bindings.resolve("tips"), Some("sim-1-opentrons_96_tiprack_1000ul"));
  assert_eq!(bindings.resolve("reactor"), Some("sim-4-NIS Reactor"));
  assert_eq!(
    log.calls(),
    vec![
      DeviceCall::LoadStandardLabware {
        slot: 1,
        load_name: "opentrons_96_tiprack_1000ul".to_string(),
      },
      DeviceCall::LoadCustomLabware {
        slot: 4,
        name: "NIS Reactor".to_string(),
      },
    ]
  );
}

#[tokio::test]
async fn test_missing_definition_binds_synthetic_id() {
  let dir = definitions_dir();
  let definitions = FsLabwareDefinitions::new(dir.path());
  let log = CallLog::new();
  let manipulator = SimulatedManipulator::new("sim", log.clone());
  let registry = LabwareRegistry::new(&manipulator, &definitions);

  let bindings = registry
    .register(&[LabwareEntry::new("vials", "vial_rack_2x4", 7)])
    .await;

  assert_eq!(bindings.resolve("vials"), Some("vial_rack_2x4_7"));
  assert_eq!(bindings.resolve("vials"), Some(synthetic_id("vial_rack_2x4", 7).as_str()));
  assert!(log.is_empty());
}

#[tokio::test]
async fn test_malformed_definition_binds_synthetic_id() {
  let dir = definitions_dir();
  let definitions = FsLabwareDefinitions::new(dir.path());
  let manipulator = SimulatedManipulator::new("sim", CallLog::new());
  let registry = LabwareRegistry::new(&manipulator, &definitions);

  let bindings = registry
    .register(&[LabwareEntry::new("rack", "broken_rack", 2)])
    .await;

  assert_eq!(bindings.resolve("rack"), Some("broken_rack_2"));
}

#[tokio::test]
async fn test_device_error_binds_synthetic_id_and_continues() {
  let dir = definitions_dir();
  let definitions = FsLabwareDefinitions::new(dir.path());
  let log = CallLog::new();
  let manipulator =
    SimulatedManipulator::new("sim", log.clone()).failing(Operation::LoadStandardLabware);
  let registry = LabwareRegistry::new(&manipulator, &definitions);

  let bindings = registry
    .register(&[
      LabwareEntry::new("tips", "opentrons_96_tiprack_1000ul", 1),
      LabwareEntry::new("reactor", "nis_reactor_v2", 4),
    ])
    .await;

  assert_eq!(bindings.resolve("tips"), Some("opentrons_96_tiprack_1000ul_1"));
  assert_eq!(bindings.resolve("reactor"), Some("sim-4-NIS Reactor"));
  assert_eq!(
    log.operations(),
    vec![Operation::LoadStandardLabware, Operation::LoadCustomLabware]
  );
}

#[tokio::test]
async fn test_blank_device_id_binds_synthetic_id() {
  let dir = definitions_dir();
  let definitions = FsLabwareDefinitions::new(dir.path());
  let manipulator = SimulatedManipulator::new("sim", CallLog::new()).with_fixed_labware_id("");
  let registry = LabwareRegistry::new(&manipulator, &definitions);

  let bindings = registry
    .register(&[LabwareEntry::new("trash", "opentrons_1_trash_1100ml_fixed", 12)])
    .await;

  assert_eq!(bindings.resolve("trash"), Some("opentrons_1_trash_1100ml_fixed_12"));
}

#[tokio::test]
async fn test_whitespace_device_id_is_kept() {
  let dir = definitions_dir();
  let definitions = FsLabwareDefinitions::new(dir.path());
  let manipulator = SimulatedManipulator::new("sim", CallLog::new()).with_fixed_labware_id(" ");
  let registry = LabwareRegistry::new(&manipulator, &definitions);

  let bindings = registry
    .register(&[LabwareEntry::new("plate", "opentrons_x", 3)])
    .await;

  assert_eq!(bindings.resolve("plate"), Some(" "));
}

#[tokio::test]
async fn test_custom_prefix_selects_catalog() {
  let dir = definitions_dir();
  let definitions = FsLabwareDefinitions::new(dir.path());
  let log = CallLog::new();
  let manipulator = SimulatedManipulator::new("sim", log.clone());
  let registry = LabwareRegistry::new(&manipulator, &definitions).with_standard_prefix("corning_");

  registry
    .register(&[LabwareEntry::new("plate", "corning_96_wellplate_360ul_flat", 2)])
    .await;

  assert_eq!(log.operations(), vec![Operation::LoadStandardLabware]);
}

#[tokio::test]
async fn test_pipette_load() {
  let dir = definitions_dir();
  let definitions = FsLabwareDefinitions::new(dir.path());
  let log = CallLog::new();
  let manipulator = SimulatedManipulator::new("sim", log.clone());
  let registry = LabwareRegistry::new(&manipulator, &definitions);

  registry.setup_pipette(Some(&pipette())).await.unwrap();

  assert_eq!(
    log.calls(),
    vec![DeviceCall::LoadPipette {
      pipette: "p1000_single_gen2".to_string(),
      mount: "right".to_string(),
    }]
  );
}

#[tokio::test]
async fn test_pipette_failure_is_fatal() {
  let dir = definitions_dir();
  let definitions = FsLabwareDefinitions::new(dir.path());
  let manipulator = SimulatedManipulator::new("sim", CallLog::new()).failing(Operation::LoadPipette);
  let registry = LabwareRegistry::new(&manipulator, &definitions);

  let err = registry.setup_pipette(Some(&pipette())).await.unwrap_err();
  assert!(matches!(err, LabwareError::PipetteLoad { .. }));

  let err = registry.setup_pipette(None).await.unwrap_err();
  assert!(matches!(err, LabwareError::MissingPipette));
}
