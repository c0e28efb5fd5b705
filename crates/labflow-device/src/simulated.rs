//! Simulated devices.
//!
//! Used for dry runs without hardware and as test doubles. Both devices can
//! share one [`CallLog`], which then holds the exact order in which the
//! engine issued commands across the two devices.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::controller::Controller;
use crate::error::DeviceError;
use crate::manipulator::{Manipulator, OffsetStart, WellOffset, WellSite};

/// Device operation kinds, used to pick which calls a simulated device fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
  Connect,
  SetLights,
  Home,
  LoadStandardLabware,
  LoadCustomLabware,
  LoadPipette,
  MoveToWell,
  PickUpTip,
  DropTip,
  Aspirate,
  Dispense,
  Blowout,
  SetTemperature,
  DispenseVolume,
  RunAgitationTimer,
}

impl Operation {
  pub fn as_str(self) -> &'static str {
    match self {
      Operation::Connect => "connect",
      Operation::SetLights => "set_lights",
      Operation::Home => "home",
      Operation::LoadStandardLabware => "load_standard_labware",
      Operation::LoadCustomLabware => "load_custom_labware",
      Operation::LoadPipette => "load_pipette",
      Operation::MoveToWell => "move_to_well",
      Operation::PickUpTip => "pick_up_tip",
      Operation::DropTip => "drop_tip",
      Operation::Aspirate => "aspirate",
      Operation::Dispense => "dispense",
      Operation::Blowout => "blowout",
      Operation::SetTemperature => "set_temperature",
      Operation::DispenseVolume => "dispense_volume",
      Operation::RunAgitationTimer => "run_agitation_timer",
    }
  }
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A command as received by a simulated device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum DeviceCall {
  ConnectManipulator {
    address: String,
  },
  SetLights {
    on: bool,
  },
  Home,
  LoadStandardLabware {
    slot: u32,
    load_name: String,
  },
  LoadCustomLabware {
    slot: u32,
    name: String,
  },
  LoadPipette {
    pipette: String,
    mount: String,
  },
  MoveToWell {
    site: WellSite,
    start: OffsetStart,
    offset: WellOffset,
    speed: u32,
  },
  PickUpTip {
    site: WellSite,
    offset_x: f64,
    offset_y: f64,
  },
  DropTip {
    site: WellSite,
    start: OffsetStart,
    offset: WellOffset,
  },
  Aspirate {
    site: WellSite,
    volume_ul: f64,
    start: OffsetStart,
    offset: WellOffset,
  },
  Dispense {
    site: WellSite,
    volume_ul: f64,
    start: OffsetStart,
    offset: WellOffset,
  },
  Blowout {
    site: WellSite,
    start: OffsetStart,
    offset: WellOffset,
  },
  ConnectController {
    port: String,
  },
  SetTemperature {
    base: u8,
    celsius: f64,
  },
  DispenseVolume {
    pump: u8,
    volume_ml: f64,
  },
  RunAgitationTimer {
    base: u8,
    duration_ms: u64,
  },
}

impl DeviceCall {
  pub fn operation(&self) -> Operation {
    match self {
      DeviceCall::ConnectManipulator { .. } | DeviceCall::ConnectController { .. } => {
        Operation::Connect
      }
      DeviceCall::SetLights { .. } => Operation::SetLights,
      DeviceCall::Home => Operation::Home,
      DeviceCall::LoadStandardLabware { .. } => Operation::LoadStandardLabware,
      DeviceCall::LoadCustomLabware { .. } => Operation::LoadCustomLabware,
      DeviceCall::LoadPipette { .. } => Operation::LoadPipette,
      DeviceCall::MoveToWell { .. } => Operation::MoveToWell,
      DeviceCall::PickUpTip { .. } => Operation::PickUpTip,
      DeviceCall::DropTip { .. } => Operation::DropTip,
      DeviceCall::Aspirate { .. } => Operation::Aspirate,
      DeviceCall::Dispense { .. } => Operation::Dispense,
      DeviceCall::Blowout { .. } => Operation::Blowout,
      DeviceCall::SetTemperature { .. } => Operation::SetTemperature,
      DeviceCall::DispenseVolume { .. } => Operation::DispenseVolume,
      DeviceCall::RunAgitationTimer { .. } => Operation::RunAgitationTimer,
    }
  }
}

/// Shared, ordered record of device calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
  calls: Arc<Mutex<Vec<DeviceCall>>>,
}

impl CallLog {
  pub fn new() -> Self {
    Self::default()
  }

  fn record(&self, call: DeviceCall) {
    self
      .calls
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(call);
  }

  /// Snapshot of every call so far, in issue order.
  pub fn calls(&self) -> Vec<DeviceCall> {
    self
      .calls
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn operations(&self) -> Vec<Operation> {
    self.calls().iter().map(DeviceCall::operation).collect()
  }

  pub fn len(&self) -> usize {
    self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Fails the listed operations after recording them.
#[derive(Debug, Clone, Default)]
struct FailurePlan {
  operations: HashSet<Operation>,
}

impl FailurePlan {
  fn check(&self, operation: Operation) -> Result<(), DeviceError> {
    if self.operations.contains(&operation) {
      return Err(DeviceError::command(operation.as_str(), "simulated failure"));
    }
    Ok(())
  }
}

/// A manipulator that logs and records commands instead of moving.
#[derive(Debug, Clone)]
pub struct SimulatedManipulator {
  address: String,
  log: CallLog,
  failures: FailurePlan,
  fixed_labware_id: Option<String>,
}

impl SimulatedManipulator {
  pub fn new(address: impl Into<String>, log: CallLog) -> Self {
    Self {
      address: address.into(),
      log,
      failures: FailurePlan::default(),
      fixed_labware_id: None,
    }
  }

  /// Fail every call of the given kind.
  pub fn failing(mut self, operation: Operation) -> Self {
    self.failures.operations.insert(operation);
    self
  }

  /// Answer every labware load with `id`, e.g. an empty id as a
  /// misbehaving robot might return.
  pub fn with_fixed_labware_id(mut self, id: impl Into<String>) -> Self {
    self.fixed_labware_id = Some(id.into());
    self
  }

  pub fn log(&self) -> &CallLog {
    &self.log
  }

  fn issue(&self, call: DeviceCall) -> Result<(), DeviceError> {
    let operation = call.operation();
    self.log.record(call);
    self.failures.check(operation)
  }

  fn labware_id(&self, name: &str, slot: u32) -> String {
    match &self.fixed_labware_id {
      Some(id) => id.clone(),
      None => format!("sim-{}-{}", slot, name),
    }
  }
}

#[async_trait]
impl Manipulator for SimulatedManipulator {
  async fn connect(&self) -> Result<(), DeviceError> {
    info!(address = %self.address, "simulated manipulator connecting");
    self
      .issue(DeviceCall::ConnectManipulator {
        address: self.address.clone(),
      })
      .map_err(|e| DeviceError::Connection {
        device: "manipulator".to_string(),
        address: self.address.clone(),
        message: e.to_string(),
      })
  }

  async fn set_lights(&self, on: bool) -> Result<(), DeviceError> {
    info!(on, "simulated manipulator lights");
    self.issue(DeviceCall::SetLights { on })
  }

  async fn home(&self) -> Result<(), DeviceError> {
    info!("simulated manipulator homing");
    self.issue(DeviceCall::Home)
  }

  async fn load_standard_labware(&self, slot: u32, load_name: &str) -> Result<String, DeviceError> {
    info!(slot, load_name, "simulated labware load");
    self.issue(DeviceCall::LoadStandardLabware {
      slot,
      load_name: load_name.to_string(),
    })?;
    Ok(self.labware_id(load_name, slot))
  }

  async fn load_custom_labware(
    &self,
    definition: &serde_json::Value,
    slot: u32,
  ) -> Result<String, DeviceError> {
    let name = definition
      .pointer("/metadata/name")
      .and_then(|v| v.as_str())
      .unwrap_or("custom_labware")
      .to_string();
    info!(slot, name = %name, "simulated custom labware load");
    self.issue(DeviceCall::LoadCustomLabware {
      slot,
      name: name.clone(),
    })?;
    Ok(self.labware_id(&name, slot))
  }

  async fn load_pipette(&self, pipette: &str, mount: &str) -> Result<(), DeviceError> {
    info!(pipette, mount, "simulated pipette load");
    self.issue(DeviceCall::LoadPipette {
      pipette: pipette.to_string(),
      mount: mount.to_string(),
    })
  }

  async fn move_to_well(
    &self,
    site: &WellSite,
    start: OffsetStart,
    offset: WellOffset,
    speed: u32,
  ) -> Result<(), DeviceError> {
    info!(
      labware_id = %site.labware_id,
      well = %site.well,
      start = %start,
      x = offset.x,
      y = offset.y,
      z = offset.z,
      "simulated move to well"
    );
    self.issue(DeviceCall::MoveToWell {
      site: site.clone(),
      start,
      offset,
      speed,
    })
  }

  async fn pick_up_tip(
    &self,
    site: &WellSite,
    offset_x: f64,
    offset_y: f64,
  ) -> Result<(), DeviceError> {
    info!(labware_id = %site.labware_id, well = %site.well, "simulated tip pick-up");
    self.issue(DeviceCall::PickUpTip {
      site: site.clone(),
      offset_x,
      offset_y,
    })
  }

  async fn drop_tip(
    &self,
    site: &WellSite,
    start: OffsetStart,
    offset: WellOffset,
  ) -> Result<(), DeviceError> {
    info!(labware_id = %site.labware_id, well = %site.well, "simulated tip drop");
    self.issue(DeviceCall::DropTip {
      site: site.clone(),
      start,
      offset,
    })
  }

  async fn aspirate(
    &self,
    site: &WellSite,
    volume_ul: f64,
    start: OffsetStart,
    offset: WellOffset,
  ) -> Result<(), DeviceError> {
    info!(labware_id = %site.labware_id, well = %site.well, volume_ul, "simulated aspirate");
    self.issue(DeviceCall::Aspirate {
      site: site.clone(),
      volume_ul,
      start,
      offset,
    })
  }

  async fn dispense(
    &self,
    site: &WellSite,
    volume_ul: f64,
    start: OffsetStart,
    offset: WellOffset,
  ) -> Result<(), DeviceError> {
    info!(labware_id = %site.labware_id, well = %site.well, volume_ul, "simulated dispense");
    self.issue(DeviceCall::Dispense {
      site: site.clone(),
      volume_ul,
      start,
      offset,
    })
  }

  async fn blowout(
    &self,
    site: &WellSite,
    start: OffsetStart,
    offset: WellOffset,
  ) -> Result<(), DeviceError> {
    info!(labware_id = %site.labware_id, well = %site.well, "simulated blowout");
    self.issue(DeviceCall::Blowout {
      site: site.clone(),
      start,
      offset,
    })
  }
}

/// A controller that logs and records commands instead of driving hardware.
#[derive(Debug, Clone)]
pub struct SimulatedController {
  port: String,
  log: CallLog,
  failures: FailurePlan,
}

impl SimulatedController {
  pub fn new(port: impl Into<String>, log: CallLog) -> Self {
    Self {
      port: port.into(),
      log,
      failures: FailurePlan::default(),
    }
  }

  /// Fail every call of the given kind.
  pub fn failing(mut self, operation: Operation) -> Self {
    self.failures.operations.insert(operation);
    self
  }

  pub fn log(&self) -> &CallLog {
    &self.log
  }

  fn issue(&self, call: DeviceCall) -> Result<(), DeviceError> {
    let operation = call.operation();
    self.log.record(call);
    self.failures.check(operation)
  }
}

#[async_trait]
impl Controller for SimulatedController {
  async fn connect(&self) -> Result<(), DeviceError> {
    info!(port = %self.port, "simulated controller connecting");
    self
      .issue(DeviceCall::ConnectController {
        port: self.port.clone(),
      })
      .map_err(|e| DeviceError::Connection {
        device: "controller".to_string(),
        address: self.port.clone(),
        message: e.to_string(),
      })
  }

  async fn set_temperature(&self, base: u8, celsius: f64) -> Result<(), DeviceError> {
    info!(base, celsius, "simulated temperature set");
    self.issue(DeviceCall::SetTemperature { base, celsius })
  }

  async fn dispense_volume(&self, pump: u8, volume_ml: f64) -> Result<(), DeviceError> {
    info!(pump, volume_ml, "simulated pump dispense");
    self.issue(DeviceCall::DispenseVolume { pump, volume_ml })
  }

  async fn run_agitation_timer(&self, base: u8, duration_ms: u64) -> Result<(), DeviceError> {
    info!(base, duration_ms, "simulated ultrasonic run");
    self.issue(DeviceCall::RunAgitationTimer { base, duration_ms })
  }
}
