use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DeviceError;

/// Reference point a well offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetStart {
  Top,
  Center,
  Bottom,
}

impl fmt::Display for OffsetStart {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      OffsetStart::Top => "top",
      OffsetStart::Center => "center",
      OffsetStart::Bottom => "bottom",
    };
    f.write_str(s)
  }
}

/// Offset from the reference point, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WellOffset {
  pub x: f64,
  pub y: f64,
  pub z: f64,
}

impl WellOffset {
  pub fn new(x: f64, y: f64, z: f64) -> Self {
    Self { x, y, z }
  }
}

/// A well on loaded labware, addressed by its device-side labware id, and
/// the pipette that acts on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellSite {
  pub labware_id: String,
  pub well: String,
  pub pipette: String,
}

impl WellSite {
  pub fn new(
    labware_id: impl Into<String>,
    well: impl Into<String>,
    pipette: impl Into<String>,
  ) -> Self {
    Self {
      labware_id: labware_id.into(),
      well: well.into(),
      pipette: pipette.into(),
    }
  }
}

/// The liquid-handling robot.
#[async_trait]
pub trait Manipulator: Send + Sync {
  async fn connect(&self) -> Result<(), DeviceError>;

  async fn set_lights(&self, on: bool) -> Result<(), DeviceError>;

  async fn home(&self) -> Result<(), DeviceError>;

  /// Load labware from the built-in catalog. Returns the device-side id.
  async fn load_standard_labware(&self, slot: u32, load_name: &str) -> Result<String, DeviceError>;

  /// Load labware from a custom definition document. Returns the device-side id.
  async fn load_custom_labware(
    &self,
    definition: &serde_json::Value,
    slot: u32,
  ) -> Result<String, DeviceError>;

  async fn load_pipette(&self, pipette: &str, mount: &str) -> Result<(), DeviceError>;

  async fn move_to_well(
    &self,
    site: &WellSite,
    start: OffsetStart,
    offset: WellOffset,
    speed: u32,
  ) -> Result<(), DeviceError>;

  /// Pick up a tip. Only the horizontal offset applies.
  async fn pick_up_tip(&self, site: &WellSite, offset_x: f64, offset_y: f64)
  -> Result<(), DeviceError>;

  async fn drop_tip(
    &self,
    site: &WellSite,
    start: OffsetStart,
    offset: WellOffset,
  ) -> Result<(), DeviceError>;

  /// Aspirate `volume_ul` microlitres.
  async fn aspirate(
    &self,
    site: &WellSite,
    volume_ul: f64,
    start: OffsetStart,
    offset: WellOffset,
  ) -> Result<(), DeviceError>;

  /// Dispense `volume_ul` microlitres.
  async fn dispense(
    &self,
    site: &WellSite,
    volume_ul: f64,
    start: OffsetStart,
    offset: WellOffset,
  ) -> Result<(), DeviceError>;

  async fn blowout(
    &self,
    site: &WellSite,
    start: OffsetStart,
    offset: WellOffset,
  ) -> Result<(), DeviceError>;
}
