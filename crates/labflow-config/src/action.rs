//! Manipulator actions declared on a node.
//!
//! Each entry in `ot2_actions` is tagged by its `action` field:
//!
//! ```json
//! { "action": "pick_up_tip", "labware": "tips", "well": "A1", "offset": { "z": 2 } }
//! { "action": "wash", "arduino_actions": { "pump0_ml": 5, "ultrasonic0_ms": 3000 } }
//! ```
//!
//! Entries with a tag this crate does not know are kept as
//! [`ActionEntry::Unrecognized`] so the engine can report and skip them
//! instead of rejecting the whole document.

use serde::{Deserialize, Serialize};

/// One entry of a node's action list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionEntry {
  Known(ManipulatorAction),
  /// Raw JSON of an entry that did not match any known action.
  Unrecognized(serde_json::Value),
}

impl ActionEntry {
  /// The `action` tag as written in the document.
  pub fn tag(&self) -> Option<&str> {
    match self {
      ActionEntry::Known(action) => Some(action.tag()),
      ActionEntry::Unrecognized(raw) => raw.get("action").and_then(|v| v.as_str()),
    }
  }
}

impl From<ManipulatorAction> for ActionEntry {
  fn from(action: ManipulatorAction) -> Self {
    ActionEntry::Known(action)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ManipulatorAction {
  PickUpTip(WellTarget),
  DropTip(WellTarget),
  MoveTo(WellTarget),
  Wash(WashAction),
  Home(WellTarget),
}

impl ManipulatorAction {
  pub fn tag(&self) -> &'static str {
    match self {
      ManipulatorAction::PickUpTip(_) => "pick_up_tip",
      ManipulatorAction::DropTip(_) => "drop_tip",
      ManipulatorAction::MoveTo(_) => "move_to",
      ManipulatorAction::Wash(_) => "wash",
      ManipulatorAction::Home(_) => "home",
    }
  }
}

/// A well on a piece of labware, addressed by logical labware name.
///
/// `labware` and `well` are optional at parse time; handlers that need them
/// skip the action when they are missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WellTarget {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub labware: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub well: Option<String>,
  #[serde(default)]
  pub offset: Offset,
}

impl WellTarget {
  pub fn new(labware: impl Into<String>, well: impl Into<String>) -> Self {
    Self {
      labware: Some(labware.into()),
      well: Some(well.into()),
      offset: Offset::default(),
    }
  }

  pub fn with_offset(mut self, x: f64, y: f64, z: f64) -> Self {
    self.offset = Offset { x, y, z };
    self
  }
}

/// Offset in millimetres; missing axes are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
  #[serde(default)]
  pub x: f64,
  #[serde(default)]
  pub y: f64,
  #[serde(default)]
  pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WashAction {
  #[serde(default)]
  pub arduino_actions: WashChannels,
}

/// Channel values for a wash; each is fired only when present and positive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WashChannels {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pump0_ml: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pump1_ml: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pump2_ml: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ultrasonic0_ms: Option<f64>,
}

/// Physical channel driven during a wash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WashChannel {
  /// Pump 0, reagent A.
  ReagentA,
  /// Pump 1, reagent B.
  ReagentB,
  /// Pump 2, waste.
  Waste,
  /// Ultrasonic bath on base 0.
  Agitation,
}

impl WashChannel {
  /// The controller index (pump number or ultrasonic base) for this channel.
  pub fn index(self) -> u8 {
    match self {
      WashChannel::ReagentA => 0,
      WashChannel::ReagentB => 1,
      WashChannel::Waste => 2,
      WashChannel::Agitation => 0,
    }
  }

  pub fn field_name(self) -> &'static str {
    match self {
      WashChannel::ReagentA => "pump0_ml",
      WashChannel::ReagentB => "pump1_ml",
      WashChannel::Waste => "pump2_ml",
      WashChannel::Agitation => "ultrasonic0_ms",
    }
  }
}

impl WashChannels {
  /// Channel values in delivery order. Reagents go in before waste is drawn
  /// and agitation always runs last.
  pub fn in_order(&self) -> [(WashChannel, Option<f64>); 4] {
    [
      (WashChannel::ReagentA, self.pump0_ml),
      (WashChannel::ReagentB, self.pump1_ml),
      (WashChannel::Waste, self.pump2_ml),
      (WashChannel::Agitation, self.ultrasonic0_ms),
    ]
  }
}
