use serde::{Deserialize, Serialize};

/// Controller settings applied once a node's manipulator actions are done.
///
/// Each field that is present and strictly positive fires one controller
/// call, in field order: temperature, dispense, then agitation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControllerDirective {
  /// Target temperature for base 0, in °C.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub base0_temp: Option<f64>,
  /// Volume to dispense from pump 0, in ml.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pump0_ml: Option<f64>,
  /// Ultrasonic run time on base 0, in ms.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ultrasonic0_ms: Option<f64>,
}

impl ControllerDirective {
  pub fn is_empty(&self) -> bool {
    self.base0_temp.is_none() && self.pump0_ml.is_none() && self.ultrasonic0_ms.is_none()
  }
}
