//! Engine configuration.

use std::path::PathBuf;

use labflow_labware::DEFAULT_STANDARD_PREFIX;

/// Pipette used for every well operation.
pub const DEFAULT_PIPETTE: &str = "p1000_single_gen2";

/// Move speed for well operations.
pub const DEFAULT_SPEED: u32 = 100;

/// Settings applied by the action dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
  pub pipette: String,
  pub speed: u32,
}

impl Default for DispatchConfig {
  fn default() -> Self {
    Self {
      pipette: DEFAULT_PIPETTE.to_string(),
      speed: DEFAULT_SPEED,
    }
  }
}

/// Configuration for a workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
  /// Directory holding custom labware definitions (`{type}.json`).
  pub labware_dir: PathBuf,
  /// Labware types with this prefix are loaded from the robot's catalog.
  pub standard_labware_prefix: String,
  pub dispatch: DispatchConfig,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      labware_dir: PathBuf::from("labware"),
      standard_labware_prefix: DEFAULT_STANDARD_PREFIX.to_string(),
      dispatch: DispatchConfig::default(),
    }
  }
}
