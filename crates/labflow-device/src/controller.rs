use async_trait::async_trait;

use crate::error::DeviceError;

/// The auxiliary controller: heated bases, pumps and ultrasonic baths.
#[async_trait]
pub trait Controller: Send + Sync {
  async fn connect(&self) -> Result<(), DeviceError>;

  /// Set the target temperature of a heated base, in °C.
  async fn set_temperature(&self, base: u8, celsius: f64) -> Result<(), DeviceError>;

  /// Dispense a metered volume from a pump, in ml.
  async fn dispense_volume(&self, pump: u8, volume_ml: f64) -> Result<(), DeviceError>;

  /// Run the ultrasonic bath on a base for a fixed time.
  async fn run_agitation_timer(&self, base: u8, duration_ms: u64) -> Result<(), DeviceError>;
}
