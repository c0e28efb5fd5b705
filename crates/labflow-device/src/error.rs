use thiserror::Error;

/// Errors reported by a device driver.
#[derive(Debug, Clone, Error)]
pub enum DeviceError {
  /// The device could not be reached.
  #[error("failed to connect to {device} at {address}: {message}")]
  Connection {
    device: String,
    address: String,
    message: String,
  },

  /// The device rejected or failed a command.
  #[error("{operation} failed: {message}")]
  Command { operation: String, message: String },
}

impl DeviceError {
  pub fn command(operation: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Command {
      operation: operation.into(),
      message: message.into(),
    }
  }
}
