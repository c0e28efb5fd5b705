use std::path::PathBuf;

use labflow_device::DeviceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabwareError {
  #[error("custom labware definition for '{labware_type}' not found at {}", path.display())]
  DefinitionNotFound { labware_type: String, path: PathBuf },

  #[error("failed to read labware definition {}: {source}", path.display())]
  DefinitionRead {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid labware definition {}: {source}", path.display())]
  InvalidDefinition {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("labware load failed: {0}")]
  Device(#[from] DeviceError),

  #[error("device returned an empty labware id")]
  EmptyLabwareId,

  #[error("no pipette declared in instruments")]
  MissingPipette,

  #[error("failed to load pipette '{pipette}' on {mount} mount: {source}")]
  PipetteLoad {
    pipette: String,
    mount: String,
    #[source]
    source: DeviceError,
  },
}
