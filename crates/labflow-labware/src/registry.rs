//! Labware and pipette setup.

use labflow_config::{LabwareDecl, LabwareEntry, PipetteDecl};
use labflow_device::Manipulator;
use tracing::{debug, info, instrument, warn};

use crate::bindings::LabwareBindings;
use crate::definitions::FsLabwareDefinitions;
use crate::error::LabwareError;

/// Labware types starting with this prefix come from the robot's catalog.
pub const DEFAULT_STANDARD_PREFIX: &str = "opentrons_";

/// Fallback id bound when a load cannot be completed.
pub fn synthetic_id(labware_type: &str, slot: u32) -> String {
  format!("{}_{}", labware_type, slot)
}

/// Loads declared labware onto the manipulator and records the ids it
/// assigns.
pub struct LabwareRegistry<'a> {
  manipulator: &'a dyn Manipulator,
  definitions: &'a FsLabwareDefinitions,
  standard_prefix: String,
}

impl<'a> LabwareRegistry<'a> {
  pub fn new(manipulator: &'a dyn Manipulator, definitions: &'a FsLabwareDefinitions) -> Self {
    Self {
      manipulator,
      definitions,
      standard_prefix: DEFAULT_STANDARD_PREFIX.to_string(),
    }
  }

  pub fn with_standard_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.standard_prefix = prefix.into();
    self
  }

  /// Load every declaration, in order, and bind each logical name.
  ///
  /// Never fails: a declaration that cannot be loaded is bound to
  /// [`synthetic_id`].
  #[instrument(name = "labware_register", skip_all, fields(count = declarations.len()))]
  pub async fn register(&self, declarations: &[LabwareEntry]) -> LabwareBindings {
    let mut ids = Vec::with_capacity(declarations.len());

    for entry in declarations {
      let decl = &entry.decl;
      info!(
        labware = %entry.name,
        labware_type = %decl.labware_type,
        slot = decl.slot,
        "loading labware"
      );

      let id = match self.load(decl).await {
        Ok(id) => {
          info!(labware = %entry.name, labware_id = %id, "labware loaded");
          id
        }
        Err(e) => {
          let fallback = synthetic_id(&decl.labware_type, decl.slot);
          warn!(
            labware = %entry.name,
            labware_id = %fallback,
            error = %e,
            "labware load failed, using synthetic id"
          );
          fallback
        }
      };

      ids.push((entry.name.clone(), id));
    }

    ids.into_iter().collect()
  }

  async fn load(&self, decl: &LabwareDecl) -> Result<String, LabwareError> {
    let id = if decl.labware_type.starts_with(&self.standard_prefix) {
      self
        .manipulator
        .load_standard_labware(decl.slot, &decl.labware_type)
        .await?
    } else {
      debug!(
        path = %self.definitions.path_for(&decl.labware_type).display(),
        "looking up custom labware definition"
      );
      let definition = self.definitions.load(&decl.labware_type).await?;
      self
        .manipulator
        .load_custom_labware(&definition, decl.slot)
        .await?
    };

    if id.is_empty() {
      return Err(LabwareError::EmptyLabwareId);
    }
    Ok(id)
  }

  /// Load the declared pipette. Without a pipette no step can run, so any
  /// failure here is fatal to the run.
  pub async fn setup_pipette(&self, pipette: Option<&PipetteDecl>) -> Result<(), LabwareError> {
    let pipette = pipette.ok_or(LabwareError::MissingPipette)?;

    info!(
      pipette = %pipette.pipette_type,
      mount = %pipette.mount,
      "loading pipette"
    );

    self
      .manipulator
      .load_pipette(&pipette.pipette_type, &pipette.mount)
      .await
      .map_err(|source| LabwareError::PipetteLoad {
        pipette: pipette.pipette_type.clone(),
        mount: pipette.mount.clone(),
        source,
      })
  }
}
