//! Action dispatch.
//!
//! Maps each declared action to device calls. Every handler returns an
//! [`ActionOutcome`]; device errors stop at the handler and never reach the
//! traversal as errors.

use labflow_config::{
  ActionEntry, ControllerDirective, ManipulatorAction, WashAction, WashChannel, WellTarget,
};
use labflow_device::{Controller, DeviceError, Manipulator, OffsetStart, WellOffset, WellSite};
use labflow_labware::LabwareBindings;
use tracing::{error, info, warn};

use crate::config::DispatchConfig;

/// Result of dispatching one action or directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
  /// Every device call issued for the action succeeded.
  Completed,
  /// The action was not attempted.
  Skipped { reason: String },
  /// A device call failed; remaining calls of this action were not issued.
  Failed { reason: String },
}

impl ActionOutcome {
  fn skipped(reason: impl Into<String>) -> Self {
    ActionOutcome::Skipped {
      reason: reason.into(),
    }
  }
}

/// Issues the device calls for node actions.
///
/// Holds everything a handler may need: the manipulator, the controller if
/// it connected, and the labware bindings made during setup.
pub struct ActionDispatcher<'a> {
  manipulator: &'a dyn Manipulator,
  controller: Option<&'a dyn Controller>,
  bindings: &'a LabwareBindings,
  config: &'a DispatchConfig,
}

impl<'a> ActionDispatcher<'a> {
  pub fn new(
    manipulator: &'a dyn Manipulator,
    controller: Option<&'a dyn Controller>,
    bindings: &'a LabwareBindings,
    config: &'a DispatchConfig,
  ) -> Self {
    Self {
      manipulator,
      controller,
      bindings,
      config,
    }
  }

  /// Dispatch one entry of a node's action list.
  pub async fn dispatch(&self, entry: &ActionEntry) -> ActionOutcome {
    match entry {
      ActionEntry::Known(action) => self.dispatch_action(action).await,
      ActionEntry::Unrecognized(raw) => {
        let tag = entry.tag().unwrap_or("<missing>");
        // A known tag lands here when its fields have the wrong shape.
        let detail = serde_json::from_value::<ManipulatorAction>(raw.clone())
          .err()
          .map(|e| e.to_string())
          .unwrap_or_default();
        error!(action = %tag, detail = %detail, "unknown action type");
        ActionOutcome::skipped(format!("unknown action type '{}': {}", tag, detail))
      }
    }
  }

  pub async fn dispatch_action(&self, action: &ManipulatorAction) -> ActionOutcome {
    match action {
      ManipulatorAction::PickUpTip(target) => self.pick_up_tip(target).await,
      ManipulatorAction::DropTip(target) => self.drop_tip(target).await,
      ManipulatorAction::MoveTo(target) => self.move_to(target).await,
      ManipulatorAction::Wash(wash) => self.wash(wash).await,
      ManipulatorAction::Home(_) => self.home().await,
    }
  }

  /// Apply a node's controller directive: temperature, then dispense, then
  /// agitation.
  pub async fn dispatch_directive(&self, directive: &ControllerDirective) -> ActionOutcome {
    let Some(controller) = self.controller else {
      warn!("controller not available, skipping controller directive");
      return ActionOutcome::skipped("controller not connected");
    };

    let result = async {
      if let Some(celsius) = positive(directive.base0_temp) {
        info!(base = 0, celsius, "setting temperature");
        controller.set_temperature(0, celsius).await?;
      }
      if let Some(volume_ml) = positive(directive.pump0_ml) {
        info!(pump = 0, volume_ml, "dispensing");
        controller.dispense_volume(0, volume_ml).await?;
      }
      if let Some(duration_ms) = positive(directive.ultrasonic0_ms) {
        info!(base = 0, duration_ms, "running ultrasonic");
        controller.run_agitation_timer(0, as_millis(duration_ms)).await?;
      }
      Ok::<(), DeviceError>(())
    }
    .await;

    settle("controller directive", result)
  }

  async fn pick_up_tip(&self, target: &WellTarget) -> ActionOutcome {
    let site = match self.resolve("pick_up_tip", target) {
      Ok(site) => site,
      Err(skipped) => return skipped,
    };
    info!(labware_id = %site.labware_id, well = %site.well, "picking up tip");

    let offset = well_offset(target);
    let result = async {
      self
        .manipulator
        .move_to_well(&site, OffsetStart::Top, offset, self.config.speed)
        .await?;
      self
        .manipulator
        .pick_up_tip(&site, offset.x, offset.y)
        .await
    }
    .await;

    settle("pick_up_tip", result)
  }

  async fn drop_tip(&self, target: &WellTarget) -> ActionOutcome {
    let site = match self.resolve("drop_tip", target) {
      Ok(site) => site,
      Err(skipped) => return skipped,
    };
    info!(labware_id = %site.labware_id, well = %site.well, "dropping tip");

    let offset = well_offset(target);
    let result = async {
      self
        .manipulator
        .move_to_well(&site, OffsetStart::Top, offset, self.config.speed)
        .await?;
      self
        .manipulator
        .drop_tip(&site, OffsetStart::Bottom, offset)
        .await
    }
    .await;

    settle("drop_tip", result)
  }

  async fn move_to(&self, target: &WellTarget) -> ActionOutcome {
    let site = match self.resolve("move_to", target) {
      Ok(site) => site,
      Err(skipped) => return skipped,
    };
    info!(labware_id = %site.labware_id, well = %site.well, "moving to well");

    let result = self
      .manipulator
      .move_to_well(&site, OffsetStart::Top, well_offset(target), self.config.speed)
      .await;

    settle("move_to", result)
  }

  async fn wash(&self, wash: &WashAction) -> ActionOutcome {
    let Some(controller) = self.controller else {
      warn!("controller not available, skipping wash action");
      return ActionOutcome::skipped("controller not connected");
    };
    info!("executing wash action");

    let result = async {
      for (channel, value) in wash.arduino_actions.in_order() {
        let Some(value) = positive(value) else {
          continue;
        };
        let index = channel.index();
        match channel {
          WashChannel::Agitation => {
            info!(base = index, duration_ms = value, "running ultrasonic");
            controller.run_agitation_timer(index, as_millis(value)).await?;
          }
          _ => {
            info!(pump = index, channel = channel.field_name(), volume_ml = value, "dispensing");
            controller.dispense_volume(index, value).await?;
          }
        }
      }
      Ok::<(), DeviceError>(())
    }
    .await;

    settle("wash", result)
  }

  async fn home(&self) -> ActionOutcome {
    info!("homing the robot");
    settle("home", self.manipulator.home().await)
  }

  /// Resolve a well target against the bindings, or produce the skip.
  fn resolve(&self, action: &str, target: &WellTarget) -> Result<WellSite, ActionOutcome> {
    let (Some(labware), Some(well)) = (target.labware.as_deref(), target.well.as_deref()) else {
      error!(action, "action requires labware and well");
      return Err(ActionOutcome::skipped("missing labware or well"));
    };

    let Some(labware_id) = self.bindings.resolve(labware) else {
      error!(action, labware, "labware not found in bindings");
      info!(available = ?self.bindings.names(), "available labware");
      warn!(action, labware, well, "skipping action");
      return Err(ActionOutcome::skipped(format!(
        "labware '{}' is not registered",
        labware
      )));
    };

    Ok(WellSite::new(labware_id, well, self.config.pipette.as_str()))
  }
}

fn well_offset(target: &WellTarget) -> WellOffset {
  WellOffset::new(target.offset.x, target.offset.y, target.offset.z)
}

fn positive(value: Option<f64>) -> Option<f64> {
  value.filter(|v| *v > 0.0)
}

fn as_millis(value: f64) -> u64 {
  value.round() as u64
}

fn settle(action: &str, result: Result<(), DeviceError>) -> ActionOutcome {
  match result {
    Ok(()) => ActionOutcome::Completed,
    Err(e) => {
      error!(action, error = %e, "device call failed");
      warn!("continuing with workflow execution");
      ActionOutcome::Failed {
        reason: e.to_string(),
      }
    }
  }
}
