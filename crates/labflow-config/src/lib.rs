//! Labflow Config
//!
//! Serializable types for lab automation workflow documents. A document
//! carries the hardware, labware and instrument declarations in
//! `global_config`, plus a graph of `nodes` and `edges`.
//!
//! These types describe the workflow as written. `labflow-workflow` builds
//! the validated, indexed form that the engine traverses.

mod action;
mod directive;
mod edge;
mod global;
mod node;
mod workflow;

pub use action::{ActionEntry, ManipulatorAction, Offset, WashAction, WashChannel, WashChannels, WellTarget};
pub use directive::ControllerDirective;
pub use edge::Edge;
pub use global::{
  DEFAULT_ROBOT_IP, GlobalConfig, HardwareConfig, InstrumentsConfig, LabwareDecl, LabwareEntry,
  PipetteDecl, RobotConfig,
};
pub use node::{NodeDef, NodeParams};
pub use workflow::WorkflowDef;
