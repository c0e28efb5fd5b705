//! Labflow Labware
//!
//! Resolves the logical labware names of a workflow to the identifiers the
//! manipulator assigned when the labware was loaded, and loads the pipette.
//!
//! Registration never fails outright: when a load cannot be completed the
//! name is bound to a synthetic `"{type}_{slot}"` id so later lookups still
//! resolve. Only the pipette load is fatal.

mod bindings;
mod definitions;
mod error;
mod registry;

pub use bindings::LabwareBindings;
pub use definitions::FsLabwareDefinitions;
pub use error::LabwareError;
pub use registry::{DEFAULT_STANDARD_PREFIX, LabwareRegistry, synthetic_id};
