//! Labflow Device
//!
//! The operations the engine issues to the two physical devices of a run:
//!
//! - [`Manipulator`]: the liquid-handling robot (homing, labware and pipette
//!   loading, well moves, tips, liquid transfer).
//! - [`Controller`]: the auxiliary controller (temperature, metered
//!   dispense, timed ultrasonic agitation).
//!
//! Drivers for real hardware implement these traits outside this workspace.
//! [`SimulatedManipulator`] and [`SimulatedController`] log every call,
//! record it in a shared [`CallLog`], and can be told to fail chosen
//! operations.

mod controller;
mod error;
mod manipulator;
mod simulated;

pub use controller::Controller;
pub use error::DeviceError;
pub use manipulator::{Manipulator, OffsetStart, WellOffset, WellSite};
pub use simulated::{CallLog, DeviceCall, Operation, SimulatedController, SimulatedManipulator};
