//! Labflow Engine
//!
//! Runs a lab automation workflow against a manipulator and an optional
//! controller.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      WorkflowRunner                         │
//! │  - execute() → bool, optional ExecutionBackend first        │
//! │  - validate graph, connect devices, labware + pipette       │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     GraphExecutor                           │
//! │  - depth-first from each root, children in edge order       │
//! │  - run(workflow) → TraversalReport                          │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ActionDispatcher                         │
//! │  - one action or directive → device calls → ActionOutcome   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Device errors stop at the dispatcher. Only graph validation, the
//! manipulator connection and pipette setup can fail a run.

mod config;
mod dispatcher;
mod error;
mod events;
mod executor;
mod runner;

pub use config::{DEFAULT_PIPETTE, DEFAULT_SPEED, DispatchConfig, EngineConfig};
pub use dispatcher::{ActionDispatcher, ActionOutcome};
pub use error::{BackendError, ExecutionError, RunError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use executor::{GraphExecutor, TraversalReport};
pub use runner::{ExecutionBackend, RunReport, WorkflowRunner};
