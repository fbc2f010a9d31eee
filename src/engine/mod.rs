// src/engine/mod.rs

//! Scheduling engine.
//!
//! This module ties together:
//! - the [`WorkflowEngine`] that owns the task table and dispatches ready
//!   tasks one step at a time
//! - the ready-queue that completion callbacks feed from any thread
//! - the resumer hook a driver parks on while no work is available
//! - progress reporting and Graphviz export
//!
//! Callbacks reach the engine through the crate-private `shared` state;
//! drivers that loop over `run()` live in [`runtime`].

pub mod dot;
pub mod progress;
pub mod queue;
pub mod resumer;
pub mod runtime;
pub(crate) mod shared;
pub mod workflow;

pub use progress::ProgressReport;
pub use queue::ReadyQueue;
pub use resumer::Resumer;
pub use runtime::{drive, oneshot_resumer, run_to_completion};
pub use workflow::WorkflowEngine;
