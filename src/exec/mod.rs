// src/exec/mod.rs

//! Process-backed tasks.
//!
//! - [`CommandTask`]: runs a shell command on a tokio runtime.
//! - [`files`]: completion that waits for declared output files.
//! - [`pipeline`]: turns a validated pipeline file into a ready engine.

pub mod command;
pub mod files;
pub mod pipeline;

pub use command::CommandTask;
pub use files::{complete_when_files_appear, wait_for_files};
pub use pipeline::build_engine;
