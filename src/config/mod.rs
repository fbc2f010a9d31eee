// src/config/mod.rs

//! Pipeline files.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: reading a pipeline from disk.
//! - `validate.rs`: dependency, duration and cycle checks.

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::{DEFAULT_OUTPUT_WAIT, parse_duration};
pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{EngineSection, PipelineFile, RawPipelineFile, TaskConfig};
