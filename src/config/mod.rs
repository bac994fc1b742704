// src/config/mod.rs

//! Configuration loading and validation for cmdrun.
//!
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate env entries, durations and category patterns (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{CommandSection, ConfigFile, RawConfigFile};
pub use validate::{parse_duration, validate_config};
