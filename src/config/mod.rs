// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] is the serde-facing TOML model.
//! - [`loader`] reads a file into the raw model.
//! - [`validate`] turns a `RawConfigFile` into a checked [`ConfigFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{CheckKind, ConfigFile, ConfigSection, RawConfigFile, TaskConfig, ToolsSection};
