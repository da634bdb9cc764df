// src/errors.rs

//! Crate-wide error taxonomy and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerirunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Task '{task}' has unknown dependency '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("Cycle detected in task graph: {0}")]
    CycleDetected(String),

    /// An internal invariant was violated (e.g. a task reported terminal
    /// twice). This indicates a scheduler bug, not a verification failure.
    #[error("Aggregation inconsistency: {0}")]
    Inconsistency(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, VerirunError>;
