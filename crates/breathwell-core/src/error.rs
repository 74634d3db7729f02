//! Core error types for breathwell-core.
//!
//! Configuration problems are reported synchronously and never partially
//! applied. Nothing inside the engine's `tick` is fallible.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for breathwell-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Breath pattern errors
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Technique lookup errors
    #[error("Unknown technique: {0}")]
    UnknownTechnique(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Home/config directory could not be prepared
    #[error("Configuration directory unavailable: {0}")]
    DirUnavailable(String),
}

/// Session construction and command validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// A phase with no duration reached the engine
    #[error("Phase {index} ({label}) has zero duration")]
    ZeroDurationPhase { index: usize, label: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Breath pattern parse errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Dash patterns map onto at most Inhale/Hold/Exhale/Hold
    #[error("Pattern '{pattern}' has {count} phases; at most 4 are supported")]
    TooManyPhases { pattern: String, count: usize },

    /// A number in the pattern does not fit a phase duration
    #[error("Invalid phase duration '{0}'")]
    InvalidSeconds(String),
}

/// Cue dispatch failures. These never affect engine state.
#[derive(Error, Debug)]
pub enum CueError {
    /// Output device missing or muted by the host
    #[error("Cue output unavailable: {0}")]
    Unavailable(String),

    /// Writing the cue failed
    #[error("Cue write failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ValidationError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
