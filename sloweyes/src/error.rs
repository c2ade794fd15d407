//! Error types for slowEyes
//!
//! Bad settings are rejected where they enter (`ConfigValidationError`),
//! so drawing code never has an error path. Tracker icon generation can
//! fail on disk (`CacheCreationError`); that is reported to the user and
//! drawing falls back to an older icon.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("{key} must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{key}: {value:?} is not a #rrggbb color")]
    InvalidColor { key: &'static str, value: String },
    #[error("{key}: unknown value {value:?}")]
    UnknownVariant { key: &'static str, value: String },
    #[error("interval range {min}..{max} needs max - min >= {gap}")]
    InvalidRange { min: f64, max: f64, gap: f64 },
    #[error("eye geometry rejected: {0}")]
    DegenerateGeometry(String),
    #[error("no tracker glyph named {0:?}")]
    UnknownShape(String),
    #[error("cannot parse accelerator {0:?}")]
    InvalidAccelerator(String),
    #[error("{key} expects a {expected} value")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },
}

#[derive(Error, Debug)]
#[error("cannot create tracker icon {key}: {source}")]
pub struct CacheCreationError {
    /// Path of the artifact that was being produced.
    pub key: PathBuf,
    #[source]
    pub source: std::io::Error,
}

pub type ConfigResult<T> = std::result::Result<T, ConfigValidationError>;
