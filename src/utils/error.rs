//! Error types for the filter pipeline.
//!
//! Provides a hierarchy of error types using `thiserror`. Per-image and
//! per-step failures ([`FilterError`], [`TimingError`]) travel through events
//! as data; [`AppError`] covers setup failures in the front end.

use std::path::PathBuf;
use thiserror::Error;
use serde::Serialize;

/// Failure to filter a single image.
///
/// Terminal for that image only; sibling and subsequent images keep going.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum FilterError {
    /// The requested transform could not be constructed
    #[error("Failed to create filter: {0}")]
    Creation(String),
    /// The transform engine produced no usable output
    #[error("Failed to apply filter: {0}")]
    Application(String),
}

/// Failure of the simulator's delay mechanism.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TimingError {
    /// The deadline for a step lies beyond what the timer can represent
    #[error("Step {step} deadline overflowed (interval {interval_ms} ms)")]
    DeadlineOverflow { step: usize, interval_ms: u128 },
}

/// Setup errors surfaced by the command-line front end.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration file missing, unreadable, malformed or out of range
    #[error("Config error: {0}")]
    Config(String),

    /// File IO error
    #[error("IO error: {0}")]
    IO(String),

    /// An asset exists but could not be decoded or encoded
    #[error("Image error at {path}: {message}")]
    Image { path: PathBuf, message: String },

    /// Unsupported or unknown image format
    #[error("Format error: {0}")]
    Format(String),

    /// Filter selection could not be built
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Convenience result type for setup operations.
pub type AppResult<T> = Result<T, AppError>;

impl FilterError {
    pub fn creation<T: Into<String>>(msg: T) -> Self {
        Self::Creation(msg.into())
    }

    pub fn application<T: Into<String>>(msg: T) -> Self {
        Self::Application(msg.into())
    }
}

impl AppError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    pub fn format<T: Into<String>>(msg: T) -> Self {
        Self::Format(msg.into())
    }

    pub fn image(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Image {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
