//! Crate-level error type.
//!
//! Each module owns a focused error enum; `UnfatError` wraps them so callers
//! working across modules (the CLI, manifest conversion) can use a single `?`.

use std::path::PathBuf;
use thiserror::Error;

use crate::datasets::DatasetError;
use crate::lora::LoraError;
use crate::manifest::ManifestError;
use crate::together::TogetherError;

/// Result type alias for unfat operations.
pub type Result<T> = std::result::Result<T, UnfatError>;

/// Errors that can occur while building, saving, or submitting a job.
#[derive(Error, Debug)]
pub enum UnfatError {
    /// LoRA hyperparameters are out of range.
    #[error(transparent)]
    Lora(#[from] LoraError),

    /// A dataset file could not be read or failed validation.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// The job manifest is malformed or inconsistent.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The Together API rejected a request or could not be reached.
    #[error(transparent)]
    Together(#[from] TogetherError),

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Output directory exists and is not a directory.
    #[error("Output path is not a directory: {path}\n  → Choose a different output_dir")]
    NotADirectory { path: PathBuf },
}

impl UnfatError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Check if this error is something the user can fix by editing inputs.
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::Lora(_) | Self::Dataset(_) | Self::Manifest(_) | Self::NotADirectory { .. } => {
                true
            }
            Self::Together(e) => e.is_user_error(),
            Self::Io { .. } | Self::Serialization { .. } => false,
        }
    }

    /// Get the error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Lora(_) => "E001",
            Self::Manifest(_) => "E002",
            Self::Dataset(_) => "E010",
            Self::Together(_) => "E020",
            Self::NotADirectory { .. } => "E030",
            Self::Io { .. } => "E050",
            Self::Serialization { .. } => "E051",
        }
    }
}

impl From<serde_yaml::Error> for UnfatError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for UnfatError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}
