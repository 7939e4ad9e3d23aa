//! Dataset error types

use std::path::PathBuf;

use super::convo::ConvoIssue;

/// Errors raised while reading, validating, or merging datasets
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Dataset has no training sources
    #[error("Dataset has no training files\n  → Add at least one JSONL file under dataset.train")]
    NoTrainingData,

    /// Source file does not exist
    #[error("Dataset file not found: {path}")]
    NotFound { path: PathBuf },

    /// Source file contains no conversations
    #[error("Dataset file is empty: {path}")]
    EmptyFile { path: PathBuf },

    /// Line is not a valid conversation object
    #[error("{path}:{line}: invalid JSON conversation: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Line parsed but is not trainable
    #[error("{path}:{line}: {issue}")]
    InvalidConversation {
        path: PathBuf,
        line: usize,
        issue: ConvoIssue,
    },

    /// IO error
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }
}
