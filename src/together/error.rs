//! Together API error types

use std::time::Duration;

/// Errors from the Together files and fine-tuning endpoints
#[derive(Debug, thiserror::Error)]
pub enum TogetherError {
    /// No API key available
    #[error("Missing TOGETHER_API_KEY - set the environment variable or api_key_env in the manifest")]
    AuthRequired,

    /// Key rejected by the API
    #[error("Authentication failed: {message}\n  → Check your TOGETHER_API_KEY")]
    Unauthorized { message: String },

    /// Resource does not exist
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Still rate limited after all retries
    #[error("Rate limited by Together API (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Request rejected with an error status
    #[error("Together API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Could not connect; the request never reached the server
    #[error("Connection failed: {message}")]
    Connect { message: String },

    /// Transport failure after the request may have been sent
    #[error("HTTP error: {message}")]
    Http { message: String, retryable: bool },

    /// Response body did not match the expected shape
    #[error("Unexpected response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    /// Option rejected before any request was sent
    #[error("Invalid Together option '{field}': {message}")]
    InvalidOption { field: String, message: String },

    /// IO error
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl TogetherError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Check if the request may succeed when repeated
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Connect { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Http { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// Check if the server cannot have acted on the request, so a
    /// non-idempotent call may be repeated
    #[must_use]
    pub fn is_unprocessed(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Connect { .. })
    }

    /// Server-requested delay, if any
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Check if the user can fix this by changing inputs or credentials
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::AuthRequired
            | Self::Unauthorized { .. }
            | Self::NotFound { .. }
            | Self::InvalidOption { .. } => true,
            Self::Api { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }
}
