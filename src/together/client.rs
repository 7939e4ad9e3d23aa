//! Together REST client
//!
//! Blocking client for the files and fine-tunes endpoints. Requests that fail
//! with 429, a 5xx status, or a transport error are retried with exponential
//! backoff. Job creation is not idempotent and is only repeated after 429 or
//! a failed connect.

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

use super::error::TogetherError;
use super::types::{error_message, FileObject, FineTuneJob, FineTuneRequest};

/// Default API root
pub const TOGETHER_API_BASE: &str = "https://api.together.xyz/v1";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "TOGETHER_API_KEY";

/// Largest `Retry-After` we honor
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Operations a fine-tuning backend must support
pub trait FineTuneApi {
    /// Upload one JSONL file for fine-tuning
    fn upload_file(&self, path: &Path, file_name: &str) -> Result<FileObject, TogetherError>;

    /// Start a fine-tuning job
    fn create_fine_tune(&self, request: &FineTuneRequest) -> Result<FineTuneJob, TogetherError>;

    /// Fetch the current state of a job
    fn fine_tune(&self, id: &str) -> Result<FineTuneJob, TogetherError>;

    /// Request cancellation of a job
    fn cancel_fine_tune(&self, id: &str) -> Result<FineTuneJob, TogetherError>;
}

/// Retry schedule for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles afterwards
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Never retry
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay after failed attempt number `attempt` (0-based).
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(server) => server.min(MAX_RETRY_AFTER),
            None => self.base_delay.saturating_mul(1u32 << attempt.min(16)),
        }
    }
}

/// Together API client
pub struct TogetherClient {
    client: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl TogetherClient {
    /// Create a client with an explicit key
    pub fn new(api_key: impl Into<String>) -> Result<Self, TogetherError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TogetherError::AuthRequired);
        }

        let client = Client::builder()
            .user_agent(concat!("unfat/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| TogetherError::Http {
                message: format!("Failed to create HTTP client: {e}"),
                retryable: false,
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: TOGETHER_API_BASE.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Create a client from `TOGETHER_API_KEY` or `~/.together/api_key`
    pub fn from_env() -> Result<Self, TogetherError> {
        Self::new(Self::resolve_api_key().ok_or(TogetherError::AuthRequired)?)
    }

    /// Override the API root (e.g. a proxy)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Look up an API key from the environment, then the home directory
    pub fn resolve_api_key() -> Option<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Some(key.trim().to_string());
            }
        }

        Self::api_key_from_file()
    }

    /// Read `~/.together/api_key`
    pub fn api_key_from_file() -> Option<String> {
        let path = dirs::home_dir()?.join(".together").join("api_key");
        let key = std::fs::read_to_string(path).ok()?;
        let key = key.trim();
        (!key.is_empty()).then(|| key.to_string())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request built by `build`, retrying transient failures. Unless
    /// `idempotent`, only failures the server never processed are retried.
    fn execute<T, F>(&self, endpoint: &str, idempotent: bool, build: F) -> Result<T, TogetherError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let result = build()
                .bearer_auth(&self.api_key)
                .send()
                .map_err(transport_error)
                .and_then(|response| check_status(endpoint, response));

            match result {
                Ok(response) => {
                    let body = response.text().map_err(transport_error)?;
                    return serde_json::from_str(&body).map_err(|e| {
                        TogetherError::InvalidResponse {
                            endpoint: endpoint.to_string(),
                            message: e.to_string(),
                        }
                    });
                }
                Err(e)
                    if attempt + 1 < self.retry.max_attempts
                        && (e.is_unprocessed() || (idempotent && e.is_retryable())) =>
                {
                    std::thread::sleep(self.retry.delay(attempt, e.retry_after()));
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl FineTuneApi for TogetherClient {
    /// POST <https://api.together.xyz/v1/files/upload>
    fn upload_file(&self, path: &Path, file_name: &str) -> Result<FileObject, TogetherError> {
        let content = std::fs::read(path)
            .map_err(|e| TogetherError::io(format!("reading {}", path.display()), e))?;
        let url = self.url("files/upload");

        self.execute("files/upload", true, || {
            let part = Part::bytes(content.clone()).file_name(file_name.to_string());
            let form = Form::new()
                .text("purpose", "fine-tune")
                .text("file_name", file_name.to_string())
                .part("file", part);
            self.client.post(&url).multipart(form)
        })
    }

    /// POST <https://api.together.xyz/v1/fine-tunes>
    fn create_fine_tune(&self, request: &FineTuneRequest) -> Result<FineTuneJob, TogetherError> {
        let url = self.url("fine-tunes");
        self.execute("fine-tunes", false, || {
            self.client.post(&url).json(request)
        })
    }

    /// GET <https://api.together.xyz/v1/fine-tunes/{id}>
    fn fine_tune(&self, id: &str) -> Result<FineTuneJob, TogetherError> {
        let url = self.url(&format!("fine-tunes/{id}"));
        self.execute(&format!("fine-tunes/{id}"), true, || {
            self.client.get(&url)
        })
    }

    /// POST <https://api.together.xyz/v1/fine-tunes/{id}/cancel>
    fn cancel_fine_tune(&self, id: &str) -> Result<FineTuneJob, TogetherError> {
        let url = self.url(&format!("fine-tunes/{id}/cancel"));
        self.execute(&format!("fine-tunes/{id}/cancel"), true, || {
            self.client.post(&url)
        })
    }
}

impl std::fmt::Debug for TogetherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TogetherClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

fn transport_error(e: reqwest::Error) -> TogetherError {
    if e.is_connect() {
        TogetherError::Connect {
            message: e.to_string(),
        }
    } else {
        TogetherError::Http {
            retryable: e.is_timeout(),
            message: e.to_string(),
        }
    }
}

fn check_status(endpoint: &str, response: Response) -> Result<Response, TogetherError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);
    let body = response.text().unwrap_or_default();
    Err(status_error(endpoint, status, &body, retry_after))
}

/// Map a non-success status and body to an error
pub(crate) fn status_error(
    endpoint: &str,
    status: StatusCode,
    body: &str,
    retry_after: Option<Duration>,
) -> TogetherError {
    let message = error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TogetherError::Unauthorized { message },
        StatusCode::NOT_FOUND => TogetherError::NotFound {
            what: format!("{endpoint}: {message}"),
        },
        StatusCode::TOO_MANY_REQUESTS => TogetherError::RateLimited { retry_after },
        _ => TogetherError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// `Retry-After` in delta-seconds form
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
