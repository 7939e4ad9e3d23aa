//! Request and response bodies for the Together API

use serde::{Deserialize, Serialize};
use std::fmt;

/// Uploaded file as returned by `POST /files/upload`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileObject {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
}

/// One uploaded split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Remote file id (`file-...`)
    pub id: String,
    pub file_name: String,
    /// SHA-256 of the uploaded content
    pub sha256: String,
    /// True when the id came from the upload cache
    #[serde(default)]
    pub cached: bool,
}

/// Remote ids for a job's splits, input to [`super::TogetherConfig::finetune`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFiles {
    pub train: UploadedFile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval: Option<UploadedFile>,
}

/// Body of `POST /fine-tunes`
#[derive(Clone, PartialEq, Serialize)]
pub struct FineTuneRequest {
    pub training_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_file: Option<String>,
    pub model: String,
    pub n_epochs: u32,
    pub learning_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_evals: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warmup_ratio: Option<f64>,
    pub lora: bool,
    pub lora_r: u32,
    pub lora_alpha: u32,
    pub lora_dropout: f64,
    pub lora_trainable_modules: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wandb_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wandb_project_name: Option<String>,
}

impl fmt::Debug for FineTuneRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FineTuneRequest")
            .field("training_file", &self.training_file)
            .field("validation_file", &self.validation_file)
            .field("model", &self.model)
            .field("n_epochs", &self.n_epochs)
            .field("learning_rate", &self.learning_rate)
            .field("n_evals", &self.n_evals)
            .field("lora_r", &self.lora_r)
            .field("lora_alpha", &self.lora_alpha)
            .field("lora_dropout", &self.lora_dropout)
            .field("suffix", &self.suffix)
            .field("wandb_project_name", &self.wandb_project_name)
            .finish_non_exhaustive()
    }
}

/// Fine-tuning job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Queued,
    Running,
    Compressing,
    Uploading,
    CancelRequested,
    Cancelled,
    Error,
    UserError,
    Completed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// No further transitions expected
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Error | Self::UserError | Self::Completed
        )
    }

    pub fn is_success(&self) -> bool {
        *self == Self::Completed
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Compressing => "compressing",
            Self::Uploading => "uploading",
            Self::CancelRequested => "cancel_requested",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
            Self::UserError => "user_error",
            Self::Completed => "completed",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Job as returned by the fine-tunes endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineTuneJob {
    pub id: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Name of the resulting model once training finishes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Error envelope: `{"error": {"message": ...}}` or `{"message": ...}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ApiErrorBody {
    Nested { error: ApiErrorDetail },
    Flat { message: String },
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
}

/// Best-effort human message from an error response body
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody::Nested { error }) => error.message,
        Ok(ApiErrorBody::Flat { message }) => message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
