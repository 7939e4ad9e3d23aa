//! Upload cache and job record persisted in the output directory

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::error::TogetherError;
use super::types::{FineTuneJob, JobStatus, UploadedFiles};

/// File name of the upload cache inside the output directory
pub const UPLOAD_CACHE_FILE: &str = "uploads.json";

/// File name of the job record inside the output directory
pub const JOB_RECORD_FILE: &str = "job.json";

/// A previously uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedUpload {
    pub id: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Content hash to remote file id. Keyed by the API root so a cache built
/// against one endpoint is never reused against another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCache {
    #[serde(default)]
    entries: BTreeMap<String, BTreeMap<String, CachedUpload>>,
}

impl UploadCache {
    pub fn path(output_dir: &Path) -> PathBuf {
        output_dir.join(UPLOAD_CACHE_FILE)
    }

    /// Load the cache. A missing file is an empty cache.
    pub fn load(output_dir: &Path) -> Result<Self, TogetherError> {
        let path = Self::path(output_dir);
        match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| TogetherError::InvalidResponse {
                endpoint: path.display().to_string(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(TogetherError::io(format!("reading {}", path.display()), e)),
        }
    }

    pub fn save(&self, output_dir: &Path) -> Result<(), TogetherError> {
        let path = Self::path(output_dir);
        let text = serde_json::to_string_pretty(self).map_err(|e| TogetherError::io(
            format!("serializing {}", path.display()),
            std::io::Error::other(e),
        ))?;
        std::fs::write(&path, text)
            .map_err(|e| TogetherError::io(format!("writing {}", path.display()), e))
    }

    pub fn get(&self, base_url: &str, sha256: &str) -> Option<&CachedUpload> {
        self.entries.get(base_url)?.get(sha256)
    }

    pub fn insert(&mut self, base_url: &str, sha256: &str, upload: CachedUpload) {
        self.entries
            .entry(base_url.to_string())
            .or_default()
            .insert(sha256.to_string(), upload);
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What was submitted, written to `job.json` after `finetune`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub model: String,
    pub files: UploadedFiles,
    pub submitted_at: DateTime<Utc>,
    pub status: JobStatus,
}

impl JobRecord {
    pub fn new(job: &FineTuneJob, model: &str, files: &UploadedFiles) -> Self {
        Self {
            job_id: job.id.clone(),
            model: model.to_string(),
            files: files.clone(),
            submitted_at: Utc::now(),
            status: job.status,
        }
    }

    pub fn path(output_dir: &Path) -> PathBuf {
        output_dir.join(JOB_RECORD_FILE)
    }

    pub fn load(output_dir: &Path) -> Result<Self, TogetherError> {
        let path = Self::path(output_dir);
        let text = std::fs::read_to_string(&path)
            .map_err(|e| TogetherError::io(format!("reading {}", path.display()), e))?;
        serde_json::from_str(&text).map_err(|e| TogetherError::InvalidResponse {
            endpoint: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn save(&self, output_dir: &Path) -> Result<PathBuf, TogetherError> {
        let path = Self::path(output_dir);
        let text = serde_json::to_string_pretty(self).map_err(|e| TogetherError::io(
            format!("serializing {}", path.display()),
            std::io::Error::other(e),
        ))?;
        std::fs::write(&path, text)
            .map_err(|e| TogetherError::io(format!("writing {}", path.display()), e))?;
        Ok(path)
    }
}
