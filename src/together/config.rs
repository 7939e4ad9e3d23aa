//! Together job configuration and the upload / finetune flow

use chrono::Utc;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use super::cache::{CachedUpload, JobRecord, UploadCache};
use super::client::{FineTuneApi, TogetherClient, TOGETHER_API_BASE};
use super::error::TogetherError;
use super::types::{FineTuneJob, FineTuneRequest, UploadedFile, UploadedFiles};
use crate::datasets::{Dataset, DatasetError, Split};
use crate::error::{Result, UnfatError};
use crate::lora::LoraSettings;
use crate::models::BaseModel;

/// Longest model-name suffix Together accepts
const MAX_SUFFIX_LEN: usize = 40;

/// Everything needed to upload data and start a Together fine-tune
#[derive(Clone, PartialEq)]
pub struct TogetherConfig {
    pub base_model: BaseModel,
    /// Local directory for merged splits, upload cache and job record
    pub output_dir: PathBuf,
    pub dataset: Dataset,
    pub settings: LoraSettings,
    pub api_key: String,
    /// Appended to the output model name
    pub suffix: Option<String>,
    /// Fraction of steps spent warming up the learning rate
    pub warmup_ratio: Option<f64>,
    pub base_url: String,
}

impl TogetherConfig {
    pub fn new(
        base_model: BaseModel,
        output_dir: impl Into<PathBuf>,
        dataset: Dataset,
        settings: LoraSettings,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_model,
            output_dir: output_dir.into(),
            dataset,
            settings,
            api_key: api_key.into(),
            suffix: None,
            warmup_ratio: None,
            base_url: TOGETHER_API_BASE.to_string(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn with_warmup_ratio(mut self, ratio: f64) -> Self {
        self.warmup_ratio = Some(ratio);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Check settings and options without touching the filesystem.
    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;
        self.dataset.validate()?;

        if self.api_key.trim().is_empty() {
            return Err(TogetherError::AuthRequired.into());
        }
        if let Some(suffix) = &self.suffix {
            validate_suffix(suffix)?;
        }
        if let Some(ratio) = self.warmup_ratio {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(TogetherError::InvalidOption {
                    field: "warmup_ratio".to_string(),
                    message: format!("{ratio} (expected 0.0..=1.0)"),
                }
                .into());
            }
        }
        Ok(())
    }

    /// HTTP client for this config's key and endpoint
    pub fn client(&self) -> std::result::Result<TogetherClient, TogetherError> {
        Ok(TogetherClient::new(self.api_key.clone())?.with_base_url(self.base_url.clone()))
    }

    /// Merge each split and upload it, reusing cached uploads of identical content.
    pub fn upload_files(&self) -> Result<UploadedFiles> {
        let client = self.client()?;
        self.upload_files_with(&client)
    }

    /// [`Self::upload_files`] against any backend.
    pub fn upload_files_with(&self, api: &dyn FineTuneApi) -> Result<UploadedFiles> {
        self.validate()?;
        self.dataset.check_files()?;
        ensure_dir(&self.output_dir)?;

        let mut cache = UploadCache::load(&self.output_dir)?;
        let train = self
            .upload_split(api, &mut cache, Split::Train)?
            .ok_or(DatasetError::NoTrainingData)?;
        let eval = self.upload_split(api, &mut cache, Split::Eval)?;

        Ok(UploadedFiles { train, eval })
    }

    fn upload_split(
        &self,
        api: &dyn FineTuneApi,
        cache: &mut UploadCache,
        split: Split,
    ) -> Result<Option<UploadedFile>> {
        let dest = self.output_dir.join(split.file_name());
        let Some(summary) = self.dataset.write_split(split, &dest)? else {
            return Ok(None);
        };
        let file_name = split.file_name().to_string();

        if let Some(hit) = cache.get(&self.base_url, &summary.sha256) {
            return Ok(Some(UploadedFile {
                id: hit.id.clone(),
                file_name: hit.file_name.clone(),
                sha256: summary.sha256,
                cached: true,
            }));
        }

        let remote = api.upload_file(&dest, &file_name)?;
        cache.insert(
            &self.base_url,
            &summary.sha256,
            CachedUpload {
                id: remote.id.clone(),
                file_name: file_name.clone(),
                uploaded_at: Utc::now(),
            },
        );
        cache.save(&self.output_dir)?;

        Ok(Some(UploadedFile {
            id: remote.id,
            file_name,
            sha256: summary.sha256,
            cached: false,
        }))
    }

    /// Request body for a job over `uploaded`
    pub fn request(&self, uploaded: &UploadedFiles) -> FineTuneRequest {
        let validation_file = uploaded.eval.as_ref().map(|f| f.id.clone());
        let n_evals = validation_file
            .as_ref()
            .and_then(|_| self.settings.total_evals());
        let tracks = self.settings.tracks_wandb();

        FineTuneRequest {
            training_file: uploaded.train.id.clone(),
            validation_file,
            model: self.base_model.together_model().to_string(),
            n_epochs: self.settings.num_epochs,
            learning_rate: self.settings.learning_rate,
            n_evals,
            warmup_ratio: self.warmup_ratio,
            lora: true,
            lora_r: self.settings.rank,
            lora_alpha: self.settings.alpha,
            lora_dropout: self.settings.dropout,
            lora_trainable_modules: "all-linear".to_string(),
            suffix: self.suffix.clone(),
            wandb_api_key: self
                .settings
                .wandb_api_key
                .clone()
                .filter(|_| tracks),
            wandb_project_name: self.settings.wandb_project.clone().filter(|_| tracks),
        }
    }

    /// Start a fine-tuning job over previously uploaded files.
    pub fn finetune(&self, uploaded: &UploadedFiles) -> Result<FineTuneJob> {
        let client = self.client()?;
        self.finetune_with(&client, uploaded)
    }

    /// [`Self::finetune`] against any backend. Writes `job.json`.
    pub fn finetune_with(
        &self,
        api: &dyn FineTuneApi,
        uploaded: &UploadedFiles,
    ) -> Result<FineTuneJob> {
        self.validate()?;
        let request = self.request(uploaded);
        let job = api.create_fine_tune(&request)?;

        ensure_dir(&self.output_dir)?;
        JobRecord::new(&job, &request.model, uploaded).save(&self.output_dir)?;
        Ok(job)
    }
}

impl fmt::Debug for TogetherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TogetherConfig")
            .field("base_model", &self.base_model)
            .field("output_dir", &self.output_dir)
            .field("dataset", &self.dataset)
            .field("settings", &self.settings)
            .field("suffix", &self.suffix)
            .field("warmup_ratio", &self.warmup_ratio)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Llama 3.1 8B Instruct reference model
pub fn llama_3_1_8b_together(
    output_dir: impl Into<PathBuf>,
    dataset: Dataset,
    settings: LoraSettings,
    api_key: impl Into<String>,
) -> TogetherConfig {
    TogetherConfig::new(BaseModel::Llama3_1_8b, output_dir, dataset, settings, api_key)
}

/// Llama 3.1 70B Instruct reference model
pub fn llama_3_1_70b_together(
    output_dir: impl Into<PathBuf>,
    dataset: Dataset,
    settings: LoraSettings,
    api_key: impl Into<String>,
) -> TogetherConfig {
    TogetherConfig::new(BaseModel::Llama3_1_70b, output_dir, dataset, settings, api_key)
}

pub(crate) fn validate_suffix(suffix: &str) -> std::result::Result<(), TogetherError> {
    let invalid = |message: String| TogetherError::InvalidOption {
        field: "suffix".to_string(),
        message,
    };
    if suffix.is_empty() || suffix.len() > MAX_SUFFIX_LEN {
        return Err(invalid(format!(
            "'{suffix}' must be 1-{MAX_SUFFIX_LEN} characters"
        )));
    }
    if let Some(bad) = suffix
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(invalid(format!("'{suffix}' contains '{bad}'")));
    }
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(UnfatError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    fs::create_dir_all(dir).map_err(|e| UnfatError::io(format!("creating {}", dir.display()), e))
}
