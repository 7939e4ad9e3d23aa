//! Manifest to runnable job

use super::schema::{Manifest, Target, TogetherTarget, DEFAULT_WANDB_KEY_ENV};
use super::validation::{ManifestError, ValidationResult};
use crate::axolotl::AxolotlConfig;
use crate::together::{TogetherClient, TogetherConfig, API_KEY_ENV};

/// A manifest with secrets resolved, ready to save or submit
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Axolotl(AxolotlConfig),
    Together(TogetherConfig),
}

impl Job {
    pub fn target_name(&self) -> &'static str {
        match self {
            Self::Axolotl(_) => "axolotl",
            Self::Together(_) => "together",
        }
    }
}

impl Manifest {
    /// Build the job, reading secrets from the process environment.
    pub fn into_job(&self) -> ValidationResult<Job> {
        self.into_job_with(&|var| std::env::var(var).ok())
    }

    /// Build the job, reading secrets through `env`.
    pub fn into_job_with(&self, env: &dyn Fn(&str) -> Option<String>) -> ValidationResult<Job> {
        let lookup = |var: &str| env(var).filter(|v| !v.trim().is_empty());

        let wandb_api_key = match (&self.lora.wandb_api_key_env, &self.lora.wandb_project) {
            (Some(var), _) => Some(lookup(var).ok_or_else(|| ManifestError::MissingSecret {
                var: var.clone(),
                purpose: "Weights & Biases tracking".to_string(),
            })?),
            (None, Some(_)) => lookup(DEFAULT_WANDB_KEY_ENV),
            (None, None) => None,
        };
        let settings = self.lora.settings(wandb_api_key);

        let job = match &self.target {
            Target::Axolotl(target) => {
                let mut config = AxolotlConfig::new(
                    self.base_model,
                    self.dataset.clone(),
                    settings,
                    target.warmup_steps,
                );
                if let Some(len) = target.sequence_len {
                    config = config.with_sequence_len(len);
                }
                if let Some(micro) = target.micro_batch_size {
                    config.micro_batch_size = micro;
                }
                if let Some(accum) = target.gradient_accumulation_steps {
                    config.gradient_accumulation_steps = accum;
                }
                Job::Axolotl(config)
            }
            Target::Together(target) => {
                let api_key = target.api_key_with(env)?;

                let mut config = TogetherConfig::new(
                    self.base_model,
                    self.output_dir.clone(),
                    self.dataset.clone(),
                    settings,
                    api_key,
                );
                config.suffix = target.suffix.clone();
                config.warmup_ratio = target.warmup_ratio;
                if let Some(url) = &target.base_url {
                    config = config.with_base_url(url.clone());
                }
                Job::Together(config)
            }
        };
        Ok(job)
    }
}

impl TogetherTarget {
    /// Resolve the API key from the process environment.
    pub fn api_key(&self) -> ValidationResult<String> {
        self.api_key_with(&|var| std::env::var(var).ok())
    }

    /// Resolve the API key through `env`. Only the default variable falls
    /// back to `~/.together/api_key`.
    pub fn api_key_with(&self, env: &dyn Fn(&str) -> Option<String>) -> ValidationResult<String> {
        env(&self.api_key_env)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| {
                (self.api_key_env == API_KEY_ENV)
                    .then(TogetherClient::api_key_from_file)
                    .flatten()
            })
            .ok_or_else(|| ManifestError::MissingSecret {
                var: self.api_key_env.clone(),
                purpose: "the Together API".to_string(),
            })
    }
}
