//! Job manifest schema
//!
//! # Required Fields
//! - `unfat`: Manifest format version (must be "1.0")
//! - `name`: Job identifier
//! - `base_model`, `dataset`, `lora`, `target`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::datasets::Dataset;
use crate::lora::LoraSettings;
use crate::models::BaseModel;

/// Default environment variable for the Weights & Biases key
pub const DEFAULT_WANDB_KEY_ENV: &str = "WANDB_API_KEY";

/// Complete job manifest (root structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version (required)
    pub unfat: String,

    /// Job name (required)
    pub name: String,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Where merged data, configs and job records are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Base model preset
    pub base_model: BaseModel,

    /// Train/eval JSONL sources
    pub dataset: Dataset,

    /// LoRA hyperparameters
    pub lora: LoraSection,

    /// Where the job runs, written as a single-key map (`target: { axolotl: ... }`)
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub target: Target,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// LoRA hyperparameters as written in a manifest
///
/// Same fields as [`LoraSettings`], except the W&B key is named by an
/// environment variable instead of stored inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraSection {
    pub rank: u32,
    pub alpha: u32,
    #[serde(default)]
    pub dropout: f64,
    pub num_epochs: u32,
    pub learning_rate: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evals_per_epoch: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wandb_project: Option<String>,

    /// Environment variable holding the W&B key. When set, the variable must exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wandb_api_key_env: Option<String>,
}

impl LoraSection {
    /// Settings with the given (already resolved) W&B key
    pub fn settings(&self, wandb_api_key: Option<String>) -> LoraSettings {
        LoraSettings {
            rank: self.rank,
            alpha: self.alpha,
            dropout: self.dropout,
            num_epochs: self.num_epochs,
            learning_rate: self.learning_rate,
            evals_per_epoch: self.evals_per_epoch,
            wandb_project: self.wandb_project.clone(),
            wandb_api_key,
        }
    }
}

/// Training target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Local job directory for Axolotl
    Axolotl(AxolotlTarget),
    /// Hosted fine-tune on Together
    Together(TogetherTarget),
}

impl Target {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Axolotl(_) => "axolotl",
            Self::Together(_) => "together",
        }
    }
}

/// Axolotl-specific options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxolotlTarget {
    #[serde(default)]
    pub warmup_steps: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_len: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub micro_batch_size: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient_accumulation_steps: Option<u32>,
}

/// Together-specific options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TogetherTarget {
    /// Environment variable holding the API key
    #[serde(default = "default_together_key_env")]
    pub api_key_env: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup_ratio: Option<f64>,

    /// API root override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for TogetherTarget {
    fn default() -> Self {
        Self {
            api_key_env: default_together_key_env(),
            suffix: None,
            warmup_ratio: None,
            base_url: None,
        }
    }
}

fn default_together_key_env() -> String {
    crate::together::API_KEY_ENV.to_string()
}
