//! LoRA training settings

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::LoraError;

/// Largest rank accepted by either target.
const MAX_RANK: u32 = 1024;

/// LoRA adapter shape, training schedule, and experiment tracking.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraSettings {
    /// Rank of the low-rank update matrices (r)
    pub rank: u32,

    /// Scaling numerator (alpha); effective scale is alpha / rank
    pub alpha: u32,

    /// Dropout applied to the LoRA branch
    pub dropout: f64,

    /// Passes over the training split
    pub num_epochs: u32,

    /// Peak learning rate
    pub learning_rate: f64,

    /// Evaluation runs per epoch (requires an eval split to matter)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evals_per_epoch: Option<u32>,

    /// Weights & Biases project name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wandb_project: Option<String>,

    /// Weights & Biases API key
    #[serde(skip)]
    pub wandb_api_key: Option<String>,
}

impl LoraSettings {
    /// Create settings with no eval schedule and no experiment tracking.
    pub fn new(rank: u32, alpha: u32, dropout: f64, num_epochs: u32, learning_rate: f64) -> Self {
        Self {
            rank,
            alpha,
            dropout,
            num_epochs,
            learning_rate,
            evals_per_epoch: None,
            wandb_project: None,
            wandb_api_key: None,
        }
    }

    /// Set evaluation frequency
    pub fn with_evals_per_epoch(mut self, evals: u32) -> Self {
        self.evals_per_epoch = Some(evals);
        self
    }

    /// Enable Weights & Biases tracking
    pub fn with_wandb(mut self, project: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.wandb_project = Some(project.into());
        self.wandb_api_key = Some(api_key.into());
        self
    }

    /// Check every field against its accepted range.
    pub fn validate(&self) -> Result<(), LoraError> {
        if self.rank == 0 || self.rank > MAX_RANK {
            return Err(LoraError::InvalidRank(self.rank));
        }
        if self.alpha == 0 {
            return Err(LoraError::InvalidAlpha(self.alpha));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(LoraError::InvalidDropout(self.dropout));
        }
        if self.num_epochs == 0 {
            return Err(LoraError::InvalidEpochs(self.num_epochs));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(LoraError::InvalidLearningRate(self.learning_rate));
        }
        if let Some(evals) = self.evals_per_epoch {
            if evals == 0 {
                return Err(LoraError::InvalidEvalsPerEpoch(evals));
            }
        }
        match (&self.wandb_project, &self.wandb_api_key) {
            (Some(project), _) if project.trim().is_empty() => Err(LoraError::EmptyWandbProject),
            (None, Some(_)) => Err(LoraError::WandbKeyWithoutProject),
            _ => Ok(()),
        }
    }

    /// Total evaluation runs across the whole job.
    #[must_use]
    pub fn total_evals(&self) -> Option<u32> {
        self.evals_per_epoch
            .map(|per_epoch| per_epoch.saturating_mul(self.num_epochs))
    }

    /// Effective LoRA scale (alpha / rank)
    #[must_use]
    pub fn scaling(&self) -> f64 {
        f64::from(self.alpha) / f64::from(self.rank.max(1))
    }

    /// Whether both a project and a key are available.
    #[must_use]
    pub fn tracks_wandb(&self) -> bool {
        self.wandb_project.is_some() && self.wandb_api_key.is_some()
    }
}

impl fmt::Debug for LoraSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoraSettings")
            .field("rank", &self.rank)
            .field("alpha", &self.alpha)
            .field("dropout", &self.dropout)
            .field("num_epochs", &self.num_epochs)
            .field("learning_rate", &self.learning_rate)
            .field("evals_per_epoch", &self.evals_per_epoch)
            .field("wandb_project", &self.wandb_project)
            .field(
                "wandb_api_key",
                &self.wandb_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
