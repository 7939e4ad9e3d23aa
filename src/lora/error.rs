//! LoRA settings validation errors

/// Validation error for [`super::LoraSettings`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoraError {
    #[error("Invalid LoRA rank: {0} (must be > 0 and <= 1024)")]
    InvalidRank(u32),

    #[error("Invalid LoRA alpha: {0} (must be > 0)")]
    InvalidAlpha(u32),

    #[error("Invalid LoRA dropout: {0} (must be in [0.0, 1.0))")]
    InvalidDropout(f64),

    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(u32),

    #[error("Invalid learning rate: {0} (must be > 0.0 and <= 1.0)")]
    InvalidLearningRate(f64),

    #[error("Invalid evals per epoch: {0} (must be > 0)")]
    InvalidEvalsPerEpoch(u32),

    #[error("Weights & Biases project name cannot be empty")]
    EmptyWandbProject,

    #[error("Weights & Biases API key given without a project name")]
    WandbKeyWithoutProject,
}
