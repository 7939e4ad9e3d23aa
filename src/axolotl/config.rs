//! Axolotl job configuration

use crate::datasets::Dataset;
use crate::lora::LoraSettings;
use crate::models::BaseModel;

/// Default per-device batch size
const DEFAULT_MICRO_BATCH_SIZE: u32 = 2;

/// Default gradient accumulation steps (effective batch 8)
const DEFAULT_GRADIENT_ACCUMULATION: u32 = 4;

/// Everything needed to write an Axolotl job directory
#[derive(Debug, Clone, PartialEq)]
pub struct AxolotlConfig {
    pub base_model: BaseModel,
    pub dataset: Dataset,
    pub settings: LoraSettings,
    pub warmup_steps: u32,
    /// Overrides the preset's sequence length
    pub sequence_len: Option<u32>,
    pub micro_batch_size: u32,
    pub gradient_accumulation_steps: u32,
}

impl AxolotlConfig {
    pub fn new(
        base_model: BaseModel,
        dataset: Dataset,
        settings: LoraSettings,
        warmup_steps: u32,
    ) -> Self {
        Self {
            base_model,
            dataset,
            settings,
            warmup_steps,
            sequence_len: None,
            micro_batch_size: DEFAULT_MICRO_BATCH_SIZE,
            gradient_accumulation_steps: DEFAULT_GRADIENT_ACCUMULATION,
        }
    }

    pub fn with_sequence_len(mut self, len: u32) -> Self {
        self.sequence_len = Some(len);
        self
    }

    pub fn with_batching(mut self, micro_batch_size: u32, gradient_accumulation_steps: u32) -> Self {
        self.micro_batch_size = micro_batch_size;
        self.gradient_accumulation_steps = gradient_accumulation_steps;
        self
    }

    /// Sequence length written to the config
    pub fn effective_sequence_len(&self) -> u32 {
        self.sequence_len
            .unwrap_or_else(|| self.base_model.sequence_len())
    }

    /// Samples consumed per optimizer step on one device, saturating at
    /// `u32::MAX`
    pub fn effective_batch_size(&self) -> u32 {
        self.micro_batch_size
            .saturating_mul(self.gradient_accumulation_steps)
    }
}

/// Llama 3.1 8B Instruct with LoRA on every linear layer
pub fn llama_3_1_8b_axolotl(
    dataset: Dataset,
    settings: LoraSettings,
    warmup_steps: u32,
) -> AxolotlConfig {
    AxolotlConfig::new(BaseModel::Llama3_1_8b, dataset, settings, warmup_steps)
}

/// Llama 3.1 70B Instruct with LoRA on every linear layer
pub fn llama_3_1_70b_axolotl(
    dataset: Dataset,
    settings: LoraSettings,
    warmup_steps: u32,
) -> AxolotlConfig {
    AxolotlConfig::new(BaseModel::Llama3_1_70b, dataset, settings, warmup_steps)
        .with_batching(1, 8)
}
