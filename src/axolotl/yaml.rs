//! Axolotl `config.yaml` schema
//!
//! Only the keys this crate writes. Field names match Axolotl's.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::config::AxolotlConfig;

/// One dataset entry in `datasets` / `test_datasets`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxolotlDataset {
    pub path: String,
    pub ds_type: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub field_messages: String,
    pub roles_to_train: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<String>,
}

impl AxolotlDataset {
    fn chat_jsonl(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ds_type: "json".to_string(),
            kind: "chat_template".to_string(),
            field_messages: "messages".to_string(),
            roles_to_train: vec!["assistant".to_string()],
            split: None,
        }
    }
}

/// Serializable Axolotl config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxolotlYaml {
    pub base_model: String,
    pub chat_template: String,
    pub load_in_8bit: bool,
    pub load_in_4bit: bool,
    pub strict: bool,

    pub datasets: Vec<AxolotlDataset>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_datasets: Vec<AxolotlDataset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val_set_size: Option<f64>,
    pub dataset_prepared_path: String,
    pub output_dir: String,

    pub adapter: String,
    pub lora_r: u32,
    pub lora_alpha: u32,
    pub lora_dropout: f64,
    pub lora_target_linear: bool,

    pub sequence_len: u32,
    pub sample_packing: bool,
    pub eval_sample_packing: bool,
    pub pad_to_sequence_len: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wandb_project: Option<String>,

    pub gradient_accumulation_steps: u32,
    pub micro_batch_size: u32,
    pub num_epochs: u32,
    pub optimizer: String,
    pub lr_scheduler: String,
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub warmup_steps: u32,

    pub bf16: String,
    pub tf32: bool,
    pub gradient_checkpointing: bool,
    pub flash_attention: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evals_per_epoch: Option<u32>,
    pub saves_per_epoch: u32,
    pub logging_steps: u32,

    pub special_tokens: BTreeMap<String, String>,
}

impl AxolotlYaml {
    /// Build the on-disk config. `train_path`/`eval_path` are relative to the
    /// job directory.
    pub fn from_config(config: &AxolotlConfig, train_path: &str, eval_path: Option<&str>) -> Self {
        let model = config.base_model;
        let settings = &config.settings;

        let test_datasets: Vec<_> = eval_path
            .map(|path| {
                let mut ds = AxolotlDataset::chat_jsonl(path);
                ds.split = Some("train".to_string());
                ds
            })
            .into_iter()
            .collect();
        let has_eval = !test_datasets.is_empty();

        let mut special_tokens = BTreeMap::new();
        special_tokens.insert("pad_token".to_string(), model.pad_token().to_string());

        Self {
            base_model: model.hf_repo().to_string(),
            chat_template: model.chat_template().to_string(),
            load_in_8bit: false,
            load_in_4bit: false,
            strict: false,

            datasets: vec![AxolotlDataset::chat_jsonl(train_path)],
            test_datasets,
            val_set_size: if has_eval { None } else { Some(0.0) },
            dataset_prepared_path: "last_run_prepared".to_string(),
            output_dir: "./lora-out".to_string(),

            adapter: "lora".to_string(),
            lora_r: settings.rank,
            lora_alpha: settings.alpha,
            lora_dropout: settings.dropout,
            lora_target_linear: true,

            sequence_len: config.effective_sequence_len(),
            sample_packing: true,
            eval_sample_packing: false,
            pad_to_sequence_len: true,

            wandb_project: settings.wandb_project.clone(),

            gradient_accumulation_steps: config.gradient_accumulation_steps,
            micro_batch_size: config.micro_batch_size,
            num_epochs: settings.num_epochs,
            optimizer: "adamw_torch_fused".to_string(),
            lr_scheduler: "cosine".to_string(),
            learning_rate: settings.learning_rate,
            weight_decay: 0.0,
            warmup_steps: config.warmup_steps,

            bf16: "auto".to_string(),
            tf32: false,
            gradient_checkpointing: true,
            flash_attention: true,

            evals_per_epoch: if has_eval {
                settings.evals_per_epoch
            } else {
                None
            },
            saves_per_epoch: 1,
            logging_steps: 1,

            special_tokens,
        }
    }
}
