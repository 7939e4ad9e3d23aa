//! Base model presets
//!
//! Each preset maps one logical model to the identifiers the training
//! targets expect.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported base models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseModel {
    #[serde(rename = "llama-3.1-8b")]
    Llama3_1_8b,
    #[serde(rename = "llama-3.1-70b")]
    Llama3_1_70b,
}

impl BaseModel {
    pub const ALL: [BaseModel; 2] = [BaseModel::Llama3_1_8b, BaseModel::Llama3_1_70b];

    /// Short name used in manifests
    pub fn name(&self) -> &'static str {
        match self {
            Self::Llama3_1_8b => "llama-3.1-8b",
            Self::Llama3_1_70b => "llama-3.1-70b",
        }
    }

    /// HuggingFace repository used by Axolotl
    pub fn hf_repo(&self) -> &'static str {
        match self {
            Self::Llama3_1_8b => "meta-llama/Llama-3.1-8B-Instruct",
            Self::Llama3_1_70b => "meta-llama/Llama-3.1-70B-Instruct",
        }
    }

    /// Together fine-tuning reference model
    pub fn together_model(&self) -> &'static str {
        match self {
            Self::Llama3_1_8b => "meta-llama/Meta-Llama-3.1-8B-Instruct-Reference",
            Self::Llama3_1_70b => "meta-llama/Meta-Llama-3.1-70B-Instruct-Reference",
        }
    }

    /// Axolotl chat template name
    pub fn chat_template(&self) -> &'static str {
        "llama3"
    }

    /// Default training sequence length
    pub fn sequence_len(&self) -> u32 {
        8192
    }

    /// Tokenizer end-of-text token, used as padding
    pub fn pad_token(&self) -> &'static str {
        "<|end_of_text|>"
    }
}

impl fmt::Display for BaseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BaseModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|m| m.name() == normalized)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(BaseModel::name).collect();
                format!("Unknown base model: {s}. Valid models: {}", known.join(", "))
            })
    }
}
