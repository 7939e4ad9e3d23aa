//! Starter manifests for `unfat init`

use std::path::PathBuf;

use super::schema::{
    AxolotlTarget, LoraSection, Manifest, Target, TogetherTarget, DEFAULT_WANDB_KEY_ENV,
};
use super::validation::{ManifestError, ValidationResult};
use crate::datasets::{Dataset, JsonlConvos};
use crate::models::BaseModel;

/// Template type for initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Local Axolotl job directory
    Axolotl,
    /// Hosted Together fine-tune
    Together,
}

impl std::str::FromStr for Template {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "axolotl" => Ok(Self::Axolotl),
            "together" => Ok(Self::Together),
            _ => Err(format!(
                "Unknown template: {s}. Valid templates: axolotl, together"
            )),
        }
    }
}

/// Generate a manifest from a template
pub fn generate_manifest(template: Template, name: &str, base_model: BaseModel) -> Manifest {
    let (num_epochs, evals_per_epoch, target) = match template {
        Template::Axolotl => (
            2,
            Some(10),
            Target::Axolotl(AxolotlTarget {
                warmup_steps: 10,
                ..Default::default()
            }),
        ),
        Template::Together => (8, None, Target::Together(TogetherTarget::default())),
    };

    Manifest {
        unfat: "1.0".to_string(),
        name: name.to_string(),
        description: Some("LoRA fine-tune over JSONL conversations".to_string()),
        output_dir: PathBuf::from("output"),
        base_model,
        dataset: Dataset::new(
            vec![JsonlConvos::new("data/train.jsonl")],
            vec![JsonlConvos::new("data/eval.jsonl")],
        ),
        lora: LoraSection {
            rank: 32,
            alpha: 16,
            dropout: 0.01,
            num_epochs,
            learning_rate: 4e-4,
            evals_per_epoch,
            wandb_project: Some(name.to_string()),
            wandb_api_key_env: Some(DEFAULT_WANDB_KEY_ENV.to_string()),
        },
        target,
    }
}

/// Generate YAML text from a template
pub fn generate_yaml(
    template: Template,
    name: &str,
    base_model: BaseModel,
) -> ValidationResult<String> {
    let manifest = generate_manifest(template, name, base_model);
    serde_yaml::to_string(&manifest).map_err(|e| ManifestError::Parse {
        path: "<template>".to_string(),
        message: e.to_string(),
    })
}
