//! Declarative job manifests
//!
//! A manifest is a YAML file describing one fine-tuning job:
//!
//! ```yaml
//! unfat: "1.0"
//! name: json-fix
//! output_dir: output
//! base_model: llama-3.1-8b
//! dataset:
//!   train: [data/train.jsonl]
//!   eval: [data/eval.jsonl]
//! lora:
//!   rank: 32
//!   alpha: 16
//!   dropout: 0.01
//!   num_epochs: 2
//!   evals_per_epoch: 10
//!   learning_rate: 4.0e-4
//!   wandb_project: json-fix
//!   wandb_api_key_env: WANDB_API_KEY
//! target:
//!   axolotl:
//!     warmup_steps: 10
//! ```
//!
//! Secrets never appear in the file; they are named by environment variable
//! and resolved when the manifest is turned into a [`Job`].

mod job;
mod loader;
mod schema;
mod templates;
mod validation;


pub use job::Job;
pub use loader::{load_manifest, parse_manifest, save_manifest};
pub use schema::{
    AxolotlTarget, LoraSection, Manifest, Target, TogetherTarget, DEFAULT_WANDB_KEY_ENV,
};
pub use templates::{generate_manifest, generate_yaml, Template};
pub use validation::{validate_manifest, ManifestError, ValidationResult};
