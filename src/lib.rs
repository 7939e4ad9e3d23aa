//! LoRA fine-tuning jobs over JSONL conversation datasets.
//!
//! This crate provides tools for:
//! - Validating LoRA hyperparameters ([`lora`])
//! - Reading and merging JSONL conversation files ([`datasets`])
//! - Writing Axolotl job directories ([`axolotl`])
//! - Uploading data and starting fine-tunes on Together ([`together`])
//! - Describing a whole job in one YAML manifest ([`manifest`])
//!
//! # Example
//!
//! ```no_run
//! use unfat::axolotl::llama_3_1_8b_axolotl;
//! use unfat::datasets::{Dataset, JsonlConvos};
//! use unfat::lora::LoraSettings;
//!
//! let dataset = Dataset::new(
//!     vec![JsonlConvos::new("data/train.jsonl")],
//!     vec![JsonlConvos::new("data/eval.jsonl")],
//! );
//! let settings = LoraSettings::new(32, 16, 0.01, 2, 4e-4).with_evals_per_epoch(10);
//! llama_3_1_8b_axolotl(dataset, settings, 10).save("output")?;
//! # Ok::<(), unfat::UnfatError>(())
//! ```

pub mod axolotl;
pub mod cli;
pub mod datasets;
pub mod error;
pub mod lora;
pub mod manifest;
pub mod models;
pub mod together;

pub use error::{Result, UnfatError};
