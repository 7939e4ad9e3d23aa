//! Axolotl target
//!
//! Builds a self-contained job directory for a local Axolotl run:
//!
//! ```text
//! output/
//!   config.yaml        # Axolotl config, dataset paths relative to this dir
//!   data/train.jsonl   # merged train split
//!   data/eval.jsonl    # merged eval split (when present)
//!   .env               # WANDB_API_KEY (when tracking is enabled)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use unfat::axolotl::llama_3_1_8b_axolotl;
//! use unfat::datasets::{Dataset, JsonlConvos};
//! use unfat::lora::LoraSettings;
//!
//! let config = llama_3_1_8b_axolotl(
//!     Dataset::new(
//!         vec![JsonlConvos::new("data/train.jsonl")],
//!         vec![JsonlConvos::new("data/eval.jsonl")],
//!     ),
//!     LoraSettings::new(32, 16, 0.01, 2, 4e-4).with_evals_per_epoch(10),
//!     10,
//! );
//! let saved = config.save("output")?;
//! println!("wrote {}", saved.config_path.display());
//! # Ok::<(), unfat::UnfatError>(())
//! ```

mod config;
mod save;
mod yaml;

#[cfg(test)]
mod tests;

pub use config::{llama_3_1_70b_axolotl, llama_3_1_8b_axolotl, AxolotlConfig};
pub use save::SavedJob;
pub use yaml::{AxolotlDataset, AxolotlYaml};
