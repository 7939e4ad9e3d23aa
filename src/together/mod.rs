//! Together target
//!
//! Uploads merged train/eval JSONL files to Together and starts a LoRA
//! fine-tuning job over them.
//!
//! # Example
//!
//! ```no_run
//! use unfat::datasets::{Dataset, JsonlConvos};
//! use unfat::lora::LoraSettings;
//! use unfat::together::llama_3_1_8b_together;
//!
//! let config = llama_3_1_8b_together(
//!     "output",
//!     Dataset::new(
//!         vec![JsonlConvos::new("data/train.jsonl")],
//!         vec![JsonlConvos::new("data/eval.jsonl")],
//!     ),
//!     LoraSettings::new(32, 16, 0.01, 8, 4e-4),
//!     std::env::var("TOGETHER_API_KEY").unwrap_or_default(),
//! );
//! let uploaded = config.upload_files()?;
//! let job = config.finetune(&uploaded)?;
//! println!("started {}", job.id);
//! # Ok::<(), unfat::UnfatError>(())
//! ```

mod cache;
mod client;
mod config;
mod error;
mod types;

#[cfg(test)]
mod tests;

pub use cache::{CachedUpload, JobRecord, UploadCache, JOB_RECORD_FILE, UPLOAD_CACHE_FILE};
pub use client::{FineTuneApi, RetryPolicy, TogetherClient, API_KEY_ENV, TOGETHER_API_BASE};
pub use config::{llama_3_1_70b_together, llama_3_1_8b_together, TogetherConfig};
pub use error::TogetherError;
pub use types::{FileObject, FineTuneJob, FineTuneRequest, JobStatus, UploadedFile, UploadedFiles};

pub(crate) use config::validate_suffix;
