//! LoRA (Low-Rank Adaptation) hyperparameters
//!
//! Settings shared by every fine-tuning target: adapter shape (rank, alpha,
//! dropout), the training schedule, and experiment-tracking credentials.

mod error;
mod settings;

#[cfg(test)]
mod proptests;

pub use error::LoraError;
pub use settings::LoraSettings;
