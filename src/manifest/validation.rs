//! Manifest Validation
//!
//! Catches malformed manifests at load time, before any file is written or
//! any request is sent.

use thiserror::Error;

use super::schema::{AxolotlTarget, Manifest, Target, TogetherTarget};
use crate::datasets::DatasetError;
use crate::lora::LoraError;

/// Validation result type
pub type ValidationResult<T> = Result<T, ManifestError>;

/// Manifest errors
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Unsupported unfat version: {0}. Supported versions: 1.0")]
    UnsupportedVersion(String),

    #[error("Empty required field: {0}")]
    EmptyRequiredField(String),

    #[error("Invalid range for {field}: {value} (expected {constraint})")]
    InvalidRange {
        field: String,
        value: String,
        constraint: String,
    },

    #[error("Invalid {field}: {message}")]
    InvalidOption { field: String, message: String },

    #[error("Environment variable {var} is not set (needed for {purpose})")]
    MissingSecret { var: String, purpose: String },

    #[error("Invalid lora section: {0}")]
    Lora(#[from] LoraError),

    #[error("Invalid dataset: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Failed to read manifest {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest {path}: {message}")]
    Parse { path: String, message: String },
}

/// Supported manifest versions
const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Longest sequence the presets support
const MAX_SEQUENCE_LEN: u32 = 131_072;

/// Upper bound for micro batch size and for gradient accumulation steps
const MAX_BATCH_FACTOR: u32 = 1024;

/// Validate a job manifest
///
/// Checks, in order:
/// 1. Version compatibility
/// 2. Required fields
/// 3. LoRA ranges
/// 4. Dataset structure
/// 5. Target-specific options
///
/// Dataset files are not opened here; see [`crate::datasets::Dataset::check_files`].
pub fn validate_manifest(manifest: &Manifest) -> ValidationResult<()> {
    validate_version(&manifest.unfat)?;
    validate_required_fields(manifest)?;

    manifest.lora.settings(None).validate()?;
    if let Some(var) = &manifest.lora.wandb_api_key_env {
        if manifest.lora.wandb_project.is_none() {
            return Err(LoraError::WandbKeyWithoutProject.into());
        }
        validate_env_name(var, "lora.wandb_api_key_env")?;
    }

    manifest.dataset.validate()?;

    match &manifest.target {
        Target::Axolotl(axolotl) => validate_axolotl(axolotl),
        Target::Together(together) => validate_together(together),
    }
}

fn validate_version(version: &str) -> ValidationResult<()> {
    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(ManifestError::UnsupportedVersion(version.to_string()));
    }
    Ok(())
}

fn validate_required_fields(manifest: &Manifest) -> ValidationResult<()> {
    if manifest.name.trim().is_empty() {
        return Err(ManifestError::EmptyRequiredField("name".to_string()));
    }
    if manifest.output_dir.as_os_str().is_empty() {
        return Err(ManifestError::EmptyRequiredField("output_dir".to_string()));
    }
    Ok(())
}

/// Validate that an optional u32, if present, is non-zero (>= 1)
fn validate_nonzero_u32(value: Option<u32>, field: &str) -> ValidationResult<()> {
    if let Some(0) = value {
        return Err(ManifestError::InvalidRange {
            field: field.to_string(),
            value: "0".to_string(),
            constraint: ">= 1".to_string(),
        });
    }
    Ok(())
}

fn validate_env_name(var: &str, field: &str) -> ValidationResult<()> {
    let valid = !var.is_empty()
        && !var.starts_with(|c: char| c.is_ascii_digit())
        && var.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(ManifestError::InvalidOption {
            field: field.to_string(),
            message: format!("'{var}' is not an environment variable name"),
        });
    }
    Ok(())
}

fn validate_axolotl(target: &AxolotlTarget) -> ValidationResult<()> {
    validate_bounded_u32(
        target.sequence_len,
        MAX_SEQUENCE_LEN,
        "target.axolotl.sequence_len",
    )?;
    validate_bounded_u32(
        target.micro_batch_size,
        MAX_BATCH_FACTOR,
        "target.axolotl.micro_batch_size",
    )?;
    validate_bounded_u32(
        target.gradient_accumulation_steps,
        MAX_BATCH_FACTOR,
        "target.axolotl.gradient_accumulation_steps",
    )?;
    Ok(())
}

fn validate_bounded_u32(value: Option<u32>, max: u32, field: &str) -> ValidationResult<()> {
    validate_nonzero_u32(value, field)?;
    match value {
        Some(v) if v > max => Err(ManifestError::InvalidRange {
            field: field.to_string(),
            value: v.to_string(),
            constraint: format!("<= {max}"),
        }),
        _ => Ok(()),
    }
}

fn validate_together(target: &TogetherTarget) -> ValidationResult<()> {
    validate_env_name(&target.api_key_env, "target.together.api_key_env")?;

    if let Some(suffix) = &target.suffix {
        crate::together::validate_suffix(suffix).map_err(|e| ManifestError::InvalidOption {
            field: "target.together.suffix".to_string(),
            message: e.to_string(),
        })?;
    }

    if let Some(ratio) = target.warmup_ratio {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ManifestError::InvalidRange {
                field: "target.together.warmup_ratio".to_string(),
                value: ratio.to_string(),
                constraint: "in [0, 1]".to_string(),
            });
        }
    }

    if let Some(url) = &target.base_url {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ManifestError::InvalidOption {
                field: "target.together.base_url".to_string(),
                message: format!("'{url}' is not an http(s) URL"),
            });
        }
    }
    Ok(())
}
