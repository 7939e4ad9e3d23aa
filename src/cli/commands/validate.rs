//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::{LogLevel, ValidateArgs};
use crate::datasets::Split;
use crate::manifest::{Manifest, Target};

/// Format model information as a string
pub fn format_model_info(manifest: &Manifest) -> String {
    let model = manifest.base_model;
    format!(
        "  Base model: {model}\n  HF repo: {}\n  Together model: {}",
        model.hf_repo(),
        model.together_model()
    )
}

/// Format dataset sources as a string
pub fn format_dataset_info(manifest: &Manifest) -> String {
    let mut lines = Vec::new();
    for split in [Split::Train, Split::Eval] {
        for source in manifest.dataset.sources(split) {
            lines.push(format!("  {split}: {}", source.path().display()));
        }
    }
    if !manifest.dataset.has_eval() {
        lines.push("  eval: none".to_string());
    }
    lines.join("\n")
}

/// Format LoRA settings as a string
pub fn format_lora_info(manifest: &Manifest) -> String {
    let lora = &manifest.lora;
    let mut lines = vec![
        "  LoRA:".to_string(),
        format!("    Rank: {}", lora.rank),
        format!("    Alpha: {}", lora.alpha),
        format!("    Dropout: {}", lora.dropout),
        format!("    Epochs: {}", lora.num_epochs),
        format!("    Learning rate: {}", lora.learning_rate),
    ];
    if let Some(evals) = lora.evals_per_epoch {
        lines.push(format!("    Evals per epoch: {evals}"));
    }
    if let Some(project) = &lora.wandb_project {
        lines.push(format!("    W&B project: {project}"));
    }
    lines.join("\n")
}

/// Format target options as a string
pub fn format_target_info(manifest: &Manifest) -> String {
    let mut lines = vec![format!("  Target: {}", manifest.target.name())];
    match &manifest.target {
        Target::Axolotl(target) => {
            lines.push(format!("    Warmup steps: {}", target.warmup_steps));
            if let Some(len) = target.sequence_len {
                lines.push(format!("    Sequence length: {len}"));
            }
        }
        Target::Together(target) => {
            lines.push(format!("    API key env: {}", target.api_key_env));
            if let Some(suffix) = &target.suffix {
                lines.push(format!("    Suffix: {suffix}"));
            }
            if let Some(url) = &target.base_url {
                lines.push(format!("    Base URL: {url}"));
            }
        }
    }
    lines.push(format!("  Output dir: {}", manifest.output_dir.display()));
    lines.join("\n")
}

/// Print detailed manifest summary
pub fn print_detailed_summary(manifest: &Manifest) {
    println!();
    println!("Manifest Summary:");
    println!("{}", format_model_info(manifest));
    println!();
    println!("{}", format_dataset_info(manifest));
    println!();
    println!("{}", format_lora_info(manifest));
    println!();
    println!("{}", format_target_info(manifest));
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Validating manifest: {}", args.config.display()),
    );

    let manifest = super::load(&args.config)?;
    manifest
        .dataset
        .check_files()
        .map_err(|e| format!("Validation failed: {e}"))?;

    if args.secrets {
        manifest
            .into_job()
            .map_err(|e| format!("Validation failed: {e}"))?;
        log(level, LogLevel::Verbose, "Secrets resolved");
    }

    log(level, LogLevel::Normal, "Manifest is valid");

    if args.detailed {
        print_detailed_summary(&manifest);
    }

    Ok(())
}
