//! Info command implementation

use crate::cli::logging::log;
use crate::cli::{InfoArgs, LogLevel, OutputFormat};
use crate::manifest::Manifest;

/// Summary lines for text output
pub fn format_info(manifest: &Manifest) -> String {
    let settings = manifest.lora.settings(None);
    let mut lines = vec![format!("Name: {}", manifest.name)];
    if let Some(description) = &manifest.description {
        lines.push(format!("Description: {description}"));
    }
    lines.push(format!(
        "Model: {} ({})",
        manifest.base_model,
        manifest.base_model.hf_repo()
    ));
    lines.push(format!(
        "Dataset: {} train file(s), {} eval file(s)",
        manifest.dataset.train.len(),
        manifest.dataset.eval.len()
    ));
    lines.push(format!(
        "LoRA: r={} alpha={} (scale {:.3}) dropout={}",
        settings.rank,
        settings.alpha,
        settings.scaling(),
        settings.dropout
    ));
    lines.push(format!(
        "Epochs: {} (lr={})",
        settings.num_epochs, settings.learning_rate
    ));
    if let Some(total) = settings.total_evals() {
        lines.push(format!("Evaluations: {total}"));
    }
    if let Some(project) = &settings.wandb_project {
        lines.push(format!("W&B project: {project}"));
    }
    lines.push(format!("Target: {}", manifest.target.name()));
    lines.push(format!("Output dir: {}", manifest.output_dir.display()));
    lines.join("\n")
}

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let manifest = super::load(&args.config)?;

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, "Manifest Info:");
            println!();
            println!("{}", format_info(&manifest));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&manifest)
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&manifest)
                .map_err(|e| format!("YAML serialization error: {e}"))?;
            println!("{yaml}");
        }
    }

    Ok(())
}
