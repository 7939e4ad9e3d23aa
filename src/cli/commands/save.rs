//! Save command implementation (Axolotl job directory)

use crate::cli::logging::log;
use crate::cli::{LogLevel, SaveArgs};
use crate::manifest::Job;

pub fn run_save(args: SaveArgs, level: LogLevel) -> Result<(), String> {
    let manifest = super::load(&args.config)?;
    let config = match manifest.into_job().map_err(|e| format!("Manifest error: {e}"))? {
        Job::Axolotl(config) => config,
        other => {
            return Err(format!(
                "Manifest '{}' targets {}; save only writes axolotl jobs",
                manifest.name,
                other.target_name()
            ))
        }
    };

    let output_dir = args.output_dir.unwrap_or(manifest.output_dir);
    log(
        level,
        LogLevel::Normal,
        &format!("Writing Axolotl job to: {}", output_dir.display()),
    );

    let saved = config
        .save(&output_dir)
        .map_err(|e| format!("Save failed: {e}"))?;

    log(
        level,
        LogLevel::Normal,
        &format!(
            "  train: {} conversation(s) -> {}",
            saved.train.conversations,
            saved.train.path.display()
        ),
    );
    if let Some(eval) = &saved.eval {
        log(
            level,
            LogLevel::Normal,
            &format!(
                "  eval: {} conversation(s) -> {}",
                eval.conversations,
                eval.path.display()
            ),
        );
    }
    log(
        level,
        LogLevel::Verbose,
        &format!("  train sha256: {}", saved.train.sha256),
    );
    if let Some(env_path) = &saved.env_path {
        log(
            level,
            LogLevel::Verbose,
            &format!("  W&B key written to {}", env_path.display()),
        );
    }
    log(
        level,
        LogLevel::Normal,
        &format!(
            "Config: {}\nRun: cd {} && axolotl train config.yaml",
            saved.config_path.display(),
            saved.dir.display()
        ),
    );

    Ok(())
}
