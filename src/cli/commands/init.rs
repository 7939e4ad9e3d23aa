//! Init command implementation

use crate::cli::logging::log;
use crate::cli::{InitArgs, LogLevel};
use crate::manifest::generate_yaml;

pub fn run_init(args: InitArgs, level: LogLevel) -> Result<(), String> {
    if args.name.trim().is_empty() {
        return Err("Job name must not be empty".to_string());
    }

    let yaml = generate_yaml(args.template, &args.name, args.model)
        .map_err(|e| format!("Failed to generate manifest: {e}"))?;

    match &args.output {
        Some(path) => {
            if path.exists() && !args.force {
                return Err(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                ));
            }
            std::fs::write(path, &yaml)
                .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
            log(
                level,
                LogLevel::Normal,
                &format!("Created manifest: {}", path.display()),
            );
            log(
                level,
                LogLevel::Verbose,
                "Edit dataset paths and secrets, then run: unfat validate <MANIFEST>",
            );
        }
        None => print!("{yaml}"),
    }

    Ok(())
}
