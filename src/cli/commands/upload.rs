//! Upload command implementation

use crate::cli::logging::log;
use crate::cli::{LogLevel, UploadArgs};
use crate::together::{UploadedFile, UploadedFiles};

/// One line per uploaded split
pub fn format_upload(file: &UploadedFile) -> String {
    let source = if file.cached { " (cached)" } else { "" };
    format!("  {}: {}{source}", file.file_name, file.id)
}

pub fn report_uploads(level: LogLevel, uploaded: &UploadedFiles) {
    log(level, LogLevel::Normal, &format_upload(&uploaded.train));
    if let Some(eval) = &uploaded.eval {
        log(level, LogLevel::Normal, &format_upload(eval));
    }
    log(
        level,
        LogLevel::Verbose,
        &format!("  train sha256: {}", uploaded.train.sha256),
    );
}

pub fn run_upload(args: UploadArgs, level: LogLevel) -> Result<(), String> {
    let manifest = super::load(&args.config)?;
    let config = super::together_config(&manifest)?;

    log(
        level,
        LogLevel::Normal,
        &format!("Uploading dataset for '{}' to {}", manifest.name, config.base_url),
    );
    let uploaded = config
        .upload_files()
        .map_err(|e| format!("Upload failed: {e}"))?;
    report_uploads(level, &uploaded);

    Ok(())
}
