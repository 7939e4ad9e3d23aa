//! Finetune command implementation (upload, then submit)

use crate::cli::logging::log;
use crate::cli::{FinetuneArgs, LogLevel};
use crate::together::{FineTuneApi, FineTuneJob, TogetherConfig, UploadedFile, UploadedFiles};

const REDACTED: &str = "<redacted>";

/// Request body as it would be sent, with placeholder file ids and no secrets
pub fn preview_request(config: &TogetherConfig) -> Result<String, String> {
    let placeholder = |name: &str| UploadedFile {
        id: format!("<{name}>"),
        file_name: name.to_string(),
        sha256: String::new(),
        cached: false,
    };
    let uploaded = UploadedFiles {
        train: placeholder("train.jsonl"),
        eval: config
            .dataset
            .has_eval()
            .then(|| placeholder("eval.jsonl")),
    };

    let mut request = config.request(&uploaded);
    if request.wandb_api_key.is_some() {
        request.wandb_api_key = Some(REDACTED.to_string());
    }
    serde_json::to_string_pretty(&request).map_err(|e| format!("JSON serialization error: {e}"))
}

/// Upload both splits and start the job
pub fn submit(
    config: &TogetherConfig,
    api: &dyn FineTuneApi,
    level: LogLevel,
) -> Result<FineTuneJob, String> {
    let uploaded = config
        .upload_files_with(api)
        .map_err(|e| format!("Upload failed: {e}"))?;
    super::upload::report_uploads(level, &uploaded);

    config
        .finetune_with(api, &uploaded)
        .map_err(|e| format!("Fine-tune failed: {e}"))
}

pub fn run_finetune(args: FinetuneArgs, level: LogLevel) -> Result<(), String> {
    let manifest = super::load(&args.config)?;
    let config = super::together_config(&manifest)?;

    if args.dry_run {
        config
            .validate()
            .map_err(|e| format!("Validation failed: {e}"))?;
        config
            .dataset
            .check_files()
            .map_err(|e| format!("Validation failed: {e}"))?;
        log(level, LogLevel::Normal, "Dry run: nothing uploaded or submitted");
        println!("{}", preview_request(&config)?);
        return Ok(());
    }

    let client = config.client().map_err(|e| format!("Together error: {e}"))?;
    log(
        level,
        LogLevel::Normal,
        &format!("Starting fine-tune for '{}'", manifest.name),
    );
    let job = submit(&config, &client, level)?;

    log(
        level,
        LogLevel::Normal,
        &format!("Job {} submitted ({})", job.id, job.status),
    );
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Job record: {}",
            crate::together::JobRecord::path(&config.output_dir).display()
        ),
    );

    Ok(())
}
