//! CLI command implementations

mod cancel;
mod finetune;
mod info;
mod init;
mod save;
mod stats;
mod status;
mod upload;
mod validate;


use std::path::{Path, PathBuf};

use crate::cli::{Cli, Command, JobSelector, LogLevel};
use crate::manifest::{load_manifest, Job, Manifest, Target};
use crate::together::{FineTuneJob, JobRecord, TogetherClient, TogetherConfig};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.verbose, cli.quiet);

    match cli.command {
        Command::Validate(args) => validate::run_validate(args, log_level),
        Command::Info(args) => info::run_info(args, log_level),
        Command::Init(args) => init::run_init(args, log_level),
        Command::Stats(args) => stats::run_stats(args, log_level),
        Command::Save(args) => save::run_save(args, log_level),
        Command::Upload(args) => upload::run_upload(args, log_level),
        Command::Finetune(args) => finetune::run_finetune(args, log_level),
        Command::Status(args) => status::run_status(args, log_level),
        Command::Cancel(args) => cancel::run_cancel(args, log_level),
    }
}

fn load(path: &Path) -> Result<Manifest, String> {
    load_manifest(path).map_err(|e| format!("Manifest error: {e}"))
}

/// Resolve secrets and require a Together target
fn together_config(manifest: &Manifest) -> Result<TogetherConfig, String> {
    match manifest.into_job().map_err(|e| format!("Manifest error: {e}"))? {
        Job::Together(config) => Ok(config),
        other => Err(format!(
            "Manifest '{}' targets {}, not together",
            manifest.name,
            other.target_name()
        )),
    }
}

/// Client and job id for `status` / `cancel`, plus the record directory when
/// the job came from a manifest. Only the Together key is resolved.
struct JobTarget {
    client: TogetherClient,
    job_id: String,
    record_dir: Option<PathBuf>,
}

fn job_target(selector: &JobSelector) -> Result<JobTarget, String> {
    match (&selector.config, &selector.job_id) {
        (_, Some(job_id)) => {
            let client = TogetherClient::from_env().map_err(|e| format!("Together error: {e}"))?;
            Ok(JobTarget {
                client,
                job_id: job_id.clone(),
                record_dir: None,
            })
        }
        (Some(path), None) => {
            let manifest = load(path)?;
            let Target::Together(target) = &manifest.target else {
                return Err(format!(
                    "Manifest '{}' targets {}, not together",
                    manifest.name,
                    manifest.target.name()
                ));
            };
            let record = JobRecord::load(&manifest.output_dir).map_err(|e| {
                format!("No submitted job for '{}': {e}", manifest.name)
            })?;
            let api_key = target
                .api_key()
                .map_err(|e| format!("Manifest error: {e}"))?;
            let mut client =
                TogetherClient::new(api_key).map_err(|e| format!("Together error: {e}"))?;
            if let Some(url) = &target.base_url {
                client = client.with_base_url(url.clone());
            }
            Ok(JobTarget {
                client,
                job_id: record.job_id,
                record_dir: Some(manifest.output_dir),
            })
        }
        (None, None) => Err("Pass a manifest or --job-id".to_string()),
    }
}

/// Store the latest status in `job.json`, if there is one
fn update_record(record_dir: Option<&Path>, job: &FineTuneJob) -> Result<(), String> {
    let Some(dir) = record_dir else {
        return Ok(());
    };
    let mut record = JobRecord::load(dir).map_err(|e| format!("Job record error: {e}"))?;
    if record.job_id == job.id && record.status != job.status {
        record.status = job.status;
        record
            .save(dir)
            .map_err(|e| format!("Job record error: {e}"))?;
    }
    Ok(())
}
