//! Status command implementation

use std::path::Path;
use std::time::Duration;

use crate::cli::logging::log;
use crate::cli::{LogLevel, StatusArgs};
use crate::together::{FineTuneApi, FineTuneJob};

pub fn format_job(job: &FineTuneJob) -> String {
    let mut line = format!("{}: {}", job.id, job.status);
    if let Some(name) = &job.output_name {
        line.push_str(&format!(" -> {name}"));
    }
    if let Some(updated) = &job.updated_at {
        line.push_str(&format!(" (updated {updated})"));
    }
    line
}

/// Fetch the job, polling every `interval` until it is terminal when `wait` is set.
pub fn poll_job(
    api: &dyn FineTuneApi,
    job_id: &str,
    record_dir: Option<&Path>,
    wait: Option<Duration>,
    level: LogLevel,
) -> Result<FineTuneJob, String> {
    loop {
        let job = api
            .fine_tune(job_id)
            .map_err(|e| format!("Together error: {e}"))?;
        super::update_record(record_dir, &job)?;

        match wait {
            Some(interval) if !job.status.is_terminal() => {
                log(level, LogLevel::Normal, &format_job(&job));
                std::thread::sleep(interval);
            }
            _ => return Ok(job),
        }
    }
}

pub fn run_status(args: StatusArgs, level: LogLevel) -> Result<(), String> {
    let target = super::job_target(&args.job)?;
    let wait = args.wait.then(|| Duration::from_secs(args.interval));

    let job = poll_job(
        &target.client,
        &target.job_id,
        target.record_dir.as_deref(),
        wait,
        level,
    )?;
    log(level, LogLevel::Normal, &format_job(&job));

    if args.wait && !job.status.is_success() {
        return Err(format!("Job {} finished with status {}", job.id, job.status));
    }
    Ok(())
}
