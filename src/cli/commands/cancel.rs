//! Cancel command implementation

use crate::cli::logging::{log, warn};
use crate::cli::{CancelArgs, LogLevel};
use crate::together::FineTuneApi;

pub fn run_cancel(args: CancelArgs, level: LogLevel) -> Result<(), String> {
    let target = super::job_target(&args.job)?;

    let job = target
        .client
        .cancel_fine_tune(&target.job_id)
        .map_err(|e| format!("Cancel failed: {e}"))?;
    super::update_record(target.record_dir.as_deref(), &job)?;

    if job.status.is_success() {
        warn(&format!("Job {} had already completed", job.id));
    }
    log(
        level,
        LogLevel::Normal,
        &format!("Job {}: {}", job.id, job.status),
    );
    Ok(())
}
