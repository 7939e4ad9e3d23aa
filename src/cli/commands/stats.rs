//! Stats command implementation

use crate::cli::logging::log;
use crate::cli::{LogLevel, StatsArgs};
use crate::datasets::{DatasetReport, SplitStats};

/// Format one split's counts
pub fn format_split(name: &str, stats: &SplitStats) -> String {
    format!(
        "  {name}: {} conversation(s) from {} file(s)\n    messages: {} (system {}, user {}, assistant {})\n    turns: mean {:.1}, max {}",
        stats.conversations,
        stats.files,
        stats.messages(),
        stats.system_messages,
        stats.user_messages,
        stats.assistant_messages,
        stats.mean_turns(),
        stats.max_turns
    )
}

pub fn format_report(report: &DatasetReport) -> String {
    let mut lines = vec![format_split("train", &report.train)];
    match &report.eval {
        Some(eval) => {
            lines.push(format_split("eval", eval));
            lines.push(format!(
                "  eval fraction: {:.1}%",
                report.eval_fraction() * 100.0
            ));
        }
        None => lines.push("  eval: none".to_string()),
    }
    lines.join("\n")
}

pub fn run_stats(args: StatsArgs, level: LogLevel) -> Result<(), String> {
    let manifest = super::load(&args.config)?;
    log(
        level,
        LogLevel::Verbose,
        &format!("Reading dataset for '{}'", manifest.name),
    );

    let report =
        DatasetReport::collect(&manifest.dataset).map_err(|e| format!("Dataset error: {e}"))?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("JSON serialization error: {e}"))?;
        println!("{json}");
    } else {
        log(level, LogLevel::Normal, "Dataset Statistics:");
        println!("{}", format_report(&report));
    }

    Ok(())
}
