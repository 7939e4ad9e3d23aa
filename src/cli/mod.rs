//! CLI module for unfat
//!
//! Argument definitions live in [`args`]; each subcommand has a handler in
//! `commands` that returns `Result<(), String>` for `main` to report.

mod args;
mod commands;
mod logging;

pub use args::{
    parse_args, CancelArgs, Cli, Command, FinetuneArgs, InfoArgs, InitArgs, JobSelector,
    OutputFormat, SaveArgs, StatsArgs, StatusArgs, UploadArgs, ValidateArgs,
};
pub use commands::run_command;
pub use logging::LogLevel;
