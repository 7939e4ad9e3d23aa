//! Command-line arguments
//!
//! ```bash
//! unfat validate job.yaml --detailed
//! unfat info job.yaml --format json
//! unfat init --template together --name fast-apply -o fast-apply.yaml
//! unfat stats job.yaml
//! unfat save job.yaml --output-dir ./axolotl-job
//! unfat upload job.yaml
//! unfat finetune job.yaml --dry-run
//! unfat status job.yaml --wait
//! unfat cancel --job-id ft-123
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::manifest::Template;
use crate::models::BaseModel;

/// unfat: LoRA fine-tuning jobs from JSONL conversations
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "unfat")]
#[command(version)]
#[command(about = "Prepare Axolotl jobs and run Together fine-tunes over JSONL conversations")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Validate a job manifest and its dataset files
    Validate(ValidateArgs),

    /// Display information about a job manifest
    Info(InfoArgs),

    /// Write a starter job manifest
    Init(InitArgs),

    /// Count conversations and messages in the dataset
    Stats(StatsArgs),

    /// Write an Axolotl job directory
    Save(SaveArgs),

    /// Upload train/eval files to Together
    Upload(UploadArgs),

    /// Upload files and start a Together fine-tune
    Finetune(FinetuneArgs),

    /// Show the state of a Together fine-tune
    Status(StatusArgs),

    /// Cancel a Together fine-tune
    Cancel(CancelArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML job manifest
    #[arg(value_name = "MANIFEST")]
    pub config: PathBuf,

    /// Show detailed validation report
    #[arg(short, long)]
    pub detailed: bool,

    /// Also check that secret environment variables are set
    #[arg(long)]
    pub secrets: bool,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to YAML job manifest
    #[arg(value_name = "MANIFEST")]
    pub config: PathBuf,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the init command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InitArgs {
    /// Template to use (axolotl, together)
    #[arg(short, long, default_value = "axolotl")]
    pub template: Template,

    /// Job name
    #[arg(long, default_value = "my-job")]
    pub name: String,

    /// Base model (llama-3.1-8b, llama-3.1-70b)
    #[arg(long, default_value = "llama-3.1-8b")]
    pub model: BaseModel,

    /// Output path (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the stats command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct StatsArgs {
    /// Path to YAML job manifest
    #[arg(value_name = "MANIFEST")]
    pub config: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the save command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct SaveArgs {
    /// Path to YAML job manifest (axolotl target)
    #[arg(value_name = "MANIFEST")]
    pub config: PathBuf,

    /// Override the manifest's output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for the upload command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct UploadArgs {
    /// Path to YAML job manifest (together target)
    #[arg(value_name = "MANIFEST")]
    pub config: PathBuf,
}

/// Arguments for the finetune command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct FinetuneArgs {
    /// Path to YAML job manifest (together target)
    #[arg(value_name = "MANIFEST")]
    pub config: PathBuf,

    /// Validate and show the request without uploading or submitting
    #[arg(long)]
    pub dry_run: bool,
}

/// Where to find the job for status and cancel
#[derive(Args, Debug, Clone, PartialEq)]
pub struct JobSelector {
    /// Manifest whose output directory holds `job.json`
    #[arg(value_name = "MANIFEST", required_unless_present = "job_id")]
    pub config: Option<PathBuf>,

    /// Job id; the API key then comes from TOGETHER_API_KEY or ~/.together/api_key
    #[arg(long, conflicts_with = "config")]
    pub job_id: Option<String>,
}

/// Arguments for the status command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct StatusArgs {
    #[command(flatten)]
    pub job: JobSelector,

    /// Poll until the job finishes
    #[arg(short, long)]
    pub wait: bool,

    /// Seconds between polls with --wait
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,
}

/// Arguments for the cancel command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct CancelArgs {
    #[command(flatten)]
    pub job: JobSelector,
}

/// Output format for info
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            _ => Err(format!(
                "Unknown output format: {s}. Valid formats: text, json, yaml"
            )),
        }
    }
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
