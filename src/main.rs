//! unfat CLI
//!
//! # Usage
//!
//! ```bash
//! # Start a manifest
//! unfat init --template axolotl --name json-fix -o json-fix.yaml
//!
//! # Check it
//! unfat validate json-fix.yaml --detailed
//!
//! # Write an Axolotl job directory
//! unfat save json-fix.yaml
//!
//! # Or run on Together
//! unfat finetune fast-apply.yaml
//! unfat status fast-apply.yaml --wait
//! ```

use clap::Parser;
use std::process::ExitCode;
use unfat::cli::{run_command, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
