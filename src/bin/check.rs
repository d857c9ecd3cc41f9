//! `parallax-check` CLI
//!
//! Validates and normalizes a stereo pipeline configuration file.
//!
//! ```bash
//! parallax-check config.json
//! parallax-check config.json --compact > normalized.json
//! ```
//!
//! Exit status: 0 on success, 2 when the configuration hits an unsupported
//! combination the pipeline must never run (e.g. cross checking without
//! right disparity bounds), 1 for any other defect.

use clap::Parser;
use parallax::{PipelineError, PipelineMachine, check_conf};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "parallax-check")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate and normalize a stereo pipeline configuration", long_about = None)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(env = "PARALLAX_CONFIG")]
    config: PathBuf,

    /// Print the normalized configuration on one line
    #[arg(long)]
    compact: bool,
}

fn main() {
    parallax::utils::init_tracing();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        std::process::exit(if err.is_fatal() { 2 } else { 1 });
    }
}

fn run(cli: &Cli) -> Result<(), PipelineError> {
    info!("checking configuration: {}", cli.config.display());

    let raw = std::fs::read_to_string(&cli.config)?;
    let cfg: Value = serde_json::from_str(&raw)?;

    let mut machine = PipelineMachine::new();
    let normalized = check_conf(&cfg, &mut machine)?;

    let rendered = if cli.compact {
        serde_json::to_string(&normalized)?
    } else {
        serde_json::to_string_pretty(&normalized)?
    };
    println!("{rendered}");

    Ok(())
}
