//! Token sale simulator (icosim)
//!
//! Replays a scripted sale against a fresh deployment and prints a JSON
//! report of every call, the final sale state and native balances.
//!
//! # Usage
//!
//! ```bash
//! # Print a sample deployment and script
//! icosim example-config > deploy.json
//! icosim example-script > script.json
//!
//! # Replay the script
//! icosim run --config deploy.json --script script.json --pretty
//! ```

mod sample;
mod script;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use ico_common::config::DeployConfig;

use crate::script::Script;

/// Token sale simulator
#[derive(Parser)]
#[command(name = "icosim")]
#[command(about = "Replay scripted token sales")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy and replay a script
    Run {
        /// Deployment config (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Script to replay (JSON)
        #[arg(short, long)]
        script: PathBuf,

        /// Pretty print the report
        #[arg(short, long)]
        pretty: bool,
    },
    /// Print a sample deployment config
    ExampleConfig,
    /// Print a sample script matching the sample config
    ExampleScript,
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to format output")?;

    println!("{}", output);
    Ok(())
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config: config_path,
            script: script_path,
            pretty,
        } => {
            let config = DeployConfig::from_json_file(&config_path)
                .with_context(|| format!("Cannot load config {}", config_path.display()))?;
            let content = std::fs::read_to_string(&script_path)
                .with_context(|| format!("Cannot read script {}", script_path.display()))?;
            let replay: Script = serde_json::from_str(&content)
                .with_context(|| format!("Invalid script {}", script_path.display()))?;

            let report = script::run(&config, &replay)?;
            print_json(&report, pretty)
        }
        Commands::ExampleConfig => print_json(&sample::config(), true),
        Commands::ExampleScript => print_json(&sample::script(), true),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
