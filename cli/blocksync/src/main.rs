//! blocksync CLI: keeps a component model in step with an edited block model.

mod commands;
mod manifest;
mod persist;
mod script;
mod state;
mod terminal;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use manifest::BlocksyncManifest;

#[derive(Parser)]
#[command(
    name = "blocksync",
    version,
    about = "Synchronize block models with component models"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new blocksync project
    Init {
        /// Project name
        name: String,
    },
    /// Replay a JSON edit script against the project's block model
    Apply {
        /// Path to the edit script
        script: PathBuf,
        /// Ignore answers in the script and ask on the terminal
        #[arg(long)]
        interactive: bool,
    },
    /// Show the state of both models
    Status,
    /// List correspondences between the models
    Links,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { name } => commands::init::run(&name),
        Commands::Apply {
            script,
            interactive,
        } => {
            let (manifest, project_dir) = load_manifest(&cwd)?;
            commands::apply::run(&project_dir, &manifest, &script, interactive)
        }
        Commands::Status => {
            let (manifest, project_dir) = load_manifest(&cwd)?;
            commands::status::run(&project_dir, &manifest)
        }
        Commands::Links => {
            let (manifest, project_dir) = load_manifest(&cwd)?;
            commands::links::run(&project_dir, &manifest)
        }
    }
}

/// Find `blocksync.toml` in `cwd` or a parent directory.
fn load_manifest(cwd: &Path) -> anyhow::Result<(BlocksyncManifest, PathBuf)> {
    match BlocksyncManifest::find_and_load(cwd)? {
        Some(found) => Ok(found),
        None => anyhow::bail!(
            "no blocksync.toml found in {} or its parents\nRun `blocksync init <name>` first.",
            cwd.display()
        ),
    }
}
