//! Command-line surface of the orchestrator.
//!
//! One subcommand per route-layer entry point: `check`, `stage`, `apply`,
//! `upgrade`, `rollback`. Every command prints its result envelope as
//! pretty JSON on stdout, so an HTTP layer or a shell pipeline consumes
//! the same shape the panel's routes would.
//!
//! Mutating commands exit non-zero when the operation reports `ok: false`;
//! the JSON is still printed first so the failure message is machine
//! readable.

mod apply;
mod check;
mod rollback;
mod stage;
mod upgrade;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::UpdaterConfig;

/// Update and rollback orchestrator for the ClawDeck panel and its
/// openclaw gateway.
#[derive(Parser)]
#[command(name = "clawdeck-update", version, about)]
pub struct Cli {
    /// Enable debug output.
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (JSON results are still printed).
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Path to the updater config file.
    #[arg(long, global = true, env = "CLAWDECK_UPDATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether bot and/or panel updates are available.
    Check(check::CheckCommand),

    /// Download a panel release and record it as the staged update.
    Stage(stage::StageCommand),

    /// Apply the staged panel release and restart the panel service.
    Apply(apply::ApplyCommand),

    /// Upgrade the bot via the openclaw CLI.
    Upgrade(upgrade::UpgradeCommand),

    /// Roll the bot back to an explicit version via the openclaw CLI.
    Rollback(rollback::RollbackCommand),
}

impl Cli {
    /// Log filter directive implied by the verbosity flags, `None` when
    /// logging should stay off entirely.
    #[must_use]
    pub fn log_directive(&self) -> Option<&'static str> {
        if self.quiet {
            None
        } else if self.verbose {
            Some("debug")
        } else {
            Some("info")
        }
    }

    /// Load configuration and dispatch to the selected command.
    pub async fn execute(self) -> Result<()> {
        let config = UpdaterConfig::load_with_optional(self.config).await?;
        match self.command {
            Commands::Check(cmd) => cmd.execute(&config).await,
            Commands::Stage(cmd) => cmd.execute(&config).await,
            Commands::Apply(cmd) => cmd.execute(&config).await,
            Commands::Upgrade(cmd) => cmd.execute(&config).await,
            Commands::Rollback(cmd) => cmd.execute(&config).await,
        }
    }
}

/// Print a result envelope as pretty JSON and translate `ok: false` into a
/// non-zero exit, after the JSON has been flushed.
pub(crate) fn emit(result: &crate::core::MutationResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    if result.ok {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
