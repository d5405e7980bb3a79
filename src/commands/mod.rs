//! CLI command implementations.
//!
//! Each submodule handles one subcommand and reports an [`Outcome`];
//! errors propagate as `anyhow` errors with context and map to the usage
//! exit code in `main`.
//!
//! Available commands:
//! - **analyze**: extract units, detect redundancy, record health
//! - **cleanup**: annotate or review redundant pairs, backing up first
//! - **monitor**: health snapshot, trends, alerts and dashboard
//! - **workflow**: the five-phase run
//! - **rollback**: stage a backup for inspection
//! - **init**: write a default configuration file

pub mod analyze;
pub mod cleanup;
pub mod context;
pub mod init;
pub mod monitor;
pub mod rollback;
pub mod workflow;

use anyhow::Result;

use crate::cli::{Cli, Commands};

pub use analyze::handle_analyze;
pub use cleanup::handle_cleanup;
pub use context::CommandContext;
pub use init::init_config;
pub use monitor::handle_monitor;
pub use rollback::handle_rollback;
pub use workflow::handle_workflow;

/// Exit code for a critical alert or a failed phase.
pub const EXIT_FLAGGED: u8 = 1;
/// Exit code for configuration, usage and unexpected errors.
pub const EXIT_USAGE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The command ran but found a critical alert or a failure worth a
    /// non-zero exit.
    Flagged,
}

impl Outcome {
    pub fn flagged_if(condition: bool) -> Self {
        if condition {
            Outcome::Flagged
        } else {
            Outcome::Success
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::Flagged => EXIT_FLAGGED,
        }
    }
}

pub fn run(cli: Cli) -> Result<Outcome> {
    if let Commands::Init { force } = &cli.command {
        init_config(&cli.root, *force)?;
        return Ok(Outcome::Success);
    }

    let ctx = CommandContext::from_cli(&cli)?;
    match cli.command {
        Commands::Analyze => handle_analyze(&ctx),
        Commands::Cleanup { mode, confidence } => handle_cleanup(&ctx, mode, confidence),
        Commands::Monitor => handle_monitor(&ctx),
        Commands::Workflow {
            mode,
            cleanup_mode,
            confidence,
        } => handle_workflow(&ctx, mode, cleanup_mode, confidence),
        Commands::Rollback { backup } => handle_rollback(&ctx, &backup),
        Commands::Init { .. } => Ok(Outcome::Success),
    }
}
