use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cleanup::CleanupMode;
use crate::workflow::WorkflowMode;

#[derive(Parser, Debug)]
#[command(name = "repowarden")]
#[command(about = "Repository redundancy and health analyzer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Repository root to analyze
    #[arg(short, long, global = true, default_value = ".", env = "REPOWARDEN_ROOT")]
    pub root: PathBuf,

    /// Configuration file (defaults to the nearest .repowarden.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory receiving reports, overriding the configured one
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "terminal")]
    pub format: OutputFormat,

    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract units, detect redundancy and record a health snapshot
    Analyze,

    /// Act on redundant pairs at or above a confidence score
    Cleanup {
        /// preview writes nothing; safe and aggressive back up first
        #[arg(value_enum)]
        mode: CleanupMode,

        /// Minimum combined similarity score (0-100)
        #[arg(default_value = "80")]
        confidence: f64,
    },

    /// Record a health snapshot, derive trends and alerts, refresh the dashboard
    Monitor,

    /// Run the five-phase baseline, analysis, cleanup and effectiveness workflow
    Workflow {
        #[arg(value_enum, default_value = "full")]
        mode: WorkflowMode,

        #[arg(value_enum, default_value = "preview")]
        cleanup_mode: CleanupMode,

        /// Minimum combined similarity score (0-100) for cleanup actions
        #[arg(long, default_value = "80")]
        confidence: f64,
    },

    /// Extract a backup archive into a staging directory for inspection
    Rollback {
        /// Backup archive, as a path or a name inside the backup directory
        backup: PathBuf,
    },

    /// Write a default .repowarden.toml in the repository root
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
}
