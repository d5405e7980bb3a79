use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cli::{Cli, OutputFormat};
use crate::config::{load_config, load_config_from, RepoWardenConfig};
use crate::engine::Engine;

/// Settings shared by every command, resolved from the global flags.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub root: PathBuf,
    pub config: RepoWardenConfig,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Canonicalize the root and load, validate and override the
    /// configuration. Fails before any work is done.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let root = cli
            .root
            .canonicalize()
            .with_context(|| format!("Repository root {} is not accessible", cli.root.display()))?;
        let mut config = load_configuration(&root, cli.config.as_deref())?;
        if let Some(dir) = &cli.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(Self {
            root,
            config,
            format: cli.format,
        })
    }

    pub fn engine(&self) -> Engine {
        Engine::new(&self.root, self.config.clone())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config.output_dir_for(&self.root)
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

fn load_configuration(root: &Path, explicit: Option<&Path>) -> Result<RepoWardenConfig> {
    match explicit {
        Some(path) => load_config_from(path)
            .with_context(|| format!("Invalid configuration in {}", path.display())),
        None => load_config(root).context("Invalid configuration"),
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
