use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::validation::validate_config;
use super::RepoWardenConfig;
use crate::errors::{RepoWardenError, Result};

pub const CONFIG_FILE_NAME: &str = ".repowarden.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse and validate configuration from a TOML string.
pub fn parse_and_validate_config(contents: &str) -> Result<RepoWardenConfig> {
    let config = toml::from_str::<RepoWardenConfig>(contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load an explicit configuration file. A missing file is an error here,
/// unlike discovery.
pub fn load_config_from(path: &Path) -> Result<RepoWardenConfig> {
    let contents =
        fs::read_to_string(path).map_err(|e| RepoWardenError::unreadable(path, e))?;
    let config = parse_and_validate_config(&contents)?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Directory ancestors of `start`, nearest first, up to `max_depth` entries.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Discover `.repowarden.toml` from `root` upward. Falls back to defaults
/// when no file exists; a file that exists but is invalid is an error so
/// misconfiguration fails fast.
pub fn load_config(root: &Path) -> Result<RepoWardenConfig> {
    let start = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

    for candidate in directory_ancestors(start, MAX_TRAVERSAL_DEPTH).map(|d| d.join(CONFIG_FILE_NAME)) {
        match fs::read_to_string(&candidate) {
            Ok(contents) => {
                let config = parse_and_validate_config(&contents)?;
                debug!("Loaded config from {}", candidate.display());
                return Ok(config);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                warn!("Failed to read config file {}: {}", candidate.display(), e);
            }
        }
    }

    debug!(
        "No config found after checking {} directories. Using default config.",
        MAX_TRAVERSAL_DEPTH
    );
    let config = RepoWardenConfig::default();
    validate_config(&config)?;
    Ok(config)
}

/// Default configuration rendered as TOML, for `repowarden init`.
pub fn default_config_toml() -> Result<String> {
    toml::to_string_pretty(&RepoWardenConfig::default())
        .map_err(|e| RepoWardenError::misconfigured("<default>", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_ancestors_depth() {
        let dirs: Vec<_> = directory_ancestors(PathBuf::from("/a/b/c"), 2).collect();
        assert_eq!(dirs, vec![PathBuf::from("/a/b/c"), PathBuf::from("/a/b")]);
    }

    #[test]
    fn test_load_config_discovers_parent_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[trends]\nwindow = 3\n",
        )
        .unwrap();
        let nested = temp.path().join("pkg");
        fs::create_dir_all(&nested).unwrap();

        let config = load_config(&nested).unwrap();
        assert_eq!(config.trends.window, 3);
    }

    #[test]
    fn test_invalid_file_fails_fast() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[detection]\nsimilarity_threshold = -4.0\n",
        )
        .unwrap();

        let err = load_config(temp.path()).unwrap_err();
        assert!(matches!(
            err,
            RepoWardenError::ThresholdMisconfiguration { .. }
        ));
    }

    #[test]
    fn test_default_config_round_trips() {
        let rendered = default_config_toml().unwrap();
        let parsed = parse_and_validate_config(&rendered).unwrap();
        assert_eq!(parsed.detection.similarity_threshold, 80.0);
    }
}
