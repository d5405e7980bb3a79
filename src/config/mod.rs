//! Configuration for repowarden.
//!
//! Configuration is read from `.repowarden.toml` (see [`loader`]) and every
//! field carries a default, so an empty or partial file is valid. The
//! constants preserved as defaults here (similarity weights, the 80/90/95
//! cleanup tiers, alert thresholds) have no derivation of their own; change
//! them through the file rather than in code.

pub mod loader;
pub mod scoring;
pub mod thresholds;
pub mod validation;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use loader::{load_config, load_config_from, CONFIG_FILE_NAME};
pub use scoring::{HealthConfig, HealthWeights, SimilarityWeights, WeightProfile};
pub use thresholds::AlertThresholds;
pub use validation::validate_config;

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoWardenConfig {
    /// Directory (relative to the analysed root) receiving reports
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub similarity: SimilarityWeights,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub alerts: AlertThresholds,

    #[serde(default)]
    pub trends: TrendConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,
}

impl Default for RepoWardenConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            extraction: ExtractionConfig::default(),
            detection: DetectionConfig::default(),
            similarity: SimilarityWeights::default(),
            health: HealthConfig::default(),
            alerts: AlertThresholds::default(),
            trends: TrendConfig::default(),
            cleanup: CleanupConfig::default(),
        }
    }
}

impl RepoWardenConfig {
    /// Absolute output directory for a given repository root.
    pub fn output_dir_for(&self, root: &Path) -> PathBuf {
        if self.output_dir.is_absolute() {
            self.output_dir.clone()
        } else {
            root.join(&self.output_dir)
        }
    }

    /// Absolute backup directory for a given repository root.
    pub fn backup_dir_for(&self, root: &Path) -> PathBuf {
        match &self.cleanup.backup_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root.join(dir),
            None => self.output_dir_for(root).join("backups"),
        }
    }

    /// Directories repowarden itself writes into, never analysed or
    /// archived.
    pub fn generated_dirs_for(&self, root: &Path) -> Vec<PathBuf> {
        let output = self.output_dir_for(root);
        let backups = self.backup_dir_for(root);
        if backups.starts_with(&output) {
            vec![output]
        } else {
            vec![output, backups]
        }
    }

    /// Reduced sample and candidate caps for quick runs.
    pub fn quick(mut self) -> Self {
        self.health.sample_files = (self.health.sample_files / 4).max(1);
        self.detection.max_units_per_class = (self.detection.max_units_per_class / 4).max(2);
        self
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".repowarden")
}

/// Unit extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// File extensions scanned for function definitions
    #[serde(default = "default_code_extensions")]
    pub code_extensions: Vec<String>,

    /// File extensions scanned for documentation sections
    #[serde(default = "default_doc_extensions")]
    pub doc_extensions: Vec<String>,

    /// Glob patterns excluded from every walk
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Lines captured after a definition line
    #[serde(default = "default_body_lines")]
    pub body_lines: usize,

    /// Minimum non-blank body lines for a function to be extracted
    #[serde(default = "default_min_function_lines")]
    pub min_function_lines: usize,

    /// Maximum lines captured after a documentation header
    #[serde(default = "default_doc_section_max_lines")]
    pub doc_section_max_lines: usize,

    /// Also extract indented (nested) definitions such as methods
    #[serde(default)]
    pub nested_definitions: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            code_extensions: default_code_extensions(),
            doc_extensions: default_doc_extensions(),
            exclude: default_exclude(),
            body_lines: default_body_lines(),
            min_function_lines: default_min_function_lines(),
            doc_section_max_lines: default_doc_section_max_lines(),
            nested_definitions: false,
        }
    }
}

fn default_code_extensions() -> Vec<String> {
    ["py", "js", "jsx", "ts", "tsx", "rs", "go", "sh", "bash", "rb", "java"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_doc_extensions() -> Vec<String> {
    ["md", "markdown", "rst", "txt"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_exclude() -> Vec<String> {
    [
        "**/.git/**",
        "**/node_modules/**",
        "**/vendor/**",
        "**/target/**",
        "**/build/**",
        "**/dist/**",
        "**/__pycache__/**",
        "**/.venv/**",
        "**/venv/**",
        "**/.repowarden/**",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_body_lines() -> usize {
    15
}
fn default_min_function_lines() -> usize {
    5
}
fn default_doc_section_max_lines() -> usize {
    40
}

/// Redundancy detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Combined score (0-100) at or above which a pair is redundant
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Minimum non-blank body lines for a unit to take part in comparison
    #[serde(default = "default_min_unit_lines")]
    pub min_unit_lines: usize,

    /// Cap on units compared per language/document class
    #[serde(default = "default_max_units_per_class")]
    pub max_units_per_class: usize,

    /// Spread pairwise comparison over the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            min_unit_lines: default_min_unit_lines(),
            max_units_per_class: default_max_units_per_class(),
            parallel: default_parallel(),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    80.0
}
fn default_min_unit_lines() -> usize {
    3
}
fn default_max_units_per_class() -> usize {
    1500
}
fn default_parallel() -> bool {
    true
}

/// Trend analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Number of most recent snapshots compared
    #[serde(default = "default_trend_window")]
    pub window: usize,

    /// Absolute change above which a metric is improving or declining
    #[serde(default = "default_trend_sensitivity")]
    pub sensitivity: i64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window: default_trend_window(),
            sensitivity: default_trend_sensitivity(),
        }
    }
}

fn default_trend_window() -> usize {
    5
}
fn default_trend_sensitivity() -> i64 {
    5
}

/// Cleanup orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Safe mode annotates pairs at or above this score
    #[serde(default = "default_annotate_threshold")]
    pub annotate_threshold: f64,

    /// Aggressive mode cross-annotates pairs at or above this score
    #[serde(default = "default_bidirectional_threshold")]
    pub bidirectional_threshold: f64,

    /// Where backup archives are written (defaults to `<output_dir>/backups`)
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            annotate_threshold: default_annotate_threshold(),
            bidirectional_threshold: default_bidirectional_threshold(),
            backup_dir: None,
        }
    }
}

fn default_annotate_threshold() -> f64 {
    90.0
}
fn default_bidirectional_threshold() -> f64 {
    95.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: RepoWardenConfig = toml::from_str("").unwrap();
        assert_eq!(config.detection.similarity_threshold, 80.0);
        assert_eq!(config.extraction.min_function_lines, 5);
        assert_eq!(config.trends.window, 5);
        assert_eq!(config.cleanup.bidirectional_threshold, 95.0);
        assert_eq!(config.output_dir, PathBuf::from(".repowarden"));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: RepoWardenConfig = toml::from_str(
            r#"
            [detection]
            similarity_threshold = 70.0
            "#,
        )
        .unwrap();
        assert_eq!(config.detection.similarity_threshold, 70.0);
        assert_eq!(config.detection.min_unit_lines, 3);
        assert!(config.detection.parallel);
    }

    #[test]
    fn test_backup_dir_resolution() {
        let config = RepoWardenConfig::default();
        let root = Path::new("/repo");
        assert_eq!(
            config.backup_dir_for(root),
            PathBuf::from("/repo/.repowarden/backups")
        );
    }

    #[test]
    fn test_generated_dirs_include_custom_backup_dir() {
        let mut config = RepoWardenConfig::default();
        let root = Path::new("/repo");
        assert_eq!(
            config.generated_dirs_for(root),
            vec![PathBuf::from("/repo/.repowarden")]
        );

        config.output_dir = PathBuf::from("reports");
        config.cleanup.backup_dir = Some(PathBuf::from("/var/backups/repo"));
        assert_eq!(
            config.generated_dirs_for(root),
            vec![PathBuf::from("/repo/reports"), PathBuf::from("/var/backups/repo")]
        );
    }

    #[test]
    fn test_quick_reduces_caps() {
        let config = RepoWardenConfig::default().quick();
        assert_eq!(config.health.sample_files, 50);
        assert_eq!(config.detection.max_units_per_class, 375);
    }
}
