//! On-disk report store.
//!
//! Layout under the output directory:
//!
//! ```text
//! health/health_<stamp>.json          append-only snapshot log
//! redundancy/redundancy_<stamp>.json
//! trends/trends_<stamp>.json
//! alerts/alerts_<stamp>.json
//! cleanup/cleanup_<stamp>.json
//! reviews/review_<stamp>_<n>.md
//! workflows/workflow_<stamp>.json
//! dashboard.md
//! dashboard.json                      same summary, machine-readable
//! ```
//!
//! Every artifact is serialised once and never rewritten. Files are written
//! to a temporary name and renamed so readers never see a partial report.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::health::HealthMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Health,
    Redundancy,
    Trends,
    Alerts,
    Cleanup,
    Workflow,
}

impl ArtifactKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArtifactKind::Health => "health",
            ArtifactKind::Redundancy => "redundancy",
            ArtifactKind::Trends => "trends",
            ArtifactKind::Alerts => "alerts",
            ArtifactKind::Cleanup => "cleanup",
            ArtifactKind::Workflow => "workflows",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Health => "health",
            ArtifactKind::Redundancy => "redundancy",
            ArtifactKind::Trends => "trends",
            ArtifactKind::Alerts => "alerts",
            ArtifactKind::Cleanup => "cleanup",
            ArtifactKind::Workflow => "workflow",
        }
    }
}

pub const DASHBOARD_FILE_NAME: &str = "dashboard.md";
pub const DASHBOARD_JSON_FILE_NAME: &str = "dashboard.json";
const REVIEWS_DIR: &str = "reviews";

#[derive(Debug, Clone)]
pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: output_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, kind: ArtifactKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    pub fn dashboard_path(&self) -> PathBuf {
        self.root.join(DASHBOARD_FILE_NAME)
    }

    /// Serialise `value` as `<kind>/<prefix>_<stamp>.json`.
    pub fn write<T: Serialize>(&self, kind: ArtifactKind, stamp: &str, value: &T) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(value)?;
        let path = self
            .dir(kind)
            .join(format!("{}_{}.json", kind.prefix(), stamp));
        write_atomic(&path, &json)?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }

    pub fn write_review(&self, stamp: &str, index: usize, content: &str) -> Result<PathBuf> {
        let path = self
            .root
            .join(REVIEWS_DIR)
            .join(format!("review_{stamp}_{index}.md"));
        write_atomic(&path, content)?;
        Ok(path)
    }

    pub fn write_dashboard(&self, content: &str) -> Result<PathBuf> {
        let path = self.dashboard_path();
        write_atomic(&path, content)?;
        Ok(path)
    }

    pub fn write_dashboard_json(&self, content: &str) -> Result<PathBuf> {
        let path = self.root.join(DASHBOARD_JSON_FILE_NAME);
        write_atomic(&path, content)?;
        Ok(path)
    }

    /// Artifact files of one kind, oldest first. Stamps sort
    /// lexicographically in time order.
    fn artifact_files(&self, kind: ArtifactKind) -> Result<Vec<PathBuf>> {
        let dir = self.dir(kind);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}_", kind.prefix());
        let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension().and_then(|e| e.to_str()) == Some("json")
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.starts_with(&prefix))
                        .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// The most recent artifact of one kind, if any can be read.
    pub fn latest<T: DeserializeOwned>(&self, kind: ArtifactKind) -> Result<Option<T>> {
        for path in self.artifact_files(kind)?.iter().rev() {
            match read_json(path) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => warn!("Ignoring unreadable report {}: {}", path.display(), e),
            }
        }
        Ok(None)
    }

    /// All readable health snapshots ordered by their own timestamp.
    pub fn health_history(&self) -> Result<Vec<HealthMetrics>> {
        let mut snapshots: Vec<HealthMetrics> = Vec::new();
        for path in self.artifact_files(ArtifactKind::Health)? {
            match read_json(&path) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!("Ignoring unreadable snapshot {}: {}", path.display(), e),
            }
        }
        snapshots.sort_by_key(|s| s.timestamp);
        Ok(snapshots)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HealthWeights;
    use crate::health::{
        CodebaseMetrics, PerformanceMetrics, QualityMetrics, RedundancyMetrics, SecurityMetrics,
    };
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn snapshot(hour: u32) -> HealthMetrics {
        HealthMetrics::assemble(
            Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap(),
            CodebaseMetrics::default(),
            RedundancyMetrics::default(),
            QualityMetrics::default(),
            SecurityMetrics::default(),
            PerformanceMetrics::default(),
            &HealthWeights::default(),
        )
    }

    #[test]
    fn test_history_sorted_by_timestamp() {
        let dir = TempDir::new().unwrap();
        let store = ReportStore::new(dir.path());
        // Written out of order, with stamps that disagree with timestamps
        store.write(ArtifactKind::Health, "b", &snapshot(5)).unwrap();
        store.write(ArtifactKind::Health, "a", &snapshot(9)).unwrap();
        store.write(ArtifactKind::Health, "c", &snapshot(1)).unwrap();

        let history = store.health_history().unwrap();
        let hours: Vec<_> = history.iter().map(|s| s.timestamp.format("%H").to_string()).collect();
        assert_eq!(hours, vec!["01", "05", "09"]);
    }

    #[test]
    fn test_latest_skips_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let store = ReportStore::new(dir.path());
        store.write(ArtifactKind::Health, "20240101T000000.000Z", &snapshot(1)).unwrap();
        fs::write(
            store.dir(ArtifactKind::Health).join("health_20250101T000000.000Z.json"),
            "{ not json",
        )
        .unwrap();

        let latest: Option<HealthMetrics> = store.latest(ArtifactKind::Health).unwrap();
        assert_eq!(latest, Some(snapshot(1)));
        assert_eq!(store.health_history().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_store_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = ReportStore::new(dir.path().join("absent"));
        assert!(store.health_history().unwrap().is_empty());
        let latest: Option<HealthMetrics> = store.latest(ArtifactKind::Alerts).unwrap();
        assert!(latest.is_none());
    }
}
