//! Cleanup orchestration over redundancy findings.
//!
//! | mode         | backup   | annotated in place                     | otherwise      |
//! |--------------|----------|----------------------------------------|----------------|
//! | `preview`    | no       | nothing, actions are proposals only    | proposals only |
//! | `safe`       | required | pairs >= annotate threshold, one way   | review template |
//! | `aggressive` | required | >= bidirectional threshold both ways,  | review template |
//! |              |          | >= annotate threshold one way          |                |
//!
//! Nothing in the tree is rewritten before a backup succeeds. When the
//! backup fails the run falls back to preview behaviour and records why.

pub mod annotate;
pub mod backup;
pub mod review;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{CleanupConfig, RepoWardenConfig};
use crate::core::{file_stamp, Language, Location};
use crate::errors::Result;
use crate::io::store::ReportStore;
use crate::redundancy::AnalysisReport;
use crate::similarity::SimilarityResult;

pub use annotate::{apply_annotations, Annotation, AnnotationOutcome, AnnotationStatus};
pub use backup::{rollback, Archiver, BackupHandle, BackupScope, TarArchiver};
pub use review::render_review;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CleanupMode {
    Preview,
    Safe,
    Aggressive,
}

impl CleanupMode {
    pub fn is_mutating(&self) -> bool {
        !matches!(self, CleanupMode::Preview)
    }
}

impl fmt::Display for CleanupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupMode::Preview => f.write_str("preview"),
            CleanupMode::Safe => f.write_str("safe"),
            CleanupMode::Aggressive => f.write_str("aggressive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CleanupAction {
    /// Comment above `target` pointing at `duplicate_of`
    Annotate {
        target: Location,
        duplicate_of: Location,
        language: Language,
        score: f64,
        bidirectional: bool,
        status: AnnotationStatus,
    },
    /// Manual-review document for a pair below the annotation tier
    Review {
        unit_a: Location,
        unit_b: Location,
        score: f64,
        template: Option<PathBuf>,
    },
}

/// The record of one cleanup run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupPlan {
    pub timestamp: DateTime<Utc>,
    pub requested_mode: CleanupMode,
    /// Mode actually carried out; `preview` after a backup failure
    pub mode: CleanupMode,
    pub confidence: f64,
    pub backup_ref: Option<BackupHandle>,
    pub actions: Vec<CleanupAction>,
    pub downgrade_reason: Option<String>,
    pub files_modified: Vec<PathBuf>,
    pub errors: Vec<String>,
}

impl CleanupPlan {
    pub fn was_downgraded(&self) -> bool {
        self.downgrade_reason.is_some()
    }

    pub fn is_success(&self) -> bool {
        !self.was_downgraded() && self.errors.is_empty()
    }

    pub fn annotations_inserted(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| {
                matches!(
                    a,
                    CleanupAction::Annotate {
                        status: AnnotationStatus::Inserted,
                        ..
                    }
                )
            })
            .count()
    }

    pub fn reviews_written(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, CleanupAction::Review { template: Some(_), .. }))
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Annotate,
    Bidirectional,
    Review,
}

pub struct CleanupOrchestrator<'a, A: Archiver = TarArchiver> {
    root: &'a Path,
    config: &'a CleanupConfig,
    store: &'a ReportStore,
    backup_dir: PathBuf,
    scope: BackupScope,
    archiver: A,
}

impl<'a> CleanupOrchestrator<'a, TarArchiver> {
    pub fn new(root: &'a Path, config: &'a RepoWardenConfig, store: &'a ReportStore) -> Result<Self> {
        let backup_dir = config.backup_dir_for(root);
        let scope = BackupScope::new(
            vec![store.root().to_path_buf(), backup_dir.clone()],
            &config.extraction.exclude,
        )?;
        Ok(Self {
            root,
            config: &config.cleanup,
            store,
            backup_dir,
            scope,
            archiver: TarArchiver,
        })
    }
}

impl<'a, A: Archiver> CleanupOrchestrator<'a, A> {
    pub fn with_archiver<B: Archiver>(self, archiver: B) -> CleanupOrchestrator<'a, B> {
        CleanupOrchestrator {
            root: self.root,
            config: self.config,
            store: self.store,
            backup_dir: self.backup_dir,
            scope: self.scope,
            archiver,
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    fn tier(&self, mode: CleanupMode, score: f64) -> Tier {
        match mode {
            CleanupMode::Aggressive if score >= self.config.bidirectional_threshold => {
                Tier::Bidirectional
            }
            _ if score >= self.config.annotate_threshold => Tier::Annotate,
            _ => Tier::Review,
        }
    }

    /// Proposed actions for `pairs`, nothing applied.
    fn propose(&self, pairs: &[&SimilarityResult], mode: CleanupMode) -> Vec<CleanupAction> {
        let mut actions = Vec::new();
        for pair in pairs {
            let a = pair.unit_a.location();
            let b = pair.unit_b.location();
            let annotate = |target: &Location, other: &Location, bidirectional| CleanupAction::Annotate {
                target: target.clone(),
                duplicate_of: other.clone(),
                language: pair.unit_a.language,
                score: pair.combined_score,
                bidirectional,
                status: AnnotationStatus::Pending,
            };
            match self.tier(mode, pair.combined_score) {
                Tier::Annotate => actions.push(annotate(&b, &a, false)),
                Tier::Bidirectional => {
                    actions.push(annotate(&b, &a, true));
                    actions.push(annotate(&a, &b, true));
                }
                Tier::Review => actions.push(CleanupAction::Review {
                    unit_a: a,
                    unit_b: b,
                    score: pair.combined_score,
                    template: None,
                }),
            }
        }
        actions
    }

    /// Act on every redundant pair scoring at least `confidence`.
    ///
    /// Never fails: backup failures downgrade the run and write failures are
    /// recorded in [`CleanupPlan::errors`].
    pub fn run(&self, analysis: &AnalysisReport, mode: CleanupMode, confidence: f64) -> CleanupPlan {
        let timestamp = Utc::now();
        let pairs: Vec<&SimilarityResult> = analysis
            .pairs()
            .filter(|p| p.combined_score >= confidence)
            .collect();
        let actions = self.propose(&pairs, mode);
        info!(
            "Cleanup ({}): {} pairs at >= {:.1}, {} actions",
            mode,
            pairs.len(),
            confidence,
            actions.len()
        );

        let mut plan = CleanupPlan {
            timestamp,
            requested_mode: mode,
            mode,
            confidence,
            backup_ref: None,
            actions,
            downgrade_reason: None,
            files_modified: Vec::new(),
            errors: Vec::new(),
        };

        if !mode.is_mutating() {
            return plan;
        }

        match self.archiver.create(self.root, &self.backup_dir, &self.scope) {
            Ok(handle) => plan.backup_ref = Some(handle),
            Err(e) => {
                warn!("Backup failed, falling back to preview: {}", e);
                plan.mode = CleanupMode::Preview;
                plan.downgrade_reason = Some(e.to_string());
                return plan;
            }
        }

        self.apply_annotations(&mut plan);
        self.write_reviews(&mut plan, &pairs);
        plan
    }

    fn apply_annotations(&self, plan: &mut CleanupPlan) {
        let annotations: Vec<Annotation> = plan
            .actions
            .iter()
            .filter_map(|action| match action {
                CleanupAction::Annotate {
                    target,
                    duplicate_of,
                    language,
                    score,
                    ..
                } => Some(Annotation::duplicate_of(
                    target.clone(),
                    *language,
                    duplicate_of,
                    *score,
                )),
                CleanupAction::Review { .. } => None,
            })
            .collect();
        if annotations.is_empty() {
            return;
        }

        let outcome = apply_annotations(self.root, &annotations);
        let mut statuses = outcome.statuses.into_iter();
        for action in plan.actions.iter_mut() {
            if let CleanupAction::Annotate { status, .. } = action {
                if let Some(applied) = statuses.next() {
                    *status = applied;
                }
            }
        }
        plan.files_modified = outcome.files_modified;
        plan.errors.extend(outcome.errors);
    }

    fn write_reviews(&self, plan: &mut CleanupPlan, pairs: &[&SimilarityResult]) {
        let stamp = file_stamp(plan.timestamp);
        let mut index = 0;
        for action in plan.actions.iter_mut() {
            let CleanupAction::Review {
                unit_a,
                unit_b,
                template,
                ..
            } = action
            else {
                continue;
            };
            let Some(pair) = pairs
                .iter()
                .find(|p| p.unit_a.location() == *unit_a && p.unit_b.location() == *unit_b)
            else {
                continue;
            };
            index += 1;
            match self.store.write_review(&stamp, index, &render_review(pair, index)) {
                Ok(path) => *template = Some(path),
                Err(e) => {
                    warn!("Could not write review template: {}", e);
                    plan.errors.push(format!("review {index}: {e}"));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ComparableUnit, UnitKind};
    use crate::errors::RepoWardenError;
    use crate::redundancy::RedundancyReport;
    use crate::similarity::ComparisonProfile;
    use std::fs;
    use tempfile::TempDir;

    struct FailingArchiver;

    impl Archiver for FailingArchiver {
        fn create(&self, _: &Path, _: &Path, _: &BackupScope) -> Result<BackupHandle> {
            Err(RepoWardenError::BackupFailure("disk full".to_string()))
        }

        fn extract(&self, _: &Path, _: &Path) -> Result<PathBuf> {
            Err(RepoWardenError::BackupFailure("disk full".to_string()))
        }
    }

    fn unit(file: &str, line: usize) -> ComparableUnit {
        ComparableUnit::new(
            UnitKind::Function,
            Language::Python,
            PathBuf::from(file),
            line,
            format!("f{line}"),
            "def f():\n    return 1",
        )
    }

    fn pair(a: ComparableUnit, b: ComparableUnit, score: f64) -> SimilarityResult {
        SimilarityResult {
            unit_a: a,
            unit_b: b,
            profile: ComparisonProfile::Code,
            lexical_score: score,
            structural_score: score,
            semantic_score: 0.0,
            combined_score: score,
        }
    }

    fn fixture() -> (TempDir, AnalysisReport) {
        let dir = TempDir::new().unwrap();
        for name in ["a.py", "b.py", "c.py", "d.py"] {
            fs::write(dir.path().join(name), "def f():\n    return 1\n").unwrap();
        }
        let report = AnalysisReport {
            timestamp: Utc::now(),
            files_scanned: 4,
            files_skipped: 0,
            reports: vec![RedundancyReport {
                class: Language::Python,
                kind: UnitKind::Function,
                total_units: 4,
                compared_units: 4,
                threshold_used: 80.0,
                redundant_pairs: vec![
                    pair(unit("a.py", 1), unit("b.py", 1), 96.0),
                    pair(unit("c.py", 1), unit("d.py", 1), 85.0),
                ],
            }],
        };
        (dir, report)
    }

    fn snapshot(root: &Path) -> Vec<String> {
        ["a.py", "b.py", "c.py", "d.py"]
            .iter()
            .map(|f| fs::read_to_string(root.join(f)).unwrap())
            .collect()
    }

    #[test]
    fn test_preview_writes_nothing() {
        let (dir, report) = fixture();
        let config = RepoWardenConfig::default();
        let store = ReportStore::new(config.output_dir_for(dir.path()));
        let before = snapshot(dir.path());

        let plan = CleanupOrchestrator::new(dir.path(), &config, &store)
            .unwrap()
            .run(&report, CleanupMode::Preview, 80.0);

        assert_eq!(plan.actions.len(), 2);
        assert!(plan.backup_ref.is_none());
        assert_eq!(snapshot(dir.path()), before);
        assert!(!store.root().exists());
    }

    #[test]
    fn test_safe_annotates_and_writes_reviews() {
        let (dir, report) = fixture();
        let config = RepoWardenConfig::default();
        let store = ReportStore::new(config.output_dir_for(dir.path()));

        let plan = CleanupOrchestrator::new(dir.path(), &config, &store)
            .unwrap()
            .run(&report, CleanupMode::Safe, 80.0);

        assert!(plan.is_success());
        assert!(plan.backup_ref.as_ref().unwrap().archive.is_file());
        assert_eq!(plan.annotations_inserted(), 1);
        assert_eq!(plan.reviews_written(), 1);
        assert_eq!(plan.files_modified, vec![PathBuf::from("b.py")]);
        assert!(fs::read_to_string(dir.path().join("b.py"))
            .unwrap()
            .starts_with("# repowarden: possible duplicate of a.py:1"));
        assert_eq!(
            fs::read_to_string(dir.path().join("a.py")).unwrap(),
            "def f():\n    return 1\n"
        );
    }

    #[test]
    fn test_aggressive_is_bidirectional() {
        let (dir, report) = fixture();
        let config = RepoWardenConfig::default();
        let store = ReportStore::new(config.output_dir_for(dir.path()));

        let plan = CleanupOrchestrator::new(dir.path(), &config, &store)
            .unwrap()
            .run(&report, CleanupMode::Aggressive, 80.0);

        assert_eq!(plan.annotations_inserted(), 2);
        assert_eq!(plan.reviews_written(), 1);
        assert!(fs::read_to_string(dir.path().join("a.py"))
            .unwrap()
            .contains("possible duplicate of b.py:1"));
    }

    #[test]
    fn test_aggressive_covers_the_safe_tier() {
        let (dir, mut report) = fixture();
        report.reports[0].redundant_pairs[0].combined_score = 90.0;
        let config = RepoWardenConfig::default();
        let store = ReportStore::new(config.output_dir_for(dir.path()));

        let plan = CleanupOrchestrator::new(dir.path(), &config, &store)
            .unwrap()
            .run(&report, CleanupMode::Aggressive, 80.0);

        assert_eq!(plan.annotations_inserted(), 1);
        assert_eq!(plan.files_modified, vec![PathBuf::from("b.py")]);
        assert_eq!(
            fs::read_to_string(dir.path().join("a.py")).unwrap(),
            "def f():\n    return 1\n"
        );
        assert_eq!(plan.reviews_written(), 1);
    }

    #[test]
    fn test_backup_failure_downgrades_without_mutation() {
        let (dir, report) = fixture();
        let config = RepoWardenConfig::default();
        let store = ReportStore::new(config.output_dir_for(dir.path()));
        let before = snapshot(dir.path());

        let plan = CleanupOrchestrator::new(dir.path(), &config, &store)
            .unwrap()
            .with_archiver(FailingArchiver)
            .run(&report, CleanupMode::Safe, 85.0);

        assert_eq!(plan.requested_mode, CleanupMode::Safe);
        assert_eq!(plan.mode, CleanupMode::Preview);
        assert!(plan.downgrade_reason.as_deref().unwrap().contains("disk full"));
        assert_eq!(plan.annotations_inserted(), 0);
        assert!(plan.files_modified.is_empty());
        assert_eq!(snapshot(dir.path()), before);
        assert!(!store.root().join("reviews").exists());
    }

    #[test]
    fn test_confidence_filters_pairs() {
        let (dir, report) = fixture();
        let config = RepoWardenConfig::default();
        let store = ReportStore::new(config.output_dir_for(dir.path()));
        let plan = CleanupOrchestrator::new(dir.path(), &config, &store)
            .unwrap()
            .run(&report, CleanupMode::Preview, 90.0);
        assert_eq!(plan.actions.len(), 1);
    }
}
