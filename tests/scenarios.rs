use chrono::{Duration, Utc};
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use repowarden::alerts::{AlertGenerator, AlertType, Severity};
use repowarden::cleanup::{rollback, Archiver, BackupHandle, BackupScope, TarArchiver};
use repowarden::config::AlertThresholds;
use repowarden::health::{
    CodebaseMetrics, HealthMetrics, PerformanceMetrics, QualityMetrics, RedundancyMetrics,
    SecurityMetrics,
};
use repowarden::{
    CleanupMode, CleanupOrchestrator, ComparableUnit, Engine, Language, RepoWardenConfig,
    RepoWardenError, SimilarityScorer, TrendAnalyzer, TrendDirection, UnitKind,
};

const TOTALS: &str = indoc! {"
    def NAME(orders):
        total = 0
        for order in orders:
            if order.paid:
                total += order.amount
            else:
                total -= order.refund
        while total < 0:
            total += 1
        return total
"};

const RENDER: &str = indoc! {"
    def render_banner(title, width):
        try:
            line = '=' * width
            print(line)
            print(title.center(width))
            print(line)
        except ValueError as err:
            log_failure(err)
            raise
"};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn duplicated_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "billing/invoices.py", &TOTALS.replace("NAME", "invoice_total"));
    write(dir.path(), "billing/receipts.py", &TOTALS.replace("NAME", "receipt_total"));
    write(dir.path(), "ui/banner.py", RENDER);
    write(dir.path(), "README.md", "# Billing\n\nInvoice and receipt helpers.\n");
    dir
}

fn python_unit(file: &str, body: &str) -> ComparableUnit {
    ComparableUnit::new(UnitKind::Function, Language::Python, PathBuf::from(file), 1, file, body)
}

#[test]
fn identical_bodies_with_different_names_are_redundant() {
    let a = python_unit("a.py", &TOTALS.replace("NAME", "invoice_total"));
    let b = python_unit("b.py", &TOTALS.replace("NAME", "receipt_total"));
    let result = SimilarityScorer::default().score(&a, &b);

    assert_eq!(result.structural_score, 100.0);
    assert!(result.lexical_score > 80.0, "lexical {}", result.lexical_score);
    assert!(result.combined_score >= 80.0, "combined {}", result.combined_score);

    let repo = duplicated_repo();
    let analysis = Engine::new(repo.path(), RepoWardenConfig::default()).analyze().unwrap();
    let pairs: Vec<_> = analysis.pairs().collect();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].unit_a.name, "invoice_total");
    assert_eq!(pairs[0].unit_b.name, "receipt_total");
}

#[test]
fn unrelated_functions_score_low() {
    let a = python_unit("a.py", &TOTALS.replace("NAME", "invoice_total"));
    let b = python_unit("b.py", RENDER);
    let result = SimilarityScorer::default().score(&a, &b);

    assert!(result.combined_score < 20.0, "combined {}", result.combined_score);
    assert!(result.combined_score < 80.0);
}

#[test]
fn single_snapshot_has_no_trend() {
    let repo = duplicated_repo();
    let engine = Engine::new(repo.path(), RepoWardenConfig::default());

    let first = engine.monitor().unwrap();
    assert!(first.trends.is_none());
    assert!(first.trend_note.as_deref().unwrap().contains("Insufficient data"));

    let history = engine.store().health_history().unwrap();
    assert!(matches!(
        engine.trend_analyzer().analyze(&history),
        Err(RepoWardenError::InsufficientData {
            required: 2,
            available: 1
        })
    ));

    let second = engine.monitor().unwrap();
    let trends = second.trends.expect("two snapshots give a trend report");
    for metric in ["redundancy", "complexity", "maintainability", "security", "performance", "overall"] {
        assert_eq!(trends.direction(metric), Some(TrendDirection::Stable), "{metric}");
    }
    let dashboard = fs::read_to_string(&second.dashboard).unwrap();
    assert!(dashboard.contains("# Repository Health Dashboard"));

    let json_path = second.dashboard.with_file_name("dashboard.json");
    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(json_path).unwrap()).unwrap();
    assert_eq!(summary["history_len"], 2);
    assert_eq!(
        summary["health"]["overall_health"].as_f64(),
        Some(second.health.overall_health)
    );
    assert!(summary["trends"].is_object());
}

fn snapshot_at(minutes: i64, overall: f64) -> HealthMetrics {
    HealthMetrics {
        timestamp: Utc::now() + Duration::minutes(minutes),
        codebase: CodebaseMetrics {
            comment_ratio: 15.0,
            test_coverage_estimate: 40.0,
            ..CodebaseMetrics::default()
        },
        redundancy: RedundancyMetrics {
            score: 75.0,
            ..RedundancyMetrics::default()
        },
        quality: QualityMetrics {
            complexity_score: 70.0,
            maintainability_score: 70.0,
        },
        security: SecurityMetrics {
            score: 85.0,
            ..SecurityMetrics::default()
        },
        performance: PerformanceMetrics {
            score: 80.0,
            ..PerformanceMetrics::default()
        },
        overall_health: overall,
    }
}

#[test]
fn trend_window_compares_earliest_and_latest() {
    let config = RepoWardenConfig::default();
    let analyzer = TrendAnalyzer::new(&config.trends);
    let history = vec![snapshot_at(0, 60.0), snapshot_at(1, 90.0), snapshot_at(2, 70.0)];

    let report = analyzer.analyze(&history).unwrap();
    let overall = &report.per_metric["overall"];
    assert_eq!(overall.change, 10);
    assert_eq!(overall.direction, TrendDirection::Improving);
    assert_eq!(report.direction("security"), Some(TrendDirection::Stable));
}

#[test]
fn critical_health_drives_aggregate_severity() {
    let thresholds = AlertThresholds::default();
    let alerts = AlertGenerator::new(&thresholds).generate(&snapshot_at(0, 45.0));

    let critical_health = alerts
        .critical
        .iter()
        .filter(|a| a.alert_type == AlertType::CriticalHealth)
        .count();
    assert_eq!(critical_health, 1);
    assert!(!alerts.has(AlertType::LowHealth));
    assert_eq!(alerts.severity, Severity::Critical);
}

struct BrokenDisk;

impl Archiver for BrokenDisk {
    fn create(&self, _: &Path, _: &Path, _: &BackupScope) -> repowarden::Result<BackupHandle> {
        Err(RepoWardenError::BackupFailure("disk full".to_string()))
    }

    fn extract(&self, _: &Path, _: &Path) -> repowarden::Result<PathBuf> {
        Err(RepoWardenError::BackupFailure("disk full".to_string()))
    }
}

fn tree(root: &Path) -> Vec<(PathBuf, String)> {
    let mut files: Vec<_> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            (
                e.path().strip_prefix(root).unwrap().to_path_buf(),
                fs::read_to_string(e.path()).unwrap(),
            )
        })
        .collect();
    files.sort();
    files
}

#[test]
fn failed_backup_leaves_sources_untouched() {
    let repo = duplicated_repo();
    let mut config = RepoWardenConfig::default();
    config.cleanup.annotate_threshold = 80.0;
    let engine = Engine::new(repo.path(), config);
    let analysis = engine.analyze().unwrap();
    assert_eq!(analysis.pairs().count(), 1);
    let before = tree(repo.path());

    let plan = CleanupOrchestrator::new(engine.root(), engine.config(), engine.store())
        .unwrap()
        .with_archiver(BrokenDisk)
        .run(&analysis, CleanupMode::Safe, 85.0);

    assert_eq!(plan.mode, CleanupMode::Preview);
    assert_eq!(plan.requested_mode, CleanupMode::Safe);
    assert!(plan.downgrade_reason.as_deref().unwrap().contains("disk full"));
    assert!(plan.backup_ref.is_none());
    assert_eq!(plan.annotations_inserted(), 0);
    assert!(plan.files_modified.is_empty());
    assert_eq!(tree(repo.path()), before);
}

#[test]
fn safe_cleanup_backs_up_annotates_and_stages_rollback() {
    let repo = duplicated_repo();
    let original = fs::read_to_string(repo.path().join("billing/receipts.py")).unwrap();
    let mut config = RepoWardenConfig::default();
    config.cleanup.annotate_threshold = 80.0;
    let engine = Engine::new(repo.path(), config);
    let analysis = engine.analyze().unwrap();

    let orchestrator =
        CleanupOrchestrator::new(engine.root(), engine.config(), engine.store()).unwrap();
    let plan = orchestrator.run(&analysis, CleanupMode::Safe, 80.0);

    assert!(plan.is_success(), "{:?}", plan.errors);
    assert_eq!(plan.annotations_inserted(), 1);
    assert_eq!(plan.files_modified, vec![PathBuf::from("billing/receipts.py")]);
    let annotated = fs::read_to_string(repo.path().join("billing/receipts.py")).unwrap();
    assert!(annotated.starts_with("# repowarden: possible duplicate of billing/invoices.py:1"));

    let backup = plan.backup_ref.expect("safe mode backs up first");
    let staged = rollback(&TarArchiver, &backup.archive, orchestrator.backup_dir()).unwrap();
    assert_eq!(
        fs::read_to_string(staged.join("billing/receipts.py")).unwrap(),
        original
    );
    assert!(!staged.join(".repowarden").exists());
    assert_eq!(
        fs::read_to_string(repo.path().join("billing/receipts.py")).unwrap(),
        annotated
    );
}

#[test]
fn empty_repository_scores_without_dividing_by_zero() {
    let dir = TempDir::new().unwrap();
    let engine = Engine::new(dir.path(), RepoWardenConfig::default());
    let analysis = engine.analyze().unwrap();
    let health = engine.collect_health(&analysis).unwrap();

    assert_eq!(health.codebase.comment_ratio, 0.0);
    assert_eq!(health.codebase.test_coverage_estimate, 0.0);
    assert!(health.is_bounded());
    assert!((0.0..=100.0).contains(&health.overall_health));
}

#[test]
fn custom_output_dir_is_never_analysed() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.py", &TOTALS.replace("NAME", "invoice_total"));
    write(dir.path(), "b.py", RENDER);
    let mut config = RepoWardenConfig::default();
    config.output_dir = PathBuf::from("reports");
    let engine = Engine::new(dir.path(), config);

    let before = engine.analyze().unwrap();
    let health_before = engine.collect_health(&before).unwrap();
    assert_eq!(before.pairs().count(), 0);

    let orchestrator =
        CleanupOrchestrator::new(engine.root(), engine.config(), engine.store()).unwrap();
    let plan = orchestrator.run(&before, CleanupMode::Safe, 80.0);
    let backup = plan.backup_ref.expect("safe mode backs up first");
    let staged = rollback(&TarArchiver, &backup.archive, orchestrator.backup_dir()).unwrap();
    assert!(staged.starts_with(dir.path().join("reports")));
    assert!(staged.join("a.py").is_file());
    engine.monitor().unwrap();

    let after = engine.analyze().unwrap();
    assert_eq!(after.pairs().count(), 0);
    assert_eq!(after.files_scanned, before.files_scanned);
    let health_after = engine.collect_health(&after).unwrap();
    assert_eq!(health_after.codebase.total_files, health_before.codebase.total_files);
}
