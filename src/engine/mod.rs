//! The analysis steps shared by the commands and the workflow coordinator,
//! bound to one repository root and configuration.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::alerts::{AlertGenerator, AlertSet};
use crate::config::RepoWardenConfig;
use crate::core::file_stamp;
use crate::errors::{RepoWardenError, Result};
use crate::extraction::UnitExtractor;
use crate::health::{HealthMetrics, HealthScorer};
use crate::io::output::{Dashboard, JsonWriter, MarkdownWriter, OutputWriter};
use crate::io::store::{ArtifactKind, ReportStore};
use crate::redundancy::{AnalysisReport, RedundancyDetector};
use crate::similarity::SimilarityScorer;
use crate::trends::{TrendAnalyzer, TrendReport};

/// Result of one `monitor` pass.
#[derive(Debug, Clone)]
pub struct MonitorOutcome {
    pub health: HealthMetrics,
    pub trends: Option<TrendReport>,
    /// Why no trend report was produced
    pub trend_note: Option<String>,
    pub alerts: AlertSet,
    pub dashboard: PathBuf,
}

pub struct Engine {
    root: PathBuf,
    config: RepoWardenConfig,
    store: ReportStore,
}

impl Engine {
    pub fn new(root: impl Into<PathBuf>, config: RepoWardenConfig) -> Self {
        let root = root.into();
        let store = ReportStore::new(config.output_dir_for(&root));
        Self {
            root,
            config,
            store,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &RepoWardenConfig {
        &self.config
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Extract units and detect redundant pairs.
    pub fn analyze(&self) -> Result<AnalysisReport> {
        let outcome = UnitExtractor::new(&self.config.extraction)
            .with_skip_dirs(self.config.generated_dirs_for(&self.root))
            .extract(&self.root)?;
        let scorer = SimilarityScorer::new(self.config.similarity.clone());
        let report = RedundancyDetector::new(&scorer, &self.config.detection).analyze(&outcome);
        info!(
            "Analysed {} files: {} redundant pairs",
            report.files_scanned,
            report.pairs().count()
        );
        Ok(report)
    }

    pub fn collect_health(&self, analysis: &AnalysisReport) -> Result<HealthMetrics> {
        let metrics = HealthScorer::new(&self.config.health, &self.config.extraction)
            .with_skip_dirs(self.config.generated_dirs_for(&self.root))
            .collect(&self.root, analysis)?;
        if !metrics.is_bounded() {
            warn!("Health snapshot has scores outside [0, 100]");
        }
        Ok(metrics)
    }

    pub fn record_analysis(&self, analysis: &AnalysisReport) -> Result<PathBuf> {
        self.store
            .write(ArtifactKind::Redundancy, &file_stamp(analysis.timestamp), analysis)
    }

    pub fn record_health(&self, health: &HealthMetrics) -> Result<PathBuf> {
        self.store
            .write(ArtifactKind::Health, &file_stamp(health.timestamp), health)
    }

    pub fn record_trends(&self, trends: &TrendReport) -> Result<PathBuf> {
        self.store
            .write(ArtifactKind::Trends, &file_stamp(trends.generated_at), trends)
    }

    pub fn record_alerts(&self, alerts: &AlertSet) -> Result<PathBuf> {
        self.store
            .write(ArtifactKind::Alerts, &file_stamp(alerts.timestamp), alerts)
    }

    pub fn trend_analyzer(&self) -> TrendAnalyzer {
        TrendAnalyzer::new(&self.config.trends)
    }

    pub fn alerts_for(&self, health: &HealthMetrics) -> AlertSet {
        AlertGenerator::new(&self.config.alerts).generate(health)
    }

    /// Rebuild `dashboard.md` and `dashboard.json` from the latest stored
    /// artifacts. Returns the Markdown path.
    pub fn refresh_dashboard(&self) -> Result<PathBuf> {
        let dashboard = Dashboard::from_store(&self.store)?;

        let mut json = Vec::new();
        JsonWriter::new(&mut json).write_dashboard(&dashboard)?;
        self.store
            .write_dashboard_json(&String::from_utf8_lossy(&json))?;

        let mut markdown = Vec::new();
        MarkdownWriter::new(&mut markdown).write_dashboard(&dashboard)?;
        self.store
            .write_dashboard(&String::from_utf8_lossy(&markdown))
    }

    /// Analyse, snapshot health, derive trends and alerts, and refresh the
    /// dashboard. Too little history is reported in the outcome, not hidden.
    pub fn monitor(&self) -> Result<MonitorOutcome> {
        let analysis = self.analyze()?;
        self.record_analysis(&analysis)?;
        let health = self.collect_health(&analysis)?;
        self.record_health(&health)?;

        let history = self.store.health_history()?;
        let (trends, trend_note) = match self.trend_analyzer().analyze(&history) {
            Ok(report) => {
                self.record_trends(&report)?;
                (Some(report), None)
            }
            Err(e @ RepoWardenError::InsufficientData { .. }) => {
                warn!("{}", e);
                (None, Some(e.to_string()))
            }
            Err(e) => return Err(e),
        };

        let alerts = self.alerts_for(&health);
        self.record_alerts(&alerts)?;
        let dashboard = self.refresh_dashboard()?;
        info!("Monitor finished at {}", Utc::now());

        Ok(MonitorOutcome {
            health,
            trends,
            trend_note,
            alerts,
            dashboard,
        })
    }
}
