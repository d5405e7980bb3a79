//! Five-phase redundancy workflow.
//!
//! Phases run strictly in order and a failing phase never stops the run:
//! later phases still execute, the failure is recorded on its
//! [`PhaseRecord`] and `overall_success` becomes false. The finished
//! [`WorkflowRun`] is persisted once, after the last phase.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, info_span, warn};

use crate::cleanup::{Archiver, CleanupMode, CleanupOrchestrator, TarArchiver};
use crate::config::RepoWardenConfig;
use crate::core::file_stamp;
use crate::engine::Engine;
use crate::errors::{RepoWardenError, Result};
use crate::health::HealthMetrics;
use crate::io::store::ArtifactKind;
use crate::redundancy::AnalysisReport;
use crate::trends::TrendReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowMode {
    /// Default sample and candidate caps
    Full,
    /// Quarter-size caps for fast runs
    Quick,
}

impl WorkflowMode {
    /// The configuration a run in this mode uses.
    pub fn apply(&self, config: RepoWardenConfig) -> RepoWardenConfig {
        match self {
            WorkflowMode::Full => config,
            WorkflowMode::Quick => config.quick(),
        }
    }
}

impl fmt::Display for WorkflowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowMode::Full => f.write_str("full"),
            WorkflowMode::Quick => f.write_str("quick"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseName {
    BaselineHealth,
    RedundancyAnalysis,
    Deduplication,
    PostHealth,
    EffectivenessMonitor,
}

impl PhaseName {
    pub const ALL: [PhaseName; 5] = [
        PhaseName::BaselineHealth,
        PhaseName::RedundancyAnalysis,
        PhaseName::Deduplication,
        PhaseName::PostHealth,
        PhaseName::EffectivenessMonitor,
    ];
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseName::BaselineHealth => "baseline_health",
            PhaseName::RedundancyAnalysis => "redundancy_analysis",
            PhaseName::Deduplication => "deduplication",
            PhaseName::PostHealth => "post_health",
            PhaseName::EffectivenessMonitor => "effectiveness_monitor",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Pending,
    Success,
    Failed,
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseStatus::Pending => f.write_str("pending"),
            PhaseStatus::Success => f.write_str("success"),
            PhaseStatus::Failed => f.write_str("failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub name: PhaseName,
    pub status: PhaseStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PhaseRecord {
    fn pending(name: PhaseName) -> Self {
        Self {
            name,
            status: PhaseStatus::Pending,
            start_time: None,
            end_time: None,
            exit_code: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub completed: usize,
    pub failed: usize,
    pub overall_success: bool,
}

/// The record of one workflow run. Phases are listed in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub timestamp: DateTime<Utc>,
    pub mode: WorkflowMode,
    pub cleanup_mode: CleanupMode,
    pub confidence: f64,
    pub phases: Vec<PhaseRecord>,
    pub summary: WorkflowSummary,
    /// Baseline versus post-cleanup comparison, when both snapshots exist
    pub effectiveness: Option<TrendReport>,
}

impl WorkflowRun {
    fn new(mode: WorkflowMode, cleanup_mode: CleanupMode, confidence: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            mode,
            cleanup_mode,
            confidence,
            phases: PhaseName::ALL.iter().map(|n| PhaseRecord::pending(*n)).collect(),
            summary: WorkflowSummary::default(),
            effectiveness: None,
        }
    }

    pub fn phase(&self, name: PhaseName) -> Option<&PhaseRecord> {
        self.phases.iter().find(|p| p.name == name)
    }

    /// Every phase has a final status.
    pub fn is_finished(&self) -> bool {
        self.phases.iter().all(|p| p.status != PhaseStatus::Pending)
    }

    fn record(&mut self, name: PhaseName, start: DateTime<Utc>, result: &Result<()>) {
        let Some(phase) = self.phases.iter_mut().find(|p| p.name == name) else {
            return;
        };
        phase.start_time = Some(start);
        phase.end_time = Some(Utc::now());
        match result {
            Ok(()) => {
                phase.status = PhaseStatus::Success;
                phase.exit_code = Some(0);
                self.summary.completed += 1;
            }
            Err(e) => {
                phase.status = PhaseStatus::Failed;
                phase.exit_code = Some(1);
                phase.error = Some(e.to_string());
                self.summary.failed += 1;
            }
        }
    }

    fn finish(&mut self) {
        self.summary.overall_success = self.summary.failed == 0 && self.is_finished();
    }
}

/// State carried between phases.
#[derive(Default)]
struct PhaseState {
    analysis: Option<AnalysisReport>,
    baseline: Option<HealthMetrics>,
    post: Option<HealthMetrics>,
    effectiveness: Option<TrendReport>,
}

pub struct WorkflowCoordinator<'a, A: Archiver = TarArchiver> {
    engine: &'a Engine,
    archiver: A,
}

impl<'a> WorkflowCoordinator<'a, TarArchiver> {
    pub fn new(engine: &'a Engine) -> Self {
        Self {
            engine,
            archiver: TarArchiver,
        }
    }
}

impl<'a, A: Archiver + Clone> WorkflowCoordinator<'a, A> {
    pub fn with_archiver<B: Archiver + Clone>(self, archiver: B) -> WorkflowCoordinator<'a, B> {
        WorkflowCoordinator {
            engine: self.engine,
            archiver,
        }
    }

    /// Run all five phases and persist the run. Never fails: phase errors
    /// are recorded; only a failure to persist the record is logged.
    pub fn run(&self, mode: WorkflowMode, cleanup_mode: CleanupMode, confidence: f64) -> WorkflowRun {
        let mut run = WorkflowRun::new(mode, cleanup_mode, confidence);
        let mut state = PhaseState::default();
        info!("Workflow started: {} mode, {} cleanup", mode, cleanup_mode);

        for name in PhaseName::ALL {
            let span = info_span!("phase", name = %name);
            let _guard = span.enter();

            let start = Utc::now();
            let result = match name {
                PhaseName::BaselineHealth => self.baseline_health(&mut state),
                PhaseName::RedundancyAnalysis => self.redundancy_analysis(&mut state),
                PhaseName::Deduplication => self.deduplication(&mut state, cleanup_mode, confidence),
                PhaseName::PostHealth => self.post_health(&mut state),
                PhaseName::EffectivenessMonitor => self.effectiveness(&mut state),
            };
            match &result {
                Ok(()) => info!("Phase {} succeeded", name),
                Err(e) => warn!("Phase {} failed: {}", name, e),
            }
            run.record(name, start, &result);
        }

        run.effectiveness = state.effectiveness;
        run.finish();

        let store = self.engine.store();
        if let Err(e) = store.write(ArtifactKind::Workflow, &file_stamp(run.timestamp), &run) {
            warn!("Could not persist workflow record: {}", e);
        }
        if let Err(e) = self.engine.refresh_dashboard() {
            warn!("Could not refresh dashboard: {}", e);
        }
        info!(
            "Workflow finished: {} completed, {} failed",
            run.summary.completed, run.summary.failed
        );
        run
    }

    fn baseline_health(&self, state: &mut PhaseState) -> Result<()> {
        let analysis = self.engine.analyze()?;
        let health = self.engine.collect_health(&analysis)?;
        self.engine.record_health(&health)?;
        state.analysis = Some(analysis);
        state.baseline = Some(health);
        Ok(())
    }

    fn redundancy_analysis(&self, state: &mut PhaseState) -> Result<()> {
        let analysis = match state.analysis.take() {
            Some(analysis) => analysis,
            None => self.engine.analyze()?,
        };
        self.engine.record_analysis(&analysis)?;
        state.analysis = Some(analysis);
        Ok(())
    }

    fn deduplication(&self, state: &mut PhaseState, mode: CleanupMode, confidence: f64) -> Result<()> {
        let Some(analysis) = &state.analysis else {
            return Err(RepoWardenError::MissingInput(
                "no redundancy analysis to act on".to_string(),
            ));
        };
        let orchestrator = CleanupOrchestrator::new(
            self.engine.root(),
            self.engine.config(),
            self.engine.store(),
        )?
        .with_archiver(self.archiver.clone());

        let plan = orchestrator.run(analysis, mode, confidence);
        self.engine
            .store()
            .write(ArtifactKind::Cleanup, &file_stamp(plan.timestamp), &plan)?;

        if let Some(reason) = &plan.downgrade_reason {
            return Err(RepoWardenError::BackupFailure(reason.clone()));
        }
        if !plan.errors.is_empty() {
            return Err(RepoWardenError::Io(std::io::Error::other(plan.errors.join("; "))));
        }
        Ok(())
    }

    fn post_health(&self, state: &mut PhaseState) -> Result<()> {
        let analysis = self.engine.analyze()?;
        let health = self.engine.collect_health(&analysis)?;
        self.engine.record_health(&health)?;
        state.post = Some(health);
        Ok(())
    }

    fn effectiveness(&self, state: &mut PhaseState) -> Result<()> {
        let report = self
            .engine
            .trend_analyzer()
            .compare(state.baseline.as_ref(), state.post.as_ref())?;
        self.engine.record_trends(&report)?;
        if let Some(post) = &state.post {
            self.engine.record_alerts(&self.engine.alerts_for(post))?;
        }
        state.effectiveness = Some(report);
        Ok(())
    }
}
