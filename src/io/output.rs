use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::alerts::{Alert, AlertSet};
use crate::cleanup::CleanupPlan;
use crate::errors::Result;
use crate::health::HealthMetrics;
use crate::io::store::{ArtifactKind, ReportStore};
use crate::redundancy::AnalysisReport;
use crate::trends::TrendReport;
use crate::workflow::WorkflowRun;

/// The latest of each report, as summarised on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub health: Option<HealthMetrics>,
    /// Health snapshots on record
    pub history_len: usize,
    pub trends: Option<TrendReport>,
    pub alerts: Option<AlertSet>,
    pub redundancy: Option<AnalysisReport>,
    pub cleanup: Option<CleanupPlan>,
    pub workflow: Option<WorkflowRun>,
}

impl Dashboard {
    pub fn from_store(store: &ReportStore) -> Result<Self> {
        let history = store.health_history()?;
        let trends = if history.len() >= 2 {
            store.latest(ArtifactKind::Trends)?
        } else {
            None
        };
        Ok(Self {
            generated_at: Utc::now(),
            health: history.last().cloned(),
            history_len: history.len(),
            trends,
            alerts: store.latest(ArtifactKind::Alerts)?,
            redundancy: store.latest(ArtifactKind::Redundancy)?,
            cleanup: store.latest(ArtifactKind::Cleanup)?,
            workflow: store.latest(ArtifactKind::Workflow)?,
        })
    }
}

pub trait OutputWriter {
    fn write_dashboard(&mut self, dashboard: &Dashboard) -> Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_dashboard(&mut self, dashboard: &Dashboard) -> Result<()> {
        let json = serde_json::to_string_pretty(dashboard)?;
        self.writer.write_all(json.as_bytes())?;
        Ok(())
    }
}

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_dashboard(&mut self, dashboard: &Dashboard) -> Result<()> {
        self.write_header(dashboard)?;
        self.write_health(dashboard)?;
        self.write_trends(dashboard)?;
        self.write_alerts(dashboard)?;
        self.write_redundancy(dashboard)?;
        self.write_cleanup(dashboard)?;
        self.write_workflow(dashboard)?;
        Ok(())
    }
}

/// Status label for a 0-100 score.
pub fn score_status(score: f64) -> &'static str {
    if score >= 80.0 {
        "Good"
    } else if score >= 60.0 {
        "Fair"
    } else {
        "Poor"
    }
}

impl<W: Write> MarkdownWriter<W> {
    fn write_header(&mut self, dashboard: &Dashboard) -> Result<()> {
        writeln!(self.writer, "# Repository Health Dashboard")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "Generated: {}",
            dashboard.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_health(&mut self, dashboard: &Dashboard) -> Result<()> {
        writeln!(self.writer, "## Health")?;
        writeln!(self.writer)?;
        let Some(health) = &dashboard.health else {
            writeln!(self.writer, "No health snapshot recorded yet.")?;
            writeln!(self.writer)?;
            return Ok(());
        };

        writeln!(
            self.writer,
            "Snapshot: {} ({} on record)",
            health.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            dashboard.history_len
        )?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Metric | Score | Status |")?;
        writeln!(self.writer, "|--------|-------|--------|")?;
        for (name, score) in health.scores() {
            writeln!(self.writer, "| {} | {:.1} | {} |", name, score, score_status(score))?;
        }
        writeln!(self.writer)?;

        let c = &health.codebase;
        writeln!(
            self.writer,
            "Files: {} ({} code, {} test, {} docs). Lines sampled: {} across {} files.",
            c.total_files, c.code_files, c.test_files, c.doc_files, c.total_lines, c.sampled_files
        )?;
        writeln!(
            self.writer,
            "Code density {:.1}%, comment ratio {:.1}%, estimated test coverage {:.1}%.",
            c.code_density, c.comment_ratio, c.test_coverage_estimate
        )?;
        writeln!(
            self.writer,
            "Security issues: {}. Redundant pairs: {} function, {} documentation.",
            health.security.issues_count, health.redundancy.function_pairs, health.redundancy.doc_pairs
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_trends(&mut self, dashboard: &Dashboard) -> Result<()> {
        writeln!(self.writer, "## Trends")?;
        writeln!(self.writer)?;
        let Some(trends) = &dashboard.trends else {
            writeln!(
                self.writer,
                "Insufficient data: {} health snapshot(s) recorded, at least 2 needed.",
                dashboard.history_len
            )?;
            writeln!(self.writer)?;
            return Ok(());
        };

        writeln!(
            self.writer,
            "From {} to {} ({} snapshots)",
            trends.from.format("%Y-%m-%d %H:%M"),
            trends.to.format("%Y-%m-%d %H:%M"),
            trends.snapshots_considered
        )?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Metric | Change | Direction |")?;
        writeln!(self.writer, "|--------|--------|-----------|")?;
        for (name, trend) in &trends.per_metric {
            writeln!(self.writer, "| {} | {:+} | {} |", name, trend.change, trend.direction)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_alert_group(&mut self, title: &str, alerts: &[Alert]) -> Result<()> {
        if alerts.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "### {title}")?;
        writeln!(self.writer)?;
        for alert in alerts {
            writeln!(self.writer, "- `{}`: {}", alert.alert_type, alert.message)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_alerts(&mut self, dashboard: &Dashboard) -> Result<()> {
        writeln!(self.writer, "## Alerts")?;
        writeln!(self.writer)?;
        let Some(alerts) = &dashboard.alerts else {
            writeln!(self.writer, "No alerts generated yet.")?;
            writeln!(self.writer)?;
            return Ok(());
        };
        writeln!(self.writer, "Severity: **{}**", alerts.severity)?;
        writeln!(self.writer)?;
        self.write_alert_group("Critical", &alerts.critical)?;
        self.write_alert_group("Warning", &alerts.warning)?;
        self.write_alert_group("Info", &alerts.info)?;
        Ok(())
    }

    fn write_redundancy(&mut self, dashboard: &Dashboard) -> Result<()> {
        writeln!(self.writer, "## Redundancy")?;
        writeln!(self.writer)?;
        let Some(analysis) = &dashboard.redundancy else {
            writeln!(self.writer, "No redundancy analysis recorded yet.")?;
            writeln!(self.writer)?;
            return Ok(());
        };

        writeln!(self.writer, "| Class | Kind | Units | Compared | Pairs |")?;
        writeln!(self.writer, "|-------|------|-------|----------|-------|")?;
        for report in &analysis.reports {
            writeln!(
                self.writer,
                "| {} | {} | {} | {} | {} |",
                report.class,
                report.kind,
                report.total_units,
                report.compared_units,
                report.redundant_pairs.len()
            )?;
        }
        writeln!(self.writer)?;

        let mut top: Vec<_> = analysis.pairs().collect();
        top.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
        if !top.is_empty() {
            writeln!(self.writer, "Top pairs:")?;
            writeln!(self.writer)?;
            for pair in top.iter().take(5) {
                writeln!(
                    self.writer,
                    "- {:.1}% `{}` ~ `{}`",
                    pair.combined_score,
                    pair.unit_a.location(),
                    pair.unit_b.location()
                )?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_cleanup(&mut self, dashboard: &Dashboard) -> Result<()> {
        let Some(plan) = &dashboard.cleanup else {
            return Ok(());
        };
        writeln!(self.writer, "## Last Cleanup")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "{}: mode {} (requested {}), confidence {:.0}, {} actions, {} annotations, {} reviews.",
            plan.timestamp.format("%Y-%m-%d %H:%M"),
            plan.mode,
            plan.requested_mode,
            plan.confidence,
            plan.actions.len(),
            plan.annotations_inserted(),
            plan.reviews_written()
        )?;
        if let Some(reason) = &plan.downgrade_reason {
            writeln!(self.writer)?;
            writeln!(self.writer, "Downgraded to preview: {reason}")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_workflow(&mut self, dashboard: &Dashboard) -> Result<()> {
        let Some(run) = &dashboard.workflow else {
            return Ok(());
        };
        writeln!(self.writer, "## Last Workflow")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "{}: {} mode, {} cleanup. {} completed, {} failed. {}",
            run.timestamp.format("%Y-%m-%d %H:%M"),
            run.mode,
            run.cleanup_mode,
            run.summary.completed,
            run.summary.failed,
            if run.summary.overall_success { "Success" } else { "Failed" }
        )?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Phase | Status | Exit |")?;
        writeln!(self.writer, "|-------|--------|------|")?;
        for phase in &run.phases {
            writeln!(
                self.writer,
                "| {} | {} | {} |",
                phase.name,
                phase.status,
                phase.exit_code.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string())
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}
