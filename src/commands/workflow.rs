use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};

use super::context::{print_json, CommandContext};
use super::Outcome;
use crate::alerts::{AlertSet, Severity};
use crate::cleanup::CleanupMode;
use crate::config::validation::validate_threshold;
use crate::engine::Engine;
use crate::io::lock::RunLock;
use crate::io::store::ArtifactKind;
use crate::workflow::{PhaseName, PhaseStatus, WorkflowCoordinator, WorkflowMode, WorkflowRun};

/// Run the five phases under the run lock. Flagged when any phase failed
/// or the post-cleanup snapshot raised a critical alert.
pub fn handle_workflow(
    ctx: &CommandContext,
    mode: WorkflowMode,
    cleanup_mode: CleanupMode,
    confidence: f64,
) -> Result<Outcome> {
    let confidence = validate_threshold("confidence", confidence)?;
    let _lock = RunLock::acquire(&ctx.output_dir())?;

    let engine = Engine::new(&ctx.root, mode.apply(ctx.config.clone()));
    let run = WorkflowCoordinator::new(&engine).run(mode, cleanup_mode, confidence);

    let effectiveness_ok = run
        .phase(PhaseName::EffectivenessMonitor)
        .is_some_and(|p| p.status == PhaseStatus::Success);
    let alerts: Option<AlertSet> = if effectiveness_ok {
        engine.store().latest(ArtifactKind::Alerts)?
    } else {
        None
    };
    let critical = alerts
        .as_ref()
        .is_some_and(|a| a.severity == Severity::Critical);

    if ctx.is_json() {
        print_json(&run)?;
    } else {
        print_summary(&run, alerts.as_ref());
    }
    Ok(Outcome::flagged_if(!run.summary.overall_success || critical))
}

fn print_summary(run: &WorkflowRun, alerts: Option<&AlertSet>) {
    println!(
        "{} {} mode, {} cleanup at confidence {:.1}",
        "Workflow:".bold(),
        run.mode,
        run.cleanup_mode,
        run.confidence
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Phase", "Status", "Exit", "Error"]);
    for phase in &run.phases {
        let color = match phase.status {
            PhaseStatus::Success => Color::Green,
            PhaseStatus::Failed => Color::Red,
            PhaseStatus::Pending => Color::Yellow,
        };
        table.add_row(vec![
            Cell::new(phase.name),
            Cell::new(phase.status).fg(color),
            Cell::new(phase.exit_code.map_or("-".to_string(), |c| c.to_string())),
            Cell::new(phase.error.as_deref().unwrap_or("")),
        ]);
    }
    println!("{table}");

    if let Some(report) = &run.effectiveness {
        if let Some(trend) = report.per_metric.get("overall") {
            println!(
                "Overall health {:.1} -> {:.1} ({:+}, {})",
                trend.earliest, trend.latest, trend.change, trend.direction
            );
        }
    }
    if let Some(alerts) = alerts {
        println!("Alert status: {}", alerts.severity);
    }

    let summary = format!(
        "{} phases completed, {} failed",
        run.summary.completed, run.summary.failed
    );
    if run.summary.overall_success {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.red().bold());
    }
}
