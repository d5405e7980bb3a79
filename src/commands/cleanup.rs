use anyhow::{Context, Result};
use colored::Colorize;

use super::context::{print_json, CommandContext};
use super::Outcome;
use crate::cleanup::{CleanupAction, CleanupMode, CleanupOrchestrator, CleanupPlan};
use crate::config::validation::validate_threshold;
use crate::core::file_stamp;
use crate::io::lock::RunLock;
use crate::io::store::ArtifactKind;

/// Analyse, then act on pairs scoring at least `confidence`. A mutating
/// mode holds the run lock for the whole pass. A downgrade to preview or
/// any per-file error flags the run.
pub fn handle_cleanup(ctx: &CommandContext, mode: CleanupMode, confidence: f64) -> Result<Outcome> {
    let confidence = validate_threshold("confidence", confidence)?;
    let _lock = if mode.is_mutating() {
        Some(RunLock::acquire(&ctx.output_dir())?)
    } else {
        None
    };

    let engine = ctx.engine();
    let analysis = engine.analyze().context("Redundancy analysis failed")?;
    engine.record_analysis(&analysis)?;

    let orchestrator = CleanupOrchestrator::new(engine.root(), engine.config(), engine.store())?;
    let plan = orchestrator.run(&analysis, mode, confidence);
    let artifact = engine
        .store()
        .write(ArtifactKind::Cleanup, &file_stamp(plan.timestamp), &plan)?;
    engine.refresh_dashboard()?;

    if ctx.is_json() {
        print_json(&plan)?;
    } else {
        print_summary(&plan);
        println!("Plan written to {}", artifact.display());
    }
    Ok(Outcome::flagged_if(!plan.is_success()))
}

fn print_summary(plan: &CleanupPlan) {
    println!(
        "{} {} mode, confidence {:.1}",
        "Cleanup:".bold(),
        plan.mode,
        plan.confidence
    );
    if let Some(reason) = &plan.downgrade_reason {
        println!(
            "{} requested {} but ran as preview: {}",
            "Downgraded:".red().bold(),
            plan.requested_mode,
            reason
        );
    }
    if let Some(backup) = &plan.backup_ref {
        println!("Backup: {}", backup.archive.display());
    }

    let annotations = plan
        .actions
        .iter()
        .filter(|a| matches!(a, CleanupAction::Annotate { .. }))
        .count();
    let reviews = plan.actions.len() - annotations;
    println!(
        "{} annotation actions ({} inserted), {} review actions ({} templates written)",
        annotations,
        plan.annotations_inserted(),
        reviews,
        plan.reviews_written()
    );
    if !plan.files_modified.is_empty() {
        println!("{} files modified", plan.files_modified.len());
    }
    for error in &plan.errors {
        println!("{} {}", "error:".red(), error);
    }
}
