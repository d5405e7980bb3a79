use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use super::context::{print_json, CommandContext};
use super::Outcome;
use crate::health::HealthMetrics;
use crate::io::output::score_status;
use crate::redundancy::AnalysisReport;

#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    analysis: &'a AnalysisReport,
    health: &'a HealthMetrics,
}

/// Extract units, detect redundant pairs and record a health snapshot.
/// Findings never fail the command; alerts are `monitor`'s concern.
pub fn handle_analyze(ctx: &CommandContext) -> Result<Outcome> {
    let engine = ctx.engine();
    let analysis = engine.analyze().context("Redundancy analysis failed")?;
    engine.record_analysis(&analysis)?;
    let health = engine
        .collect_health(&analysis)
        .context("Health scoring failed")?;
    engine.record_health(&health)?;
    engine.refresh_dashboard()?;

    if ctx.is_json() {
        print_json(&AnalyzeOutput {
            analysis: &analysis,
            health: &health,
        })?;
    } else {
        print_summary(&analysis, &health);
    }
    Ok(Outcome::Success)
}

fn print_summary(analysis: &AnalysisReport, health: &HealthMetrics) {
    println!(
        "{} {} files scanned, {} skipped",
        "Analysis:".bold(),
        analysis.files_scanned,
        analysis.files_skipped
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Class", "Units", "Compared", "Redundant pairs"]);
    for report in &analysis.reports {
        table.add_row(vec![
            report.class.to_string(),
            report.total_units.to_string(),
            report.compared_units.to_string(),
            report.redundant_pairs.len().to_string(),
        ]);
    }
    println!("{table}");

    let pairs = analysis.pairs().count();
    let pairs_line = format!("{pairs} redundant pairs");
    if pairs == 0 {
        println!("{}", pairs_line.green());
    } else {
        println!("{}", pairs_line.yellow());
    }
    println!(
        "{} {:.1} ({})",
        "Overall health:".bold(),
        health.overall_health,
        score_status(health.overall_health)
    );
}
