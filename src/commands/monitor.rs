use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use serde::Serialize;

use super::context::{print_json, CommandContext};
use super::Outcome;
use crate::alerts::{AlertSet, Severity};
use crate::engine::MonitorOutcome;
use crate::health::HealthMetrics;
use crate::io::output::score_status;
use crate::trends::{TrendDirection, TrendReport};

#[derive(Serialize)]
struct MonitorOutput<'a> {
    health: &'a HealthMetrics,
    trends: Option<&'a TrendReport>,
    trend_note: Option<&'a str>,
    alerts: &'a AlertSet,
}

/// One monitoring pass. Flagged when the snapshot raises a critical alert;
/// too little history for trends is reported but never fails the command.
pub fn handle_monitor(ctx: &CommandContext) -> Result<Outcome> {
    let outcome = ctx.engine().monitor().context("Monitoring pass failed")?;

    if ctx.is_json() {
        print_json(&MonitorOutput {
            health: &outcome.health,
            trends: outcome.trends.as_ref(),
            trend_note: outcome.trend_note.as_deref(),
            alerts: &outcome.alerts,
        })?;
    } else {
        print_summary(&outcome);
    }
    Ok(Outcome::flagged_if(outcome.alerts.severity == Severity::Critical))
}

fn score_color(score: f64) -> Color {
    if score >= 80.0 {
        Color::Green
    } else if score >= 60.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn print_summary(outcome: &MonitorOutcome) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Metric", "Score", "Status", "Trend"]);
    for (name, score) in outcome.health.scores() {
        let trend = outcome
            .trends
            .as_ref()
            .and_then(|t| t.per_metric.get(name))
            .map(|t| format!("{:+} ({})", t.change, t.direction))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{score:.1}")).fg(score_color(score)),
            Cell::new(score_status(score)),
            Cell::new(trend),
        ]);
    }
    println!("{table}");

    if let Some(note) = &outcome.trend_note {
        println!("{} {}", "Trends unavailable:".yellow(), note);
    } else if let Some(trends) = &outcome.trends {
        let declining = trends
            .per_metric
            .values()
            .filter(|t| t.direction == TrendDirection::Declining)
            .count();
        if declining > 0 {
            println!("{} {} metrics declining", "Trends:".yellow(), declining);
        }
    }

    let alerts = &outcome.alerts;
    for alert in &alerts.critical {
        println!("{} {}", "CRITICAL".red().bold(), alert.message);
    }
    for alert in &alerts.warning {
        println!("{} {}", "WARNING".yellow().bold(), alert.message);
    }
    for alert in &alerts.info {
        println!("{} {}", "INFO".blue(), alert.message);
    }

    let severity = match alerts.severity {
        Severity::Clean => alerts.severity.to_string().green(),
        Severity::Warning => alerts.severity.to_string().yellow(),
        Severity::Critical => alerts.severity.to_string().red().bold(),
    };
    println!("{} {}", "Alert status:".bold(), severity);
    println!("Dashboard: {}", outcome.dashboard.display());
}
