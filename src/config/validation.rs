//! Startup validation of thresholds and weights.
//!
//! Every problem is collected before reporting so a user sees all of them in
//! one run. Any problem aborts the command before analysis starts.

use super::scoring::WeightProfile;
use super::RepoWardenConfig;
use crate::errors::{RepoWardenError, Result};

const WEIGHT_TOLERANCE: f64 = 0.001;

/// A single configuration problem with its dotted field path.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn check_score(field: &str, value: f64, issues: &mut Vec<ConfigIssue>) {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        issues.push(ConfigIssue::new(
            field,
            format!("must be between 0 and 100, got {value}"),
        ));
    }
}

fn check_positive(field: &str, value: usize, issues: &mut Vec<ConfigIssue>) {
    if value == 0 {
        issues.push(ConfigIssue::new(field, "must be greater than 0"));
    }
}

fn check_profile(field: &str, profile: &WeightProfile, issues: &mut Vec<ConfigIssue>) {
    for (name, weight) in [
        ("lexical", profile.lexical),
        ("structural", profile.structural),
        ("semantic", profile.semantic),
    ] {
        if !weight.is_finite() || weight < 0.0 {
            issues.push(ConfigIssue::new(
                format!("{field}.{name}"),
                format!("weight must be non-negative, got {weight}"),
            ));
        }
    }
    if (profile.sum() - 1.0).abs() > WEIGHT_TOLERANCE {
        issues.push(ConfigIssue::new(
            field,
            format!("weights must sum to 1.0, but sum to {:.3}", profile.sum()),
        ));
    }
}

/// Collect every configuration problem.
pub fn collect_issues(config: &RepoWardenConfig) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    check_score(
        "detection.similarity_threshold",
        config.detection.similarity_threshold,
        &mut issues,
    );
    check_positive(
        "detection.max_units_per_class",
        config.detection.max_units_per_class,
        &mut issues,
    );
    check_positive("extraction.body_lines", config.extraction.body_lines, &mut issues);
    check_positive(
        "extraction.doc_section_max_lines",
        config.extraction.doc_section_max_lines,
        &mut issues,
    );
    for pattern in &config.extraction.exclude {
        if let Err(e) = glob::Pattern::new(pattern) {
            issues.push(ConfigIssue::new(
                "extraction.exclude",
                format!("invalid glob `{pattern}`: {e}"),
            ));
        }
    }

    check_profile("similarity.code", &config.similarity.code, &mut issues);
    check_profile(
        "similarity.documentation",
        &config.similarity.documentation,
        &mut issues,
    );
    check_profile("similarity.structural", &config.similarity.structural, &mut issues);

    let health = &config.health;
    check_positive("health.sample_files", health.sample_files, &mut issues);
    if health.medium_file_lines >= health.large_file_lines {
        issues.push(ConfigIssue::new(
            "health.medium_file_lines",
            "must be smaller than health.large_file_lines",
        ));
    }
    for (name, penalty) in [
        ("health.medium_penalty", health.medium_penalty),
        ("health.large_penalty", health.large_penalty),
    ] {
        if !penalty.is_finite() || penalty < 0.0 {
            issues.push(ConfigIssue::new(name, "penalty must be non-negative"));
        }
    }
    for (name, weight) in health.weights.as_pairs() {
        if !weight.is_finite() || weight < 0.0 {
            issues.push(ConfigIssue::new(
                format!("health.weights.{name}"),
                "weight must be non-negative",
            ));
        }
    }
    if (health.weights.sum() - 1.0).abs() > WEIGHT_TOLERANCE {
        issues.push(ConfigIssue::new(
            "health.weights",
            format!("weights must sum to 1.0, but sum to {:.3}", health.weights.sum()),
        ));
    }

    for (name, value) in config.alerts.score_fields() {
        check_score(&format!("alerts.{name}"), value, &mut issues);
    }
    if config.alerts.health_critical > config.alerts.health_warning {
        issues.push(ConfigIssue::new(
            "alerts.health_critical",
            "must not exceed alerts.health_warning",
        ));
    }
    if config.alerts.function_pairs_warning > config.alerts.function_pairs_critical {
        issues.push(ConfigIssue::new(
            "alerts.function_pairs_warning",
            "must not exceed alerts.function_pairs_critical",
        ));
    }

    if config.trends.window < 2 {
        issues.push(ConfigIssue::new(
            "trends.window",
            "must cover at least 2 snapshots",
        ));
    }
    if config.trends.sensitivity < 0 {
        issues.push(ConfigIssue::new("trends.sensitivity", "must be non-negative"));
    }

    check_score(
        "cleanup.annotate_threshold",
        config.cleanup.annotate_threshold,
        &mut issues,
    );
    check_score(
        "cleanup.bidirectional_threshold",
        config.cleanup.bidirectional_threshold,
        &mut issues,
    );

    issues
}

/// Validate the configuration, failing with `ThresholdMisconfiguration`
/// naming every offending field.
pub fn validate_config(config: &RepoWardenConfig) -> Result<()> {
    let issues = collect_issues(config);
    if issues.is_empty() {
        return Ok(());
    }

    let field = issues
        .iter()
        .map(|i| i.field.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let message = issues
        .iter()
        .map(|i| format!("{}: {}", i.field, i.message))
        .collect::<Vec<_>>()
        .join("; ");
    Err(RepoWardenError::misconfigured(field, message))
}

/// Validate a similarity threshold supplied on the command line.
pub fn validate_threshold(field: &str, value: f64) -> Result<f64> {
    let mut issues = Vec::new();
    check_score(field, value, &mut issues);
    match issues.pop() {
        Some(issue) => Err(RepoWardenError::misconfigured(issue.field, issue.message)),
        None => Ok(value),
    }
}
