//! Threshold-tiered alerts for one health snapshot.
//!
//! Each metric is checked independently, so a snapshot can raise several
//! alerts of different severities at once. Generation is a pure function of
//! the snapshot and the configured [`AlertThresholds`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::AlertThresholds;
use crate::health::HealthMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    CriticalHealth,
    LowHealth,
    HighRedundancy,
    CriticalFunctionRedundancy,
    FunctionRedundancy,
    DocRedundancy,
    SecurityRisk,
    SecurityIssues,
    LowTestCoverage,
    LowCommentRatio,
    ExcellentHealth,
    ExcellentRedundancy,
    GoodTestCoverage,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertType::CriticalHealth => "critical_health",
            AlertType::LowHealth => "low_health",
            AlertType::HighRedundancy => "high_redundancy",
            AlertType::CriticalFunctionRedundancy => "critical_function_redundancy",
            AlertType::FunctionRedundancy => "function_redundancy",
            AlertType::DocRedundancy => "doc_redundancy",
            AlertType::SecurityRisk => "security_risk",
            AlertType::SecurityIssues => "security_issues",
            AlertType::LowTestCoverage => "low_test_coverage",
            AlertType::LowCommentRatio => "low_comment_ratio",
            AlertType::ExcellentHealth => "excellent_health",
            AlertType::ExcellentRedundancy => "excellent_redundancy",
            AlertType::GoodTestCoverage => "good_test_coverage",
        };
        f.write_str(name)
    }
}

/// A single alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: String,
    pub metric: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl Alert {
    fn new(
        alert_type: AlertType,
        metric: &str,
        value: f64,
        threshold: Option<f64>,
        message: String,
    ) -> Self {
        Self {
            alert_type,
            message,
            metric: metric.to_string(),
            value,
            threshold,
        }
    }
}

/// Aggregate severity of an alert set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Clean,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Clean => f.write_str("clean"),
            Severity::Warning => f.write_str("warning"),
            Severity::Critical => f.write_str("critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSet {
    pub timestamp: DateTime<Utc>,
    /// Timestamp of the snapshot the alerts were derived from
    pub snapshot: DateTime<Utc>,
    pub severity: Severity,
    pub critical: Vec<Alert>,
    pub warning: Vec<Alert>,
    pub info: Vec<Alert>,
}

impl AlertSet {
    pub fn has(&self, alert_type: AlertType) -> bool {
        self.all().any(|a| a.alert_type == alert_type)
    }

    pub fn all(&self) -> impl Iterator<Item = &Alert> {
        self.critical
            .iter()
            .chain(self.warning.iter())
            .chain(self.info.iter())
    }
}

pub struct AlertGenerator<'a> {
    thresholds: &'a AlertThresholds,
}

impl<'a> AlertGenerator<'a> {
    pub fn new(thresholds: &'a AlertThresholds) -> Self {
        Self { thresholds }
    }

    pub fn generate(&self, metrics: &HealthMetrics) -> AlertSet {
        let t = self.thresholds;
        let mut critical = Vec::new();
        let mut warning = Vec::new();
        let mut info = Vec::new();

        let health = metrics.overall_health;
        if health < t.health_critical {
            critical.push(Alert::new(
                AlertType::CriticalHealth,
                "overall_health",
                health,
                Some(t.health_critical),
                format!("Repository health is critical: {health:.1}"),
            ));
        } else if health < t.health_warning {
            warning.push(Alert::new(
                AlertType::LowHealth,
                "overall_health",
                health,
                Some(t.health_warning),
                format!("Repository health is below target: {health:.1}"),
            ));
        } else if health >= t.excellent_health {
            info.push(Alert::new(
                AlertType::ExcellentHealth,
                "overall_health",
                health,
                Some(t.excellent_health),
                format!("Repository health is excellent: {health:.1}"),
            ));
        }

        let redundancy = metrics.redundancy.score;
        if redundancy < t.redundancy_warning {
            warning.push(Alert::new(
                AlertType::HighRedundancy,
                "redundancy_score",
                redundancy,
                Some(t.redundancy_warning),
                format!("Redundancy score is low: {redundancy:.1}"),
            ));
        } else if redundancy >= t.excellent_redundancy {
            info.push(Alert::new(
                AlertType::ExcellentRedundancy,
                "redundancy_score",
                redundancy,
                Some(t.excellent_redundancy),
                format!("Redundancy score is excellent: {redundancy:.1}"),
            ));
        }

        let pairs = metrics.redundancy.function_pairs;
        if pairs > t.function_pairs_critical {
            critical.push(Alert::new(
                AlertType::CriticalFunctionRedundancy,
                "function_pairs",
                pairs as f64,
                Some(t.function_pairs_critical as f64),
                format!("{pairs} redundant function pairs detected"),
            ));
        } else if pairs >= t.function_pairs_warning {
            warning.push(Alert::new(
                AlertType::FunctionRedundancy,
                "function_pairs",
                pairs as f64,
                Some(t.function_pairs_warning as f64),
                format!("{pairs} redundant function pairs detected"),
            ));
        }

        let doc_pairs = metrics.redundancy.doc_pairs;
        if doc_pairs > t.doc_pairs_warning {
            warning.push(Alert::new(
                AlertType::DocRedundancy,
                "doc_pairs",
                doc_pairs as f64,
                Some(t.doc_pairs_warning as f64),
                format!("{doc_pairs} redundant documentation section pairs detected"),
            ));
        }

        let security = metrics.security.score;
        if security < t.security_score_critical {
            critical.push(Alert::new(
                AlertType::SecurityRisk,
                "security_score",
                security,
                Some(t.security_score_critical),
                format!("Security score is critical: {security:.1}"),
            ));
        }

        let issues = metrics.security.issues_count;
        if issues > t.security_issues_critical {
            critical.push(Alert::new(
                AlertType::SecurityIssues,
                "security_issues",
                issues as f64,
                Some(t.security_issues_critical as f64),
                format!("{issues} potential security issues found"),
            ));
        }

        let coverage = metrics.codebase.test_coverage_estimate;
        if coverage < t.coverage_warning {
            warning.push(Alert::new(
                AlertType::LowTestCoverage,
                "test_coverage_estimate",
                coverage,
                Some(t.coverage_warning),
                format!("Estimated test coverage is low: {coverage:.1}%"),
            ));
        } else if coverage >= t.good_coverage {
            info.push(Alert::new(
                AlertType::GoodTestCoverage,
                "test_coverage_estimate",
                coverage,
                Some(t.good_coverage),
                format!("Estimated test coverage is good: {coverage:.1}%"),
            ));
        }

        let comments = metrics.codebase.comment_ratio;
        if comments < t.comment_ratio_warning {
            warning.push(Alert::new(
                AlertType::LowCommentRatio,
                "comment_ratio",
                comments,
                Some(t.comment_ratio_warning),
                format!("Comment ratio is low: {comments:.1}%"),
            ));
        }

        let severity = if !critical.is_empty() {
            Severity::Critical
        } else if !warning.is_empty() {
            Severity::Warning
        } else {
            Severity::Clean
        };

        AlertSet {
            timestamp: Utc::now(),
            snapshot: metrics.timestamp,
            severity,
            critical,
            warning,
            info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{
        CodebaseMetrics, PerformanceMetrics, QualityMetrics, RedundancyMetrics, SecurityMetrics,
    };

    fn metrics(overall: f64) -> HealthMetrics {
        HealthMetrics {
            timestamp: Utc::now(),
            codebase: CodebaseMetrics {
                comment_ratio: 15.0,
                test_coverage_estimate: 50.0,
                ..CodebaseMetrics::default()
            },
            redundancy: RedundancyMetrics {
                score: 80.0,
                ..RedundancyMetrics::default()
            },
            quality: QualityMetrics {
                complexity_score: 75.0,
                maintainability_score: 75.0,
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
    fn test_critical_health_is_single_and_aggregate_critical() {
        let thresholds = AlertThresholds::default();
        let alerts = AlertGenerator::new(&thresholds).generate(&metrics(45.0));

        let critical_health: Vec<_> = alerts
            .critical
            .iter()
            .filter(|a| a.alert_type == AlertType::CriticalHealth)
            .collect();
        assert_eq!(critical_health.len(), 1);
        assert!(!alerts.has(AlertType::LowHealth));
        assert_eq!(alerts.severity, Severity::Critical);
    }

    #[test]
    fn test_clean_snapshot() {
        let thresholds = AlertThresholds::default();
        let alerts = AlertGenerator::new(&thresholds).generate(&metrics(80.0));
        assert_eq!(alerts.severity, Severity::Clean);
        assert!(alerts.critical.is_empty());
        assert!(alerts.warning.is_empty());
    }

    #[test]
    fn test_function_pair_tiers() {
        let thresholds = AlertThresholds::default();
        let generator = AlertGenerator::new(&thresholds);

        let mut m = metrics(80.0);
        m.redundancy.function_pairs = 5;
        assert!(generator.generate(&m).has(AlertType::FunctionRedundancy));

        m.redundancy.function_pairs = 10;
        let alerts = generator.generate(&m);
        assert!(alerts.has(AlertType::FunctionRedundancy));
        assert_eq!(alerts.severity, Severity::Warning);

        m.redundancy.function_pairs = 11;
        let alerts = generator.generate(&m);
        assert!(alerts.has(AlertType::CriticalFunctionRedundancy));
        assert!(!alerts.has(AlertType::FunctionRedundancy));
        assert_eq!(alerts.severity, Severity::Critical);
    }

    #[test]
    fn test_independent_metrics_stack() {
        let thresholds = AlertThresholds::default();
        let mut m = metrics(60.0);
        m.redundancy.score = 10.0;
        m.redundancy.doc_pairs = 4;
        m.security.score = 55.0;
        m.security.issues_count = 16;
        m.codebase.test_coverage_estimate = 20.0;
        m.codebase.comment_ratio = 5.0;

        let alerts = AlertGenerator::new(&thresholds).generate(&m);
        for expected in [
            AlertType::LowHealth,
            AlertType::HighRedundancy,
            AlertType::DocRedundancy,
            AlertType::SecurityRisk,
            AlertType::SecurityIssues,
            AlertType::LowTestCoverage,
            AlertType::LowCommentRatio,
        ] {
            assert!(alerts.has(expected), "missing {expected}");
        }
        assert_eq!(alerts.critical.len(), 2);
        assert_eq!(alerts.warning.len(), 5);
    }

    #[test]
    fn test_info_alerts() {
        let thresholds = AlertThresholds::default();
        let mut m = metrics(92.0);
        m.redundancy.score = 95.0;
        m.codebase.test_coverage_estimate = 75.0;
        let alerts = AlertGenerator::new(&thresholds).generate(&m);
        assert_eq!(alerts.info.len(), 3);
        assert_eq!(alerts.severity, Severity::Clean);
    }

    #[test]
    fn test_serialized_type_field() {
        let thresholds = AlertThresholds::default();
        let alerts = AlertGenerator::new(&thresholds).generate(&metrics(45.0));
        let json = serde_json::to_value(&alerts).unwrap();
        assert_eq!(json["critical"][0]["type"], "critical_health");
        assert_eq!(json["severity"], "critical");
    }
}
