use serde::{Deserialize, Serialize};

/// Fixed alert thresholds applied to one health snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Overall health below this is critical
    #[serde(default = "default_health_critical")]
    pub health_critical: f64,

    /// Overall health below this is a warning
    #[serde(default = "default_health_warning")]
    pub health_warning: f64,

    /// Redundancy score below this is a warning
    #[serde(default = "default_redundancy_warning")]
    pub redundancy_warning: f64,

    /// More redundant function pairs than this is critical
    #[serde(default = "default_function_pairs_critical")]
    pub function_pairs_critical: usize,

    /// At least this many redundant function pairs is a warning
    #[serde(default = "default_function_pairs_warning")]
    pub function_pairs_warning: usize,

    /// More redundant doc-section pairs than this is a warning
    #[serde(default = "default_doc_pairs_warning")]
    pub doc_pairs_warning: usize,

    /// Security score below this is critical
    #[serde(default = "default_security_score_critical")]
    pub security_score_critical: f64,

    /// More security issues than this is critical
    #[serde(default = "default_security_issues_critical")]
    pub security_issues_critical: usize,

    /// Test coverage estimate below this (percent) is a warning
    #[serde(default = "default_coverage_warning")]
    pub coverage_warning: f64,

    /// Comment ratio below this (percent) is a warning
    #[serde(default = "default_comment_ratio_warning")]
    pub comment_ratio_warning: f64,

    #[serde(default = "default_excellent_health")]
    pub excellent_health: f64,

    #[serde(default = "default_excellent_redundancy")]
    pub excellent_redundancy: f64,

    #[serde(default = "default_good_coverage")]
    pub good_coverage: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            health_critical: default_health_critical(),
            health_warning: default_health_warning(),
            redundancy_warning: default_redundancy_warning(),
            function_pairs_critical: default_function_pairs_critical(),
            function_pairs_warning: default_function_pairs_warning(),
            doc_pairs_warning: default_doc_pairs_warning(),
            security_score_critical: default_security_score_critical(),
            security_issues_critical: default_security_issues_critical(),
            coverage_warning: default_coverage_warning(),
            comment_ratio_warning: default_comment_ratio_warning(),
            excellent_health: default_excellent_health(),
            excellent_redundancy: default_excellent_redundancy(),
            good_coverage: default_good_coverage(),
        }
    }
}

impl AlertThresholds {
    /// Score-valued thresholds, for range validation.
    pub fn score_fields(&self) -> [(&'static str, f64); 9] {
        [
            ("health_critical", self.health_critical),
            ("health_warning", self.health_warning),
            ("redundancy_warning", self.redundancy_warning),
            ("security_score_critical", self.security_score_critical),
            ("coverage_warning", self.coverage_warning),
            ("comment_ratio_warning", self.comment_ratio_warning),
            ("excellent_health", self.excellent_health),
            ("excellent_redundancy", self.excellent_redundancy),
            ("good_coverage", self.good_coverage),
        ]
    }
}

fn default_health_critical() -> f64 {
    50.0
}
fn default_health_warning() -> f64 {
    70.0
}
fn default_redundancy_warning() -> f64 {
    20.0
}
fn default_function_pairs_critical() -> usize {
    10
}
fn default_function_pairs_warning() -> usize {
    5
}
fn default_doc_pairs_warning() -> usize {
    3
}
fn default_security_score_critical() -> f64 {
    60.0
}
fn default_security_issues_critical() -> usize {
    15
}
fn default_coverage_warning() -> f64 {
    30.0
}
fn default_comment_ratio_warning() -> f64 {
    10.0
}
fn default_excellent_health() -> f64 {
    90.0
}
fn default_excellent_redundancy() -> f64 {
    90.0
}
fn default_good_coverage() -> f64 {
    70.0
}
