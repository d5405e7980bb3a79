//! Scoring configuration: similarity weight profiles and health weights.

use serde::{Deserialize, Serialize};

/// Weights blending the three similarity sub-scores into a combined score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    pub lexical: f64,
    pub structural: f64,
    pub semantic: f64,
}

impl WeightProfile {
    pub const fn new(lexical: f64, structural: f64, semantic: f64) -> Self {
        Self {
            lexical,
            structural,
            semantic,
        }
    }

    pub fn sum(&self) -> f64 {
        self.lexical + self.structural + self.semantic
    }

    pub fn blend(&self, lexical: f64, structural: f64, semantic: f64) -> f64 {
        self.lexical * lexical + self.structural * structural + self.semantic * semantic
    }
}

/// Per-profile similarity weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityWeights {
    #[serde(default = "default_code_profile")]
    pub code: WeightProfile,

    #[serde(default = "default_documentation_profile")]
    pub documentation: WeightProfile,

    #[serde(default = "default_structural_profile")]
    pub structural: WeightProfile,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            code: default_code_profile(),
            documentation: default_documentation_profile(),
            structural: default_structural_profile(),
        }
    }
}

fn default_code_profile() -> WeightProfile {
    WeightProfile::new(0.40, 0.50, 0.10)
}
fn default_documentation_profile() -> WeightProfile {
    WeightProfile::new(0.50, 0.10, 0.40)
}
fn default_structural_profile() -> WeightProfile {
    WeightProfile::new(0.30, 0.60, 0.10)
}

/// Weights of the five health sub-scores in `overall_health`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthWeights {
    #[serde(default = "default_redundancy_weight")]
    pub redundancy: f64,
    #[serde(default = "default_complexity_weight")]
    pub complexity: f64,
    #[serde(default = "default_maintainability_weight")]
    pub maintainability: f64,
    #[serde(default = "default_security_weight")]
    pub security: f64,
    #[serde(default = "default_performance_weight")]
    pub performance: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            redundancy: default_redundancy_weight(),
            complexity: default_complexity_weight(),
            maintainability: default_maintainability_weight(),
            security: default_security_weight(),
            performance: default_performance_weight(),
        }
    }
}

impl HealthWeights {
    pub fn sum(&self) -> f64 {
        self.redundancy + self.complexity + self.maintainability + self.security + self.performance
    }

    pub fn as_pairs(&self) -> [(&'static str, f64); 5] {
        [
            ("redundancy", self.redundancy),
            ("complexity", self.complexity),
            ("maintainability", self.maintainability),
            ("security", self.security),
            ("performance", self.performance),
        ]
    }
}

fn default_redundancy_weight() -> f64 {
    0.25
}
fn default_complexity_weight() -> f64 {
    0.20
}
fn default_maintainability_weight() -> f64 {
    0.25
}
fn default_security_weight() -> f64 {
    0.20
}
fn default_performance_weight() -> f64 {
    0.10
}

/// Health scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Maximum number of source files classified line by line
    #[serde(default = "default_sample_files")]
    pub sample_files: usize,

    /// Files longer than this count toward the first size tier
    #[serde(default = "default_medium_file_lines")]
    pub medium_file_lines: usize,

    /// Files longer than this count toward the second size tier
    #[serde(default = "default_large_file_lines")]
    pub large_file_lines: usize,

    /// Complexity points lost per percent of medium-tier files
    #[serde(default = "default_medium_penalty")]
    pub medium_penalty: f64,

    /// Complexity points lost per percent of large-tier files
    #[serde(default = "default_large_penalty")]
    pub large_penalty: f64,

    #[serde(default)]
    pub weights: HealthWeights,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            sample_files: default_sample_files(),
            medium_file_lines: default_medium_file_lines(),
            large_file_lines: default_large_file_lines(),
            medium_penalty: default_medium_penalty(),
            large_penalty: default_large_penalty(),
            weights: HealthWeights::default(),
        }
    }
}

fn default_sample_files() -> usize {
    200
}
fn default_medium_file_lines() -> usize {
    300
}
fn default_large_file_lines() -> usize {
    1000
}
fn default_medium_penalty() -> f64 {
    0.25
}
fn default_large_penalty() -> f64 {
    0.5
}
