//! Repository health scoring.
//!
//! One [`HealthMetrics`] snapshot combines five sub-scores, each in
//! [0, 100], into `overall_health` using [`HealthWeights`]:
//!
//! | sub-score        | starts at | driven by                                    |
//! |------------------|-----------|----------------------------------------------|
//! | redundancy       | 100       | share of redundant functions and doc sections |
//! | complexity       | 75        | share of medium and large files              |
//! | maintainability  | 75        | comment ratio, doc files, test coverage      |
//! | security         | 85        | total security issues, three tiers           |
//! | performance      | 80        | antipattern counts, capped per class         |
//!
//! Snapshots are immutable once built.

pub mod codebase;
pub mod performance;
pub mod security;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{ExtractionConfig, HealthConfig, HealthWeights};
use crate::core::{Language, UnitKind};
use crate::errors::{round1, safe_percentage, Result};
use crate::io::walker::{read_or_skip, FileWalker};
use crate::redundancy::AnalysisReport;

pub use codebase::{classify_lines, CodebaseAccumulator, CodebaseMetrics, LineCounts};
pub use performance::{scan_performance, PerformanceFindings, PerformanceMetrics};
pub use security::{scan_security, SecurityFindings, SecurityMetrics};

/// Redundancy counts and the derived score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedundancyMetrics {
    pub score: f64,
    pub total_functions: usize,
    /// Distinct functions taking part in at least one redundant pair
    pub redundant_functions: usize,
    pub function_pairs: usize,
    pub total_doc_sections: usize,
    pub redundant_doc_sections: usize,
    pub doc_pairs: usize,
}

impl RedundancyMetrics {
    pub fn from_report(report: &AnalysisReport) -> Self {
        let total_functions = report.total_units(UnitKind::Function);
        let redundant_functions = report.redundant_unit_count(UnitKind::Function);
        let total_doc_sections = report.total_units(UnitKind::DocSection);
        let redundant_doc_sections = report.redundant_unit_count(UnitKind::DocSection);
        Self {
            score: redundancy_score(
                total_functions,
                redundant_functions,
                total_doc_sections,
                redundant_doc_sections,
            ),
            total_functions,
            redundant_functions,
            function_pairs: report.pair_count(UnitKind::Function),
            total_doc_sections,
            redundant_doc_sections,
            doc_pairs: report.pair_count(UnitKind::DocSection),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub complexity_score: f64,
    pub maintainability_score: f64,
}

/// One point-in-time health snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub timestamp: DateTime<Utc>,
    pub codebase: CodebaseMetrics,
    pub redundancy: RedundancyMetrics,
    pub quality: QualityMetrics,
    pub security: SecurityMetrics,
    pub performance: PerformanceMetrics,
    pub overall_health: f64,
}

impl HealthMetrics {
    /// Assemble a snapshot, computing `overall_health` from the sub-scores.
    pub fn assemble(
        timestamp: DateTime<Utc>,
        codebase: CodebaseMetrics,
        redundancy: RedundancyMetrics,
        quality: QualityMetrics,
        security: SecurityMetrics,
        performance: PerformanceMetrics,
        weights: &HealthWeights,
    ) -> Self {
        let overall_health = overall_health(
            weights,
            redundancy.score,
            quality.complexity_score,
            quality.maintainability_score,
            security.score,
            performance.score,
        );
        Self {
            timestamp,
            codebase,
            redundancy,
            quality,
            security,
            performance,
            overall_health,
        }
    }

    pub fn redundancy_score(&self) -> f64 {
        self.redundancy.score
    }

    /// The five sub-scores followed by the overall score, in a fixed order.
    pub fn scores(&self) -> [(&'static str, f64); 6] {
        [
            ("redundancy", self.redundancy.score),
            ("complexity", self.quality.complexity_score),
            ("maintainability", self.quality.maintainability_score),
            ("security", self.security.score),
            ("performance", self.performance.score),
            ("overall", self.overall_health),
        ]
    }

    /// Every score lies in [0, 100].
    pub fn is_bounded(&self) -> bool {
        self.scores()
            .iter()
            .all(|(_, score)| score.is_finite() && (0.0..=100.0).contains(score))
    }
}

/// 100 minus 70% of the redundant-function share and 30% of the
/// redundant-doc-section share. Each share is capped at 100%.
pub fn redundancy_score(
    total_functions: usize,
    redundant_functions: usize,
    total_doc_sections: usize,
    redundant_doc_sections: usize,
) -> f64 {
    let functions = safe_percentage(redundant_functions as f64, total_functions as f64).min(100.0);
    let docs = safe_percentage(redundant_doc_sections as f64, total_doc_sections as f64).min(100.0);
    round1((100.0 - functions * 0.7 - docs * 0.3).clamp(0.0, 100.0))
}

/// 75 minus the size-tier penalties over the sampled files.
pub fn complexity_score(codebase: &CodebaseMetrics, config: &HealthConfig) -> f64 {
    let sampled = codebase.sampled_files as f64;
    let medium = safe_percentage(codebase.medium_files as f64, sampled);
    let large = safe_percentage(codebase.large_files as f64, sampled);
    round1((75.0 - medium * config.medium_penalty - large * config.large_penalty).clamp(0.0, 100.0))
}

pub fn maintainability_score(codebase: &CodebaseMetrics) -> f64 {
    let mut score: f64 = 75.0;

    score += match codebase.comment_ratio {
        r if r >= 20.0 => 10.0,
        r if r >= 10.0 => 5.0,
        r if r < 5.0 => -10.0,
        _ => 0.0,
    };

    score += match codebase.doc_files {
        n if n >= 5 => 5.0,
        0 => -10.0,
        _ => 0.0,
    };

    score += match codebase.test_coverage_estimate {
        c if c >= 50.0 => 10.0,
        c if c >= 25.0 => 5.0,
        c if c < 10.0 => -10.0,
        _ => 0.0,
    };

    round1(score.clamp(0.0, 100.0))
}

/// Weighted sum of the five sub-scores. Bounded sub-scores and weights
/// summing to one keep the result in [0, 100]; the bound is still checked.
pub fn overall_health(
    weights: &HealthWeights,
    redundancy: f64,
    complexity: f64,
    maintainability: f64,
    security: f64,
    performance: f64,
) -> f64 {
    let raw = redundancy * weights.redundancy
        + complexity * weights.complexity
        + maintainability * weights.maintainability
        + security * weights.security
        + performance * weights.performance;

    // Weight sums carry float error; only real excursions are reported.
    if !(-1e-6..=100.0 + 1e-6).contains(&raw) {
        warn!("Overall health {:.2} outside [0, 100]; clamping", raw);
    }
    round1(raw.clamp(0.0, 100.0))
}

/// Collects a [`HealthMetrics`] snapshot for a repository.
pub struct HealthScorer<'a> {
    config: &'a HealthConfig,
    extraction: &'a ExtractionConfig,
    skip_dirs: Vec<PathBuf>,
}

impl<'a> HealthScorer<'a> {
    pub fn new(config: &'a HealthConfig, extraction: &'a ExtractionConfig) -> Self {
        Self {
            config,
            extraction,
            skip_dirs: Vec::new(),
        }
    }

    pub fn with_skip_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.skip_dirs = dirs;
        self
    }

    /// Walk `root`, classify a sample of code files and combine the result
    /// with an existing redundancy analysis.
    pub fn collect(&self, root: &Path, analysis: &AnalysisReport) -> Result<HealthMetrics> {
        let walker = FileWalker::new(root)
            .with_exclude(&self.extraction.exclude)?
            .with_skip_dirs(&self.skip_dirs);
        let files = walker.walk()?;

        let mut code: Vec<PathBuf> = Vec::new();
        let mut docs = 0;
        for path in &files {
            let language = Language::from_path(path);
            if language.is_code() {
                code.push(walker.relative(path));
            } else if language.is_documentation() {
                docs += 1;
            }
        }

        let mut accumulator =
            CodebaseAccumulator::new(self.config.medium_file_lines, self.config.large_file_lines);
        accumulator.record_inventory(files.len(), &code, docs);

        let mut security = SecurityFindings::default();
        let mut performance = PerformanceFindings::default();
        for relative in codebase::sample(&code, self.config.sample_files) {
            let Some(content) = read_or_skip(&root.join(&relative)) else {
                continue;
            };
            accumulator.record_file(classify_lines(Language::from_path(&relative), &content));
            security.merge(scan_security(&content));
            performance.merge(scan_performance(&content));
        }

        let codebase = accumulator.finish();
        debug!(
            "Health inventory: {} files, {} code, {} sampled",
            codebase.total_files, codebase.code_files, codebase.sampled_files
        );

        Ok(self.score(
            Utc::now(),
            codebase,
            analysis,
            SecurityMetrics::from_findings(security),
            PerformanceMetrics::from_findings(performance),
        ))
    }

    /// Pure scoring step over already-collected inputs.
    pub fn score(
        &self,
        timestamp: DateTime<Utc>,
        codebase: CodebaseMetrics,
        analysis: &AnalysisReport,
        security: SecurityMetrics,
        performance: PerformanceMetrics,
    ) -> HealthMetrics {
        let quality = QualityMetrics {
            complexity_score: complexity_score(&codebase, self.config),
            maintainability_score: maintainability_score(&codebase),
        };
        HealthMetrics::assemble(
            timestamp,
            codebase,
            RedundancyMetrics::from_report(analysis),
            quality,
            security,
            performance,
            &self.config.weights,
        )
    }
}
