//! Redundancy detection: all-pairs comparison of units within one
//! language/document class.
//!
//! Pairs are emitted in first-encountered order: by the index of the first
//! unit, then the second, following extraction order. Each unordered pair is
//! compared once.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::config::DetectionConfig;
use crate::core::{ComparableUnit, Language, Location, UnitKind};
use crate::extraction::ExtractionOutcome;
use crate::similarity::{SimilarityResult, SimilarityScorer, SimilarityStrategy};

/// Redundant pairs for one language/document class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedundancyReport {
    pub class: Language,
    pub kind: UnitKind,
    /// Units extracted for this class before size filtering and capping
    pub total_units: usize,
    /// Units that took part in the comparison
    pub compared_units: usize,
    pub threshold_used: f64,
    pub redundant_pairs: Vec<SimilarityResult>,
}

impl RedundancyReport {
    /// Distinct units taking part in at least one redundant pair.
    pub fn redundant_units(&self) -> BTreeSet<Location> {
        self.redundant_pairs
            .iter()
            .flat_map(|p| [p.unit_a.location(), p.unit_b.location()])
            .collect()
    }
}

/// Every class report produced by one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub timestamp: DateTime<Utc>,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub reports: Vec<RedundancyReport>,
}

impl AnalysisReport {
    pub fn of_kind(&self, kind: UnitKind) -> impl Iterator<Item = &RedundancyReport> {
        self.reports.iter().filter(move |r| r.kind == kind)
    }

    pub fn total_units(&self, kind: UnitKind) -> usize {
        self.of_kind(kind).map(|r| r.total_units).sum()
    }

    pub fn pair_count(&self, kind: UnitKind) -> usize {
        self.of_kind(kind).map(|r| r.redundant_pairs.len()).sum()
    }

    pub fn redundant_unit_count(&self, kind: UnitKind) -> usize {
        self.of_kind(kind).map(|r| r.redundant_units().len()).sum()
    }

    /// All pairs across classes, in report order.
    pub fn pairs(&self) -> impl Iterator<Item = &SimilarityResult> {
        self.reports.iter().flat_map(|r| r.redundant_pairs.iter())
    }
}

pub struct RedundancyDetector<'a, S: SimilarityStrategy> {
    scorer: &'a SimilarityScorer<S>,
    threshold: f64,
    min_unit_lines: usize,
    max_units: usize,
    parallel: bool,
}

impl<'a, S: SimilarityStrategy> RedundancyDetector<'a, S> {
    pub fn new(scorer: &'a SimilarityScorer<S>, config: &DetectionConfig) -> Self {
        Self {
            scorer,
            threshold: config.similarity_threshold,
            min_unit_lines: config.min_unit_lines,
            max_units: config.max_units_per_class,
            parallel: config.parallel,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    fn compare_row(&self, units: &[&ComparableUnit], i: usize) -> Vec<SimilarityResult> {
        let a = units[i];
        units[i + 1..]
            .iter()
            .map(|b| self.scorer.score(a, b))
            .filter(|result| result.combined_score >= self.threshold)
            .collect()
    }

    /// Compare every pair of `units`, all of the same kind and class.
    pub fn detect_class(
        &self,
        class: Language,
        kind: UnitKind,
        units: &[&ComparableUnit],
    ) -> RedundancyReport {
        let total_units = units.len();
        let mut candidates: Vec<&ComparableUnit> = units
            .iter()
            .copied()
            .filter(|u| u.body_lines() >= self.min_unit_lines)
            .collect();

        if candidates.len() > self.max_units {
            warn!(
                "{} {} units in {} exceed the cap of {}; comparing the first {}",
                candidates.len(),
                kind,
                class,
                self.max_units,
                self.max_units
            );
            candidates.truncate(self.max_units);
        }

        let redundant_pairs: Vec<SimilarityResult> = if self.parallel {
            (0..candidates.len())
                .into_par_iter()
                .flat_map_iter(|i| self.compare_row(&candidates, i))
                .collect()
        } else {
            (0..candidates.len())
                .flat_map(|i| self.compare_row(&candidates, i))
                .collect()
        };

        debug!(
            "{} {}: {} of {} units compared, {} redundant pairs",
            class,
            kind,
            candidates.len(),
            total_units,
            redundant_pairs.len()
        );

        RedundancyReport {
            class,
            kind,
            total_units,
            compared_units: candidates.len(),
            threshold_used: self.threshold,
            redundant_pairs,
        }
    }

    /// Group units by (class, kind) and detect within each group. Groups
    /// are reported in class order; units keep extraction order.
    pub fn detect(&self, units: &[ComparableUnit]) -> Vec<RedundancyReport> {
        let mut groups: BTreeMap<(Language, UnitKind), Vec<&ComparableUnit>> = BTreeMap::new();
        for unit in units {
            groups.entry((unit.language, unit.kind)).or_default().push(unit);
        }

        groups
            .into_iter()
            .map(|((class, kind), members)| self.detect_class(class, kind, &members))
            .collect()
    }

    pub fn analyze(&self, outcome: &ExtractionOutcome) -> AnalysisReport {
        AnalysisReport {
            timestamp: Utc::now(),
            files_scanned: outcome.files_scanned,
            files_skipped: outcome.files_skipped,
            reports: self.detect(&outcome.units),
        }
    }
}
