//! Similarity scoring between two comparable units.
//!
//! A combined score (0-100) is a fixed weighted blend of three sub-scores:
//!
//! - **lexical**: Jaccard overlap of distinct normalised tokens
//! - **structural**: overlap of control-flow/definition keyword multisets
//! - **semantic**: overlap of documentation markers (TODO, Usage, ...)
//!
//! Which sub-scores apply, and how they are weighted, depends on the
//! [`ComparisonProfile`]. A sub-score that does not apply to the profile is
//! 0. The heuristics live behind [`SimilarityStrategy`] so a parser-based
//! comparator can replace them without touching the detector.

pub mod normalize;

use serde::{Deserialize, Serialize};

use crate::config::{SimilarityWeights, WeightProfile};
use crate::core::{ComparableUnit, UnitKind};
use crate::errors::safe_percentage;
use normalize::{keyword_multiset, marker_set, token_set};

/// Weighting profile for a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonProfile {
    /// lexical + structural apply
    Code,
    /// lexical + semantic apply
    Documentation,
    /// shape-first comparison, every sub-score applies
    Structural,
}

impl ComparisonProfile {
    pub fn for_kind(kind: UnitKind) -> Self {
        match kind {
            UnitKind::Function => ComparisonProfile::Code,
            UnitKind::DocSection => ComparisonProfile::Documentation,
        }
    }

    fn applies(&self) -> (bool, bool, bool) {
        match self {
            ComparisonProfile::Code => (true, true, false),
            ComparisonProfile::Documentation => (true, false, true),
            ComparisonProfile::Structural => (true, true, true),
        }
    }
}

/// Pluggable sub-score computation. Every method must be a pure, symmetric
/// function of its two inputs returning a value in [0, 100].
pub trait SimilarityStrategy: Send + Sync {
    fn lexical(&self, a: &str, b: &str) -> f64;
    fn structural(&self, a: &str, b: &str) -> f64;
    fn semantic(&self, a: &str, b: &str) -> f64;
}

/// Keyword-heuristic strategy: token overlap, keyword multisets and
/// documentation markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordStrategy;

impl SimilarityStrategy for KeywordStrategy {
    fn lexical(&self, a: &str, b: &str) -> f64 {
        let ta = token_set(a);
        let tb = token_set(b);
        let common = ta.intersection(&tb).count();
        let either = ta.union(&tb).count();
        safe_percentage(common as f64, either as f64)
    }

    fn structural(&self, a: &str, b: &str) -> f64 {
        let ka = keyword_multiset(a);
        let kb = keyword_multiset(b);
        let size_a: usize = ka.values().sum();
        let size_b: usize = kb.values().sum();

        // Nothing structural to compare.
        if size_a == 0 || size_b == 0 {
            return 0.0;
        }
        if ka == kb {
            return 100.0;
        }

        let common: usize = ka
            .iter()
            .filter_map(|(keyword, count)| kb.get(keyword).map(|other| (*count).min(*other)))
            .sum();
        safe_percentage(common as f64, size_a.max(size_b) as f64)
    }

    fn semantic(&self, a: &str, b: &str) -> f64 {
        let ma = marker_set(a);
        let mb = marker_set(b);
        let common = ma.intersection(&mb).count();
        let either = ma.union(&mb).count();
        safe_percentage(common as f64, either as f64)
    }
}

/// Similarity of one unit pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub unit_a: ComparableUnit,
    pub unit_b: ComparableUnit,
    pub profile: ComparisonProfile,
    pub lexical_score: f64,
    pub structural_score: f64,
    pub semantic_score: f64,
    pub combined_score: f64,
}

impl SimilarityResult {
    /// Both bodies normalise to the same text.
    pub fn is_exact_duplicate(&self) -> bool {
        self.unit_a.fingerprint == self.unit_b.fingerprint
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn bounded(value: f64) -> f64 {
    round2(value.clamp(0.0, 100.0))
}

/// Computes [`SimilarityResult`]s using a strategy and weight profiles.
pub struct SimilarityScorer<S: SimilarityStrategy = KeywordStrategy> {
    strategy: S,
    weights: SimilarityWeights,
}

impl SimilarityScorer<KeywordStrategy> {
    pub fn new(weights: SimilarityWeights) -> Self {
        Self::with_strategy(KeywordStrategy, weights)
    }
}

impl Default for SimilarityScorer<KeywordStrategy> {
    fn default() -> Self {
        Self::new(SimilarityWeights::default())
    }
}

impl<S: SimilarityStrategy> SimilarityScorer<S> {
    pub fn with_strategy(strategy: S, weights: SimilarityWeights) -> Self {
        Self { strategy, weights }
    }

    fn profile_weights(&self, profile: ComparisonProfile) -> &WeightProfile {
        match profile {
            ComparisonProfile::Code => &self.weights.code,
            ComparisonProfile::Documentation => &self.weights.documentation,
            ComparisonProfile::Structural => &self.weights.structural,
        }
    }

    /// Score two units with the profile implied by their kind.
    pub fn score(&self, a: &ComparableUnit, b: &ComparableUnit) -> SimilarityResult {
        self.score_with_profile(a, b, ComparisonProfile::for_kind(a.kind))
    }

    pub fn score_with_profile(
        &self,
        a: &ComparableUnit,
        b: &ComparableUnit,
        profile: ComparisonProfile,
    ) -> SimilarityResult {
        let (lexical, structural, semantic) = self.sub_scores(&a.body, &b.body, profile);
        let combined = bounded(
            self.profile_weights(profile)
                .blend(lexical, structural, semantic),
        );

        SimilarityResult {
            unit_a: a.clone(),
            unit_b: b.clone(),
            profile,
            lexical_score: lexical,
            structural_score: structural,
            semantic_score: semantic,
            combined_score: combined,
        }
    }

    /// Combined score only, without building a result.
    pub fn combined(&self, a: &str, b: &str, profile: ComparisonProfile) -> f64 {
        let (lexical, structural, semantic) = self.sub_scores(a, b, profile);
        bounded(
            self.profile_weights(profile)
                .blend(lexical, structural, semantic),
        )
    }

    fn sub_scores(&self, a: &str, b: &str, profile: ComparisonProfile) -> (f64, f64, f64) {
        let (lexical, structural, semantic) = profile.applies();
        (
            if lexical { bounded(self.strategy.lexical(a, b)) } else { 0.0 },
            if structural { bounded(self.strategy.structural(a, b)) } else { 0.0 },
            if semantic { bounded(self.strategy.semantic(a, b)) } else { 0.0 },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Language;
    use indoc::indoc;
    use std::path::PathBuf;

    fn function(name: &str, body: &str) -> ComparableUnit {
        ComparableUnit::new(
            UnitKind::Function,
            Language::Python,
            PathBuf::from(format!("{name}.py")),
            1,
            name,
            body,
        )
    }

    fn section(title: &str, body: &str) -> ComparableUnit {
        ComparableUnit::new(
            UnitKind::DocSection,
            Language::Markdown,
            PathBuf::from("README.md"),
            1,
            title,
            body,
        )
    }

    const BODY: &str = indoc! {"
        def NAME(records):
            results = []
            for record in records:
                if record.valid:
                    results.append(record.value)
                else:
                    log.warning(record)
            try:
                persist(results)
            except IOError:
                return None
            return results
    "};

    #[test]
    fn test_identical_bodies_score_high() {
        let scorer = SimilarityScorer::default();
        let a = function("collect", &BODY.replace("NAME", "collect"));
        let b = function("gather", &BODY.replace("NAME", "gather"));
        let result = scorer.score(&a, &b);

        assert_eq!(result.structural_score, 100.0);
        assert!(result.lexical_score > 85.0);
        assert_eq!(result.semantic_score, 0.0);
        assert!(result.combined_score >= 80.0);
    }

    #[test]
    fn test_unrelated_bodies_score_low() {
        let scorer = SimilarityScorer::default();
        let a = function(
            "parse",
            indoc! {"
                def parse(text):
                    tokens = text.split()
                    while tokens:
                        head = tokens.pop()
                        emit(head)
            "},
        );
        let b = function(
            "render",
            indoc! {"
                class Widget:
                    try:
                        draw(canvas)
                    catch_all()
                    finally_block = 3
            "},
        );
        let result = scorer.score(&a, &b);
        assert!(result.combined_score < 20.0, "{}", result.combined_score);
    }

    #[test]
    fn test_documentation_profile_uses_markers() {
        let scorer = SimilarityScorer::default();
        let text = "Usage: run make install to build the project. NOTE: needs root access on the host.";
        let a = section("Install", &format!("## Install\n{text}"));
        let b = section("Setup", &format!("## Setup\n{text}"));
        let result = scorer.score(&a, &b);
        assert_eq!(result.profile, ComparisonProfile::Documentation);
        assert_eq!(result.semantic_score, 100.0);
        assert_eq!(result.structural_score, 0.0);
        assert!(result.combined_score >= 80.0);
    }

    #[test]
    fn test_structural_profile_weights() {
        let scorer = SimilarityScorer::default();
        let score = scorer.combined(
            "if a: for b in c: pass",
            "if x: for y in z: pass",
            ComparisonProfile::Structural,
        );
        // structural 100 * 0.6 + lexical (4 of 10 tokens) * 0.3
        assert!((score - 72.0).abs() < 0.01);
    }

    #[test]
    fn test_empty_bodies_score_zero() {
        let scorer = SimilarityScorer::default();
        assert_eq!(scorer.combined("", "", ComparisonProfile::Code), 0.0);
    }

    #[test]
    fn test_partial_keyword_overlap() {
        let strategy = KeywordStrategy;
        // {if:2, for:1} vs {if:1, while:1}: common 1, larger 3
        let score = strategy.structural("if a if b for c", "if x while y");
        assert!((score - 100.0 / 3.0).abs() < 1e-9);
    }

    struct ConstantStrategy;

    impl SimilarityStrategy for ConstantStrategy {
        fn lexical(&self, _: &str, _: &str) -> f64 {
            50.0
        }
        fn structural(&self, _: &str, _: &str) -> f64 {
            150.0
        }
        fn semantic(&self, _: &str, _: &str) -> f64 {
            -10.0
        }
    }

    #[test]
    fn test_custom_strategy_is_bounded() {
        let scorer = SimilarityScorer::with_strategy(ConstantStrategy, SimilarityWeights::default());
        let score = scorer.combined("a", "b", ComparisonProfile::Structural);
        // 0.3 * 50 + 0.6 * 100 + 0.1 * 0
        assert_eq!(score, 75.0);
    }
}
