//! Codebase size metrics from a line-by-line classification of sampled
//! source files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::Language;
use crate::errors::{round1, safe_percentage};

/// Counting and ratio metrics. Ratios are percentages and are 0 whenever
/// their denominator is 0 (an empty repository yields all zeros).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodebaseMetrics {
    pub total_files: usize,
    pub code_files: usize,
    pub test_files: usize,
    pub doc_files: usize,
    /// Code files whose lines were classified
    pub sampled_files: usize,
    pub total_lines: usize,
    pub code_lines: usize,
    pub comment_lines: usize,
    pub blank_lines: usize,
    /// Sampled files above the medium size tier (and not above the large one)
    pub medium_files: usize,
    /// Sampled files above the large size tier
    pub large_files: usize,
    /// code_lines / total_lines, percent
    pub code_density: f64,
    /// comment_lines / total_lines, percent
    pub comment_ratio: f64,
    /// test files relative to non-test code files, percent, capped at 100
    pub test_coverage_estimate: f64,
}

/// Line counts of one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounts {
    pub code: usize,
    pub comment: usize,
    pub blank: usize,
}

impl LineCounts {
    pub fn total(&self) -> usize {
        self.code + self.comment + self.blank
    }
}

/// Classify every line of `content` as code, comment or blank.
pub fn classify_lines(language: Language, content: &str) -> LineCounts {
    let prefix = language.line_comment();
    let mut counts = LineCounts::default();
    let mut in_block = false;
    let mut in_docstring = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            counts.blank += 1;
            continue;
        }

        if in_block {
            counts.comment += 1;
            if trimmed.contains("*/") || trimmed.contains("-->") {
                in_block = false;
            }
            continue;
        }

        if in_docstring {
            counts.comment += 1;
            if trimmed.contains("\"\"\"") || trimmed.contains("'''") {
                in_docstring = false;
            }
            continue;
        }

        if language == Language::Python
            && (trimmed.starts_with("\"\"\"") || trimmed.starts_with("'''"))
        {
            counts.comment += 1;
            let quote = &trimmed[..3];
            // Opening and closing quotes on the same line
            if !(trimmed.len() >= 6 && trimmed[3..].contains(quote)) {
                in_docstring = true;
            }
            continue;
        }

        if trimmed.starts_with("/*") || trimmed.starts_with("<!--") {
            counts.comment += 1;
            in_block = !(trimmed.contains("*/") || trimmed.contains("-->"));
            continue;
        }

        if !prefix.is_empty() && trimmed.starts_with(prefix) && !trimmed.starts_with("#!") {
            counts.comment += 1;
            continue;
        }

        counts.code += 1;
    }

    counts
}

/// Whether a path looks like a test file.
pub fn is_test_path(path: &Path) -> bool {
    let in_test_dir = path.components().any(|c| {
        matches!(
            c.as_os_str().to_str(),
            Some("test" | "tests" | "spec" | "specs" | "__tests__")
        )
    });
    if in_test_dir {
        return true;
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    stem.starts_with("test_")
        || stem.ends_with("_test")
        || stem.ends_with("_spec")
        || stem.ends_with(".test")
        || stem.ends_with(".spec")
}

/// Evenly spaced sample of at most `limit` items, keeping order.
pub fn sample<T: Clone>(items: &[T], limit: usize) -> Vec<T> {
    if items.len() <= limit {
        return items.to_vec();
    }
    let step = items.len() as f64 / limit as f64;
    (0..limit)
        .map(|i| items[(i as f64 * step) as usize].clone())
        .collect()
}

/// Accumulates per-file counts into [`CodebaseMetrics`].
#[derive(Debug, Default)]
pub struct CodebaseAccumulator {
    metrics: CodebaseMetrics,
    medium_file_lines: usize,
    large_file_lines: usize,
}

impl CodebaseAccumulator {
    pub fn new(medium_file_lines: usize, large_file_lines: usize) -> Self {
        Self {
            metrics: CodebaseMetrics::default(),
            medium_file_lines,
            large_file_lines,
        }
    }

    /// Record the population of files found by the walk.
    pub fn record_inventory(&mut self, total: usize, code: &[PathBuf], docs: usize) {
        self.metrics.total_files = total;
        self.metrics.code_files = code.len();
        self.metrics.test_files = code.iter().filter(|p| is_test_path(p)).count();
        self.metrics.doc_files = docs;
    }

    /// Record one sampled file's classified lines.
    pub fn record_file(&mut self, counts: LineCounts) {
        let m = &mut self.metrics;
        m.sampled_files += 1;
        m.code_lines += counts.code;
        m.comment_lines += counts.comment;
        m.blank_lines += counts.blank;
        m.total_lines += counts.total();

        let lines = counts.total();
        if lines > self.large_file_lines {
            m.large_files += 1;
        } else if lines > self.medium_file_lines {
            m.medium_files += 1;
        }
    }

    pub fn finish(mut self) -> CodebaseMetrics {
        let m = &mut self.metrics;
        m.code_density = round1(safe_percentage(m.code_lines as f64, m.total_lines as f64));
        m.comment_ratio = round1(safe_percentage(m.comment_lines as f64, m.total_lines as f64));
        let non_test = m.code_files.saturating_sub(m.test_files);
        m.test_coverage_estimate =
            round1(safe_percentage(m.test_files as f64, non_test as f64).min(100.0));
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_classify_python() {
        let source = indoc! {r#"
            #!/usr/bin/env python
            """Module docstring
            spanning lines."""

            # comment
            def f():
                """One-line docstring."""
                return 1
        "#};
        let counts = classify_lines(Language::Python, source);
        assert_eq!(counts.comment, 4);
        assert_eq!(counts.blank, 1);
        assert_eq!(counts.code, 3);
    }

    #[test]
    fn test_classify_c_style_block() {
        let source = "/* start\n * middle\n */\nlet x = 1; // trailing\n// full\n";
        let counts = classify_lines(Language::Rust, source);
        assert_eq!(counts.comment, 4);
        assert_eq!(counts.code, 1);
    }

    #[test]
    fn test_is_test_path() {
        assert!(is_test_path(Path::new("tests/integration.rs")));
        assert!(is_test_path(Path::new("pkg/test_loader.py")));
        assert!(is_test_path(Path::new("src/app.spec.ts")));
        assert!(is_test_path(Path::new("cmd/server_test.go")));
        assert!(!is_test_path(Path::new("src/contest.py")));
    }

    #[test]
    fn test_sample_is_even_and_bounded() {
        let items: Vec<usize> = (0..10).collect();
        assert_eq!(sample(&items, 5), vec![0, 2, 4, 6, 8]);
        assert_eq!(sample(&items, 20).len(), 10);
    }

    #[test]
    fn test_empty_accumulator_is_all_zero() {
        let metrics = CodebaseAccumulator::new(300, 1000).finish();
        assert_eq!(metrics, CodebaseMetrics::default());
    }

    #[test]
    fn test_accumulator_ratios_and_tiers() {
        let mut acc = CodebaseAccumulator::new(300, 1000);
        acc.record_inventory(
            5,
            &[PathBuf::from("src/a.py"), PathBuf::from("tests/test_a.py")],
            2,
        );
        acc.record_file(LineCounts { code: 80, comment: 10, blank: 10 });
        acc.record_file(LineCounts { code: 400, comment: 0, blank: 0 });
        acc.record_file(LineCounts { code: 1200, comment: 0, blank: 0 });
        let m = acc.finish();
        assert_eq!(m.total_lines, 1700);
        assert_eq!(m.medium_files, 1);
        assert_eq!(m.large_files, 1);
        assert_eq!(m.test_coverage_estimate, 100.0);
        assert_eq!(m.comment_ratio, 0.6);
    }
}
