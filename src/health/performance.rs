//! Performance antipattern scan: blocking calls inside loops, nested loops
//! and wildcard imports.
//!
//! Loop extent is inferred from indentation: a loop stays open until a
//! non-blank line at or left of the loop header's indentation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SYNC_IN_LOOP: &str = "sync_in_loop";
pub const NESTED_LOOP: &str = "nested_loop";
pub const WILDCARD_IMPORT: &str = "wildcard_import";

static LOOP_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:for\b|while\b|loop\s*\{|until\b|do\s*\{)|\.forEach\s*\(|\.each\s+do\b")
        .expect("valid loop regex")
});

static SYNC_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:readFileSync|writeFileSync|execSync|spawnSync|urlopen)\s*\(|\btime\.sleep\s*\(|\bThread\.sleep\s*\(|\bthread::sleep\s*\(|\brequests\.(?:get|post|put|delete|patch)\s*\(|\bsubprocess\.(?:run|call|check_output)\s*\(|\.query\s*\(|\bfetch\s*\(|\bcurl\b",
    )
    .expect("valid sync-call regex")
});

static WILDCARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:from\s+\S+\s+import\s+\*|import\s+\*\s+as\b|(?:pub\s+)?use\s+[\w:]+::\*\s*;|import\s+(?:static\s+)?[\w.]+\.\*\s*;)",
    )
    .expect("valid wildcard regex")
});

/// Antipattern counts and derived score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub score: f64,
    pub antipattern_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerformanceFindings {
    pub sync_in_loop: usize,
    pub nested_loops: usize,
    pub wildcard_imports: usize,
}

impl PerformanceFindings {
    pub fn merge(&mut self, other: PerformanceFindings) {
        self.sync_in_loop += other.sync_in_loop;
        self.nested_loops += other.nested_loops;
        self.wildcard_imports += other.wildcard_imports;
    }
}

fn indent_of(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Scan one file's content.
pub fn scan_performance(content: &str) -> PerformanceFindings {
    let mut findings = PerformanceFindings::default();
    let mut open_loops: Vec<usize> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let indent = indent_of(line);
        while open_loops.last().map(|&l| indent <= l).unwrap_or(false) {
            open_loops.pop();
        }

        if WILDCARD.is_match(line) {
            findings.wildcard_imports += 1;
        }

        if LOOP_START.is_match(line) {
            if !open_loops.is_empty() {
                findings.nested_loops += 1;
            }
            open_loops.push(indent);
        } else if !open_loops.is_empty() && SYNC_CALL.is_match(line) {
            findings.sync_in_loop += 1;
        }
    }

    findings
}

/// Score starts at 80; each class costs a capped number of points.
pub fn performance_score(findings: &PerformanceFindings) -> f64 {
    let sync = (findings.sync_in_loop as f64 * 5.0).min(30.0);
    let nested = (findings.nested_loops as f64 * 2.0).min(20.0);
    let wildcard = (findings.wildcard_imports as f64 * 2.0).min(10.0);
    (80.0 - sync - nested - wildcard).clamp(0.0, 100.0)
}

impl PerformanceMetrics {
    pub fn from_findings(findings: PerformanceFindings) -> Self {
        let antipattern_counts = BTreeMap::from([
            (SYNC_IN_LOOP.to_string(), findings.sync_in_loop),
            (NESTED_LOOP.to_string(), findings.nested_loops),
            (WILDCARD_IMPORT.to_string(), findings.wildcard_imports),
        ]);
        Self {
            score: performance_score(&findings),
            antipattern_counts,
        }
    }
}
