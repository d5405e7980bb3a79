//! Pattern scan for hardcoded secrets, raw SQL concatenation and unsafe
//! calls. Each line is counted at most once per category.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const HARDCODED_SECRET: &str = "hardcoded_secret";
pub const SQL_CONCATENATION: &str = "sql_concatenation";
pub const UNSAFE_CALL: &str = "unsafe_call";

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("security pattern must compile"))
        .collect()
}

static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r#"(?i)(api[_-]?key|apikey)\s*[:=]\s*['"][\w\-]{16,}['"]"#,
        r#"(?i)(secret|password|passwd|pwd)\s*[:=]\s*['"][^'"]{8,}['"]"#,
        r#"(?i)(token|bearer)\s*[:=]\s*['"][\w\-\.]{20,}['"]"#,
        r#"(?i)aws[_-]?secret[_-]?access[_-]?key\s*[:=]\s*['"][A-Za-z0-9/+=]{40}['"]"#,
        r"AKIA[0-9A-Z]{16}",
        r"sk[_-]live[_-][0-9a-zA-Z]{24,}",
        r"-----BEGIN (?:RSA |EC |OPENSSH )?PRIVATE KEY-----",
    ])
});

static SQL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r#"(?i)["'](?:SELECT|INSERT|UPDATE|DELETE)\b[^"']*["']\s*(?:\+|%|\.format\s*\()"#,
        r#"(?i)\bf["'](?:SELECT|INSERT|UPDATE|DELETE)\b[^"']*\{"#,
        r#"(?i)format!\s*\(\s*"(?:SELECT|INSERT|UPDATE|DELETE)\b"#,
        r"(?i)`(?:SELECT|INSERT|UPDATE|DELETE)\b[^`]*\$\{",
        r#"(?i)\+\s*["']\s*(?:WHERE|AND|OR|VALUES)\b"#,
    ])
});

static UNSAFE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?:^|[^\w.])eval\s*\(",
        r"(?:^|[^\w.])exec\s*\(",
        r"\bos\.system\s*\(",
        r"\bsubprocess\.\w+\([^)]*shell\s*=\s*True",
        r"\bpickle\.loads?\s*\(",
        r"\byaml\.load\s*\(",
        r"\.innerHTML\s*=",
        r"\bdocument\.write\s*\(",
        r"\bunsafe\s*\{",
    ])
});

/// Security scan results for a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityMetrics {
    pub score: f64,
    pub issues_count: usize,
    pub subcounts: BTreeMap<String, usize>,
}

/// Issue counts by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityFindings {
    pub counts: BTreeMap<String, usize>,
}

impl SecurityFindings {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn merge(&mut self, other: SecurityFindings) {
        for (category, count) in other.counts {
            *self.counts.entry(category).or_insert(0) += count;
        }
    }
}

/// Scan one file's content.
pub fn scan_security(content: &str) -> SecurityFindings {
    let categories: [(&str, &Lazy<Vec<Regex>>); 3] = [
        (HARDCODED_SECRET, &SECRET_PATTERNS),
        (SQL_CONCATENATION, &SQL_PATTERNS),
        (UNSAFE_CALL, &UNSAFE_PATTERNS),
    ];

    let mut findings = SecurityFindings::default();
    for (category, _) in &categories {
        findings.counts.insert(category.to_string(), 0);
    }

    for line in content.lines() {
        for (category, patterns) in &categories {
            if patterns.iter().any(|p| p.is_match(line)) {
                *findings.counts.entry(category.to_string()).or_insert(0) += 1;
            }
        }
    }

    findings
}

/// Score starts at 85 and drops in three tiers by total issue count.
pub fn security_score(issues: usize) -> f64 {
    let penalty = match issues {
        n if n > 10 => 30.0,
        n if n > 5 => 15.0,
        n if n > 0 => 5.0,
        _ => 0.0,
    };
    85.0 - penalty
}

impl SecurityMetrics {
    pub fn from_findings(findings: SecurityFindings) -> Self {
        let issues_count = findings.total();
        Self {
            score: security_score(issues_count),
            issues_count,
            subcounts: findings.counts,
        }
    }
}
