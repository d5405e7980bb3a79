//! Text normalisation and feature extraction for similarity scoring.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Control-flow and definition keywords across the supported languages.
pub const STRUCTURAL_KEYWORDS: &[&str] = &[
    "function", "def", "fn", "func", "class", "struct", "enum", "impl", "trait", "interface",
    "if", "else", "elif", "for", "foreach", "while", "loop", "do", "switch", "match", "case",
    "try", "catch", "except", "finally", "rescue", "ensure",
];

/// Documentation markers, in canonical spelling.
pub const DOC_MARKERS: &[&str] = &[
    "TODO",
    "FIXME",
    "NOTE",
    "WARNING",
    "DEPRECATED",
    "Example",
    "Usage",
    "Parameters",
    "Returns",
];

static MARKER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(todo|fixme|note|warning|deprecated|examples?|usage|parameters|returns)\b")
        .expect("valid marker regex")
});

/// Case-fold, strip punctuation and collapse whitespace.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .chars()
        .flat_map(|c| {
            let keep = c.is_alphanumeric() || c == '_';
            c.to_lowercase().map(move |lower| if keep { lower } else { ' ' })
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Distinct normalised tokens.
pub fn token_set(text: &str) -> BTreeSet<String> {
    normalize(text)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Multiset of structural keywords occurring as whole tokens.
pub fn keyword_multiset(text: &str) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for token in normalize(text).split(' ') {
        if let Some(keyword) = STRUCTURAL_KEYWORDS.iter().find(|k| **k == token) {
            *counts.entry(*keyword).or_insert(0) += 1;
        }
    }
    counts
}

/// Set of documentation markers present in the raw text.
pub fn marker_set(text: &str) -> BTreeSet<&'static str> {
    MARKER_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let found = caps[1].to_ascii_lowercase();
            let found = found.trim_end_matches('s');
            DOC_MARKERS.iter().copied().find(|marker| {
                let canonical = marker.to_ascii_lowercase();
                canonical.trim_end_matches('s') == found
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Foo(Bar,   baz);\n\tQUX "), "foo bar baz qux");
        assert_eq!(normalize("snake_case_name"), "snake_case_name");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn test_normalize_folds_unicode_case() {
        assert_eq!(normalize("Élan ÜBER Straße"), normalize("élan über straße"));
        assert_eq!(normalize("ΣΟΦΙΑ"), "σοφια");
        assert_eq!(token_set("Café café CAFÉ").len(), 1);
    }

    #[test]
    fn test_token_set_is_distinct() {
        let tokens = token_set("a b a B");
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_keyword_multiset_counts_whole_words() {
        let counts = keyword_multiset("def f():\n    if x:\n        if y: pass\n    format(iffy)");
        assert_eq!(counts.get("def"), Some(&1));
        assert_eq!(counts.get("if"), Some(&2));
        assert_eq!(counts.get("for"), None);
    }

    #[test]
    fn test_marker_set_canonicalises() {
        let markers = marker_set("## Usage\nNOTE: see examples. todo later. Parameters and Returns");
        assert!(markers.contains("Usage"));
        assert!(markers.contains("NOTE"));
        assert!(markers.contains("Example"));
        assert!(markers.contains("TODO"));
        assert!(markers.contains("Parameters"));
        assert!(markers.contains("Returns"));
        assert!(!markers.contains("FIXME"));
    }
}
