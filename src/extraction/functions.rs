//! Lexical function-definition extraction.
//!
//! Definitions are found with one line-anchored pattern per language. The
//! body is the definition line plus up to `body_lines` following lines,
//! ending early at the first line that leaves the definition's indentation
//! block. No parsing is attempted.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::core::{ComparableUnit, Language, UnitKind};

/// Options controlling function extraction.
#[derive(Debug, Clone, Copy)]
pub struct FunctionOptions {
    pub body_lines: usize,
    pub min_function_lines: usize,
    pub nested_definitions: bool,
}

struct DefinitionPattern {
    regex: Regex,
    /// Capture groups that may hold the name, first match wins
    name_groups: &'static [usize],
}

fn pattern(source: &str, name_groups: &'static [usize]) -> DefinitionPattern {
    DefinitionPattern {
        regex: Regex::new(source).expect("definition pattern must compile"),
        name_groups,
    }
}

static PYTHON: Lazy<Vec<DefinitionPattern>> =
    Lazy::new(|| vec![pattern(r"^(\s*)(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(", &[2])]);

static JAVASCRIPT: Lazy<Vec<DefinitionPattern>> = Lazy::new(|| {
    vec![
        pattern(
            r"^(\s*)(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)\s*[<(]",
            &[2],
        ),
        pattern(
            r"^(\s*)(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*(?::[^=]+)?=>|[A-Za-z_$][\w$]*\s*=>)",
            &[2],
        ),
    ]
});

static RUST: Lazy<Vec<DefinitionPattern>> = Lazy::new(|| {
    vec![pattern(
        r#"^(\s*)(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+([A-Za-z_]\w*)"#,
        &[2],
    )]
});

static GO: Lazy<Vec<DefinitionPattern>> =
    Lazy::new(|| vec![pattern(r"^(\s*)func\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)\s*[\[(]", &[2])]);

static SHELL: Lazy<Vec<DefinitionPattern>> = Lazy::new(|| {
    vec![pattern(
        r"^(\s*)(?:function\s+([A-Za-z_][\w:.-]*)\s*(?:\(\s*\))?|([A-Za-z_][\w:.-]*)\s*\(\s*\))\s*\{?\s*$",
        &[2, 3],
    )]
});

static RUBY: Lazy<Vec<DefinitionPattern>> =
    Lazy::new(|| vec![pattern(r"^(\s*)def\s+(?:self\.)?([A-Za-z_]\w*[?!=]?)", &[2])]);

static JAVA: Lazy<Vec<DefinitionPattern>> = Lazy::new(|| {
    vec![pattern(
        r"^(\s*)(?:(?:public|private|protected|static|final|abstract|synchronized|override|suspend|fun)\s+)+(?:[\w<>\[\],.? ]+\s+)?([A-Za-z_]\w*)\s*\([^;]*$",
        &[2],
    )]
});

fn patterns_for(language: Language) -> &'static [DefinitionPattern] {
    match language {
        Language::Python => &PYTHON,
        Language::JavaScript | Language::TypeScript => &JAVASCRIPT,
        Language::Rust => &RUST,
        Language::Go => &GO,
        Language::Shell => &SHELL,
        Language::Ruby => &RUBY,
        Language::Java => &JAVA,
        Language::Markdown | Language::Text | Language::Unknown => &[],
    }
}

/// Deepest indentation still treated as top level. Java methods always sit
/// one level inside a class.
fn top_level_indent(language: Language) -> usize {
    match language {
        Language::Java => 4,
        _ => 0,
    }
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Match a definition line, returning its indentation and name.
fn match_definition(language: Language, line: &str) -> Option<(usize, String)> {
    patterns_for(language).iter().find_map(|p| {
        let caps = p.regex.captures(line)?;
        let name = p
            .name_groups
            .iter()
            .find_map(|g| caps.get(*g))
            .map(|m| m.as_str().to_string())?;
        Some((indent_width(line), name))
    })
}

fn closes_block(trimmed: &str) -> bool {
    trimmed.starts_with('}') || trimmed == "end" || trimmed.starts_with("end ")
}

fn continues_signature(trimmed: &str) -> bool {
    trimmed.starts_with(')') || trimmed.starts_with('{') || trimmed.starts_with("where")
}

/// Collect the bounded body starting at `start` (the definition line).
fn collect_body<'a>(lines: &[&'a str], start: usize, def_indent: usize, body_lines: usize) -> Vec<&'a str> {
    let mut body = vec![lines[start]];
    for line in lines.iter().skip(start + 1).take(body_lines) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            body.push(line);
            continue;
        }
        if indent_width(line) <= def_indent {
            if closes_block(trimmed) {
                body.push(line);
                break;
            }
            if continues_signature(trimmed) {
                body.push(line);
                continue;
            }
            break;
        }
        body.push(line);
    }

    while body.len() > 1 && body.last().map(|l| l.trim().is_empty()).unwrap_or(false) {
        body.pop();
    }
    body
}

/// Extract function units from one source file.
pub fn extract_functions(
    file_path: &Path,
    language: Language,
    content: &str,
    options: &FunctionOptions,
) -> Vec<ComparableUnit> {
    let lines: Vec<&str> = content.lines().collect();
    let max_indent = top_level_indent(language);

    lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            let (indent, name) = match_definition(language, line)?;
            if !options.nested_definitions && indent > max_indent {
                return None;
            }
            let body = collect_body(&lines, idx, indent, options.body_lines);
            let non_blank = body.iter().filter(|l| !l.trim().is_empty()).count();
            if non_blank < options.min_function_lines {
                return None;
            }
            Some(ComparableUnit::new(
                UnitKind::Function,
                language,
                file_path.to_path_buf(),
                idx + 1,
                name,
                body.join("\n"),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn options() -> FunctionOptions {
        FunctionOptions {
            body_lines: 15,
            min_function_lines: 5,
            nested_definitions: false,
        }
    }

    #[test]
    fn test_python_functions_with_min_length() {
        let source = indoc! {"
            import os

            def load(path):
                with open(path) as fh:
                    data = fh.read()
                if not data:
                    return None
                return data.strip()

            def stub():
                pass

            class Loader:
                def method(self):
                    a = 1
                    b = 2
                    c = 3
                    return a + b + c
        "};
        let units = extract_functions(Path::new("m.py"), Language::Python, source, &options());
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "load");
        assert_eq!(units[0].start_line, 3);
        assert!(units[0].body.ends_with("return data.strip()"));
        assert!(!units[0].body.contains("def stub"));
    }

    #[test]
    fn test_nested_definitions_opt_in() {
        let source = indoc! {"
            class Loader:
                def method(self):
                    a = 1
                    b = 2
                    c = 3
                    return a + b + c
        "};
        let mut opts = options();
        opts.nested_definitions = true;
        let units = extract_functions(Path::new("m.py"), Language::Python, source, &opts);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "method");
    }

    #[test]
    fn test_rust_body_stops_at_closing_brace() {
        let source = indoc! {"
            pub fn total(items: &[u32]) -> u32 {
                let mut sum = 0;
                for item in items {
                    sum += item;
                }
                sum
            }
            fn next() {}
        "};
        let units = extract_functions(Path::new("lib.rs"), Language::Rust, source, &options());
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "total");
        assert!(units[0].body.ends_with('}'));
        assert!(!units[0].body.contains("fn next"));
    }

    #[test]
    fn test_javascript_arrow_and_function() {
        let source = indoc! {"
            export const sum = (xs) => {
              let total = 0;
              for (const x of xs) {
                total += x;
              }
              return total;
            };

            async function fetchAll(urls) {
              const out = [];
              for (const u of urls) {
                out.push(await fetch(u));
              }
              return out;
            }
        "};
        let units =
            extract_functions(Path::new("a.js"), Language::JavaScript, source, &options());
        let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["sum", "fetchAll"]);
    }

    #[test]
    fn test_shell_both_syntaxes() {
        assert_eq!(
            match_definition(Language::Shell, "deploy() {").map(|d| d.1),
            Some("deploy".to_string())
        );
        assert_eq!(
            match_definition(Language::Shell, "function backup_repo {").map(|d| d.1),
            Some("backup_repo".to_string())
        );
        assert!(match_definition(Language::Shell, "echo done").is_none());
    }

    #[test]
    fn test_body_is_bounded() {
        let mut source = String::from("def long():\n");
        for i in 0..40 {
            source.push_str(&format!("    x{i} = {i}\n"));
        }
        let units = extract_functions(Path::new("m.py"), Language::Python, &source, &options());
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].body.lines().count(), 16);
    }
}
