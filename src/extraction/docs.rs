//! Documentation section extraction: one unit per header plus the content
//! that follows it, up to the next header.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::core::{ComparableUnit, Language, UnitKind};

static ATX_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s{0,3}(#{1,6})\s+(.+?)\s*#*\s*$").expect("valid header regex"));

static SETEXT_UNDERLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s{0,3}(?:={3,}|-{3,}|~{3,}|\^{3,}|\*{3,})\s*$").expect("valid underline regex"));

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Header positions: (line index where the section starts, title, index of
/// the first content line).
fn find_headers(lines: &[&str]) -> Vec<(usize, String, usize)> {
    let mut headers = Vec::new();
    let mut in_fence = false;

    for (idx, line) in lines.iter().enumerate() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = ATX_HEADER.captures(line) {
            headers.push((idx, caps[2].to_string(), idx + 1));
            continue;
        }
        // Underlined title: a text line followed by a run of = - ~ ^ *
        if idx + 1 < lines.len() {
            let title = line.trim();
            let next = lines[idx + 1];
            if !title.is_empty()
                && SETEXT_UNDERLINE.is_match(next)
                && next.trim().len() >= title.len().min(3)
                && !headers.iter().any(|(_, _, first)| *first > idx)
            {
                headers.push((idx, title.to_string(), idx + 2));
            }
        }
    }

    headers
}

/// Extract documentation sections from a Markdown or plain-text file.
pub fn extract_doc_sections(
    file_path: &Path,
    language: Language,
    content: &str,
    max_lines: usize,
) -> Vec<ComparableUnit> {
    let lines: Vec<&str> = content.lines().collect();
    let headers = find_headers(&lines);

    headers
        .iter()
        .enumerate()
        .map(|(n, (start, title, first_content))| {
            let end = headers
                .get(n + 1)
                .map(|(next_start, _, _)| *next_start)
                .unwrap_or(lines.len());
            let content_end = end.min(first_content + max_lines).max(*first_content);
            let mut body: Vec<&str> = lines[*start..content_end].to_vec();
            while body.len() > 1 && body.last().map(|l| l.trim().is_empty()).unwrap_or(false) {
                body.pop();
            }
            ComparableUnit::new(
                UnitKind::DocSection,
                language,
                file_path.to_path_buf(),
                start + 1,
                title.clone(),
                body.join("\n"),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_markdown_sections() {
        let source = indoc! {"
            # Project

            Intro text.

            ## Usage

            Run the tool.
            ```bash
            # not a header
            make run
            ```

            ## Notes
            NOTE: keep this short.
        "};
        let units = extract_doc_sections(Path::new("README.md"), Language::Markdown, source, 40);
        let titles: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(titles, vec!["Project", "Usage", "Notes"]);
        assert_eq!(units[1].start_line, 5);
        assert!(units[1].body.contains("# not a header"));
        assert!(!units[1].body.contains("## Notes"));
    }

    #[test]
    fn test_section_content_is_bounded() {
        let mut source = String::from("# Long\n");
        for i in 0..100 {
            source.push_str(&format!("line {i}\n"));
        }
        let units = extract_doc_sections(Path::new("a.md"), Language::Markdown, &source, 10);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].body.lines().count(), 11);
    }

    #[test]
    fn test_underlined_titles() {
        let source = indoc! {"
            Overview
            ========

            Some words here.

            Details
            -------
            More words.
        "};
        let units = extract_doc_sections(Path::new("doc.rst"), Language::Text, source, 40);
        let titles: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(titles, vec!["Overview", "Details"]);
    }

    #[test]
    fn test_no_headers_no_units() {
        let units =
            extract_doc_sections(Path::new("notes.txt"), Language::Text, "just prose\n", 40);
        assert!(units.is_empty());
    }
}
