//! Core domain types shared by every analysis stage.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

/// Language or document class of a file. Units are only ever compared
/// within the same class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    Shell,
    Ruby,
    Java,
    Markdown,
    Text,
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        static EXTENSION_MAP: &[(&[&str], Language)] = &[
            (&["rs"], Language::Rust),
            (&["py", "pyi"], Language::Python),
            (&["js", "jsx", "mjs", "cjs"], Language::JavaScript),
            (&["ts", "tsx", "mts", "cts"], Language::TypeScript),
            (&["go"], Language::Go),
            (&["sh", "bash", "zsh"], Language::Shell),
            (&["rb"], Language::Ruby),
            (&["java", "kt"], Language::Java),
            (&["md", "markdown", "mdx"], Language::Markdown),
            (&["txt", "rst", "adoc"], Language::Text),
        ];

        let ext = ext.to_ascii_lowercase();
        EXTENSION_MAP
            .iter()
            .find(|(exts, _)| exts.contains(&ext.as_str()))
            .map(|(_, lang)| *lang)
            .unwrap_or(Language::Unknown)
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    pub fn is_documentation(&self) -> bool {
        matches!(self, Language::Markdown | Language::Text)
    }

    pub fn is_code(&self) -> bool {
        !self.is_documentation() && *self != Language::Unknown
    }

    /// Prefix of a single-line comment, used by line classification and
    /// cleanup annotations. Markdown uses HTML comments, see
    /// [`Language::comment_wrap`].
    pub fn line_comment(&self) -> &'static str {
        match self {
            Language::Python | Language::Shell | Language::Ruby => "#",
            Language::Rust
            | Language::JavaScript
            | Language::TypeScript
            | Language::Go
            | Language::Java => "//",
            Language::Markdown | Language::Text | Language::Unknown => "",
        }
    }

    /// Wrap `text` in this language's comment syntax.
    pub fn comment_wrap(&self, text: &str) -> String {
        match self {
            Language::Markdown | Language::Text | Language::Unknown => {
                format!("<!-- {text} -->")
            }
            _ => format!("{} {text}", self.line_comment()),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Shell => "shell",
            Language::Ruby => "ruby",
            Language::Java => "java",
            Language::Markdown => "markdown",
            Language::Text => "text",
            Language::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// What a comparable unit was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Function,
    DocSection,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Function => f.write_str("function"),
            UnitKind::DocSection => f.write_str("doc section"),
        }
    }
}

/// A function definition or documentation section extracted for comparison.
///
/// Units are created fresh on every run and never mutated afterwards; there
/// is no identity across runs beyond the location and fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparableUnit {
    pub kind: UnitKind,
    pub language: Language,
    /// Path relative to the analysed root
    pub file_path: PathBuf,
    /// 1-based line of the definition or header
    pub start_line: usize,
    pub name: String,
    pub body: String,
    /// Short SHA-256 of the whitespace-normalised body
    pub fingerprint: String,
}

impl ComparableUnit {
    pub fn new(
        kind: UnitKind,
        language: Language,
        file_path: PathBuf,
        start_line: usize,
        name: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let body = body.into();
        let fingerprint = fingerprint(&body);
        Self {
            kind,
            language,
            file_path,
            start_line,
            name: name.into(),
            body,
            fingerprint,
        }
    }

    pub fn location(&self) -> Location {
        Location {
            file: self.file_path.clone(),
            line: self.start_line,
        }
    }

    /// Number of non-blank lines in the body.
    pub fn body_lines(&self) -> usize {
        self.body.lines().filter(|l| !l.trim().is_empty()).count()
    }
}

/// A `file:line` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

fn fingerprint(body: &str) -> String {
    let normalized = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}

/// Timestamp format used in artifact file names.
pub const STAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";

pub fn file_stamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format(STAMP_FORMAT).to_string()
}
