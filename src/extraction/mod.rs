//! Unit extraction: walks the repository and yields comparable units.
//!
//! Extraction is read-only. A file that cannot be read is skipped with a
//! warning and counted in [`ExtractionOutcome::files_skipped`]; it never
//! fails the run.

pub mod docs;
pub mod functions;

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::ExtractionConfig;
use crate::core::{ComparableUnit, Language, UnitKind};
use crate::errors::Result;
use crate::io::walker::{read_source, FileWalker};

pub use docs::extract_doc_sections;
pub use functions::{extract_functions, FunctionOptions};

/// Units found in one extraction pass, in walk order.
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    pub units: Vec<ComparableUnit>,
    pub files_scanned: usize,
    pub files_skipped: usize,
}

impl ExtractionOutcome {
    pub fn of_kind(&self, kind: UnitKind) -> impl Iterator<Item = &ComparableUnit> {
        self.units.iter().filter(move |u| u.kind == kind)
    }

    pub fn count(&self, kind: UnitKind) -> usize {
        self.of_kind(kind).count()
    }
}

pub struct UnitExtractor<'a> {
    config: &'a ExtractionConfig,
    skip_dirs: Vec<PathBuf>,
}

impl<'a> UnitExtractor<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self {
            config,
            skip_dirs: Vec::new(),
        }
    }

    /// Directories the walk never enters, such as the report and backup
    /// directories.
    pub fn with_skip_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.skip_dirs = dirs;
        self
    }

    fn function_options(&self) -> FunctionOptions {
        FunctionOptions {
            body_lines: self.config.body_lines,
            min_function_lines: self.config.min_function_lines,
            nested_definitions: self.config.nested_definitions,
        }
    }

    /// Extract units from a single file's content. `relative` is recorded as
    /// the unit's path.
    pub fn extract_content(&self, relative: &Path, content: &str) -> Vec<ComparableUnit> {
        let language = Language::from_path(relative);
        if language.is_documentation() {
            extract_doc_sections(relative, language, content, self.config.doc_section_max_lines)
        } else if language.is_code() {
            extract_functions(relative, language, content, &self.function_options())
        } else {
            Vec::new()
        }
    }

    /// Walk `root` and extract every function and documentation unit.
    pub fn extract(&self, root: &Path) -> Result<ExtractionOutcome> {
        let extensions: Vec<&String> = self
            .config
            .code_extensions
            .iter()
            .chain(self.config.doc_extensions.iter())
            .collect();
        let walker = FileWalker::new(root)
            .with_extensions(&extensions)
            .with_exclude(&self.config.exclude)?
            .with_skip_dirs(&self.skip_dirs);

        let mut outcome = ExtractionOutcome::default();
        for path in walker.walk()? {
            let relative = walker.relative(&path);
            match read_source(&path) {
                Ok(content) => {
                    outcome.files_scanned += 1;
                    let units = self.extract_content(&relative, &content);
                    debug!("{}: {} units", relative.display(), units.len());
                    outcome.units.extend(units);
                }
                Err(e) => {
                    warn!("Skipping file: {}", e);
                    outcome.files_skipped += 1;
                }
            }
        }

        debug!(
            "Extracted {} functions and {} doc sections from {} files ({} skipped)",
            outcome.count(UnitKind::Function),
            outcome.count(UnitKind::DocSection),
            outcome.files_scanned,
            outcome.files_skipped
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extract_mixed_tree() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(
            root.join("tool.py"),
            "def run(args):\n    a = 1\n    b = 2\n    c = 3\n    return a + b + c\n",
        )
        .unwrap();
        fs::write(root.join("README.md"), "# Title\nSome text\n## Usage\nRun it\n").unwrap();
        fs::write(root.join("image.png"), [0u8, 1, 2]).unwrap();

        let config = ExtractionConfig::default();
        let outcome = UnitExtractor::new(&config).extract(root).unwrap();
        assert_eq!(outcome.files_scanned, 2);
        assert_eq!(outcome.count(UnitKind::Function), 1);
        assert_eq!(outcome.count(UnitKind::DocSection), 2);
    }

    #[test]
    fn test_non_utf8_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bad.py"), [0xffu8, 0xfe, 0x00, 0x80]).unwrap();

        let config = ExtractionConfig::default();
        let outcome = UnitExtractor::new(&config).extract(temp.path()).unwrap();
        assert_eq!(outcome.files_skipped, 1);
        assert!(outcome.units.is_empty());
    }
}
