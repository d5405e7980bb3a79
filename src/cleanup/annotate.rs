//! Review annotations inserted above duplicated units.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::{Language, Location};
use crate::errors::Result;
use crate::io::walker::read_source;

const MARKER: &str = "repowarden:";

/// One comment to insert directly above `target.line`.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub target: Location,
    pub language: Language,
    pub text: String,
}

impl Annotation {
    pub fn duplicate_of(target: Location, language: Language, duplicate: &Location, score: f64) -> Self {
        Self {
            target,
            language,
            text: format!(
                "{MARKER} possible duplicate of {duplicate} (similarity {score:.1}%), review for consolidation"
            ),
        }
    }

    fn rendered(&self) -> String {
        self.language.comment_wrap(&self.text)
    }
}

/// What happened to one annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationStatus {
    /// Not attempted (preview, or the file could not be processed)
    Pending,
    Inserted,
    AlreadyPresent,
    /// The recorded line is past the end of the file
    OutOfRange,
}

/// Result of applying a batch of annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationOutcome {
    /// One status per input annotation, in input order
    pub statuses: Vec<AnnotationStatus>,
    pub files_modified: Vec<PathBuf>,
    /// Files that could not be read or written
    pub errors: Vec<String>,
}

impl AnnotationOutcome {
    pub fn inserted(&self) -> usize {
        self.count(AnnotationStatus::Inserted)
    }

    pub fn count(&self, status: AnnotationStatus) -> usize {
        self.statuses.iter().filter(|s| **s == status).count()
    }
}

/// Whether the run of annotation comments directly above `index` already
/// contains `rendered`.
fn already_annotated(lines: &[String], index: usize, rendered: &str) -> bool {
    lines[..index]
        .iter()
        .rev()
        .take_while(|l| l.contains(MARKER))
        .any(|l| l.trim() == rendered)
}

/// Insert `annotations` into one file. Insertions are applied from the
/// bottom up so recorded line numbers stay valid.
fn annotate_file(
    path: &Path,
    pending: &mut [(usize, &Annotation)],
    statuses: &mut [AnnotationStatus],
) -> Result<bool> {
    let content = read_source(path)?;
    let trailing_newline = content.ends_with('\n');
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

    // Stable sort keeps input order among annotations on one line.
    pending.sort_by(|(_, a), (_, b)| b.target.line.cmp(&a.target.line));

    let mut inserted = false;
    for (position, annotation) in pending.iter() {
        let line = annotation.target.line;
        if line == 0 || line > lines.len() {
            warn!("{} is past the end of the file; not annotated", annotation.target);
            statuses[*position] = AnnotationStatus::OutOfRange;
            continue;
        }
        let index = line - 1;
        let rendered = annotation.rendered();
        if already_annotated(&lines, index, &rendered) {
            debug!("{} already annotated", annotation.target);
            statuses[*position] = AnnotationStatus::AlreadyPresent;
            continue;
        }
        let indent: String = lines[index]
            .chars()
            .take_while(|c| c.is_whitespace())
            .collect();
        lines.insert(index, format!("{indent}{rendered}"));
        statuses[*position] = AnnotationStatus::Inserted;
        inserted = true;
    }

    if inserted {
        let mut updated = lines.join("\n");
        if trailing_newline {
            updated.push('\n');
        }
        fs::write(path, updated)?;
    }
    Ok(inserted)
}

/// Insert `annotations` into the files under `root`. A file that cannot be
/// processed is recorded in [`AnnotationOutcome::errors`] and the rest
/// continue.
pub fn apply_annotations(root: &Path, annotations: &[Annotation]) -> AnnotationOutcome {
    let mut by_file: BTreeMap<&Path, Vec<(usize, &Annotation)>> = BTreeMap::new();
    for (position, annotation) in annotations.iter().enumerate() {
        by_file
            .entry(annotation.target.file.as_path())
            .or_default()
            .push((position, annotation));
    }

    let mut outcome = AnnotationOutcome {
        statuses: vec![AnnotationStatus::Pending; annotations.len()],
        ..AnnotationOutcome::default()
    };
    for (relative, mut pending) in by_file {
        match annotate_file(&root.join(relative), &mut pending, &mut outcome.statuses) {
            Ok(true) => outcome.files_modified.push(relative.to_path_buf()),
            Ok(false) => {}
            Err(e) => {
                warn!("Could not annotate {}: {}", relative.display(), e);
                outcome.errors.push(format!("{}: {}", relative.display(), e));
            }
        }
    }
    outcome
}
