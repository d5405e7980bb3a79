use crate::errors::{RepoWardenError, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Enumerates files under a root, filtered by extension and exclude globs.
pub struct FileWalker {
    root: PathBuf,
    extensions: Option<Vec<String>>,
    exclude: Vec<glob::Pattern>,
    skip_dirs: Vec<PathBuf>,
}

impl FileWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: None,
            exclude: vec![],
            skip_dirs: vec![],
        }
    }

    /// Only yield files with one of these extensions (case-insensitive).
    pub fn with_extensions<S: AsRef<str>>(mut self, extensions: &[S]) -> Self {
        self.extensions = Some(
            extensions
                .iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        );
        self
    }

    pub fn with_exclude<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        self.exclude = patterns
            .iter()
            .map(|p| glob::Pattern::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(self)
    }

    /// Never descend into these directories. Relative entries are taken
    /// against the walk root.
    pub fn with_skip_dirs<P: AsRef<Path>>(mut self, dirs: &[P]) -> Self {
        self.skip_dirs = dirs
            .iter()
            .map(|d| {
                let d = d.as_ref();
                if d.is_absolute() {
                    d.to_path_buf()
                } else {
                    self.root.join(d)
                }
            })
            .collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree. Entries that cannot be read are skipped with a warning.
    /// Results are sorted so every run sees files in the same order.
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(RepoWardenError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", self.root.display()),
            )));
        }

        let root = self.root.clone();
        let exclude = self.exclude.clone();
        let skip_dirs = self.skip_dirs.clone();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .filter_entry(move |entry| {
                if entry.file_name() == ".git" {
                    return false;
                }
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                if !is_dir {
                    return true;
                }
                if entry.depth() > 0 && skip_dirs.iter().any(|d| entry.path().starts_with(d)) {
                    return false;
                }
                // A directory is pruned when a file directly inside it would be excluded.
                let probe = relative_to(&root, entry.path()).join("_");
                !matches_any(&exclude, &probe)
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) && self.should_process(path)
            {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    fn should_process(&self, path: &Path) -> bool {
        if let Some(extensions) = &self.extensions {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase());
            match ext {
                Some(ext) if extensions.contains(&ext) => {}
                _ => return false,
            }
        }

        !matches_any(&self.exclude, &relative_to(&self.root, path))
    }

    pub fn relative(&self, path: &Path) -> PathBuf {
        relative_to(&self.root, path)
    }
}

fn matches_any(patterns: &[glob::Pattern], path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    patterns.iter().any(|p| p.matches(&path_str))
}

pub fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Read a file as UTF-8 text.
pub fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| RepoWardenError::unreadable(path, e))
}

/// Read a file, logging and returning `None` when it cannot be read.
pub fn read_or_skip(path: &Path) -> Option<String> {
    match read_source(path) {
        Ok(content) => Some(content),
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}
