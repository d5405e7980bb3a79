//! Full-tree backup archives and rollback extraction.

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::file_stamp;
use crate::errors::{RepoWardenError, Result};

/// Reference to a completed backup archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupHandle {
    pub archive: PathBuf,
    pub created_at: DateTime<Utc>,
    pub file_count: usize,
    /// SHA-256 of the archive file
    pub checksum: String,
}

impl BackupHandle {
    /// Archive name without the `.tar.gz` suffix.
    pub fn name(&self) -> String {
        backup_name(&self.archive)
    }
}

pub fn backup_name(archive: &Path) -> String {
    let file_name = archive
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("backup");
    file_name
        .trim_end_matches(".tar.gz")
        .trim_end_matches(".tgz")
        .to_string()
}

/// What a backup leaves out.
#[derive(Debug, Clone, Default)]
pub struct BackupScope {
    /// Absolute directories never archived (output and backup directories)
    pub skip_dirs: Vec<PathBuf>,
    /// Glob patterns matched against root-relative paths
    pub exclude: Vec<glob::Pattern>,
}

impl BackupScope {
    pub fn new<S: AsRef<str>>(skip_dirs: Vec<PathBuf>, exclude: &[S]) -> Result<Self> {
        let exclude = exclude
            .iter()
            .map(|p| glob::Pattern::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { skip_dirs, exclude })
    }

    fn skips(&self, root: &Path, path: &Path) -> bool {
        if path.file_name().map(|n| n == ".git").unwrap_or(false) {
            return true;
        }
        if self.skip_dirs.iter().any(|d| path.starts_with(d)) {
            return true;
        }
        let rel = path.strip_prefix(root).unwrap_or(path);
        self.exclude
            .iter()
            .any(|p| p.matches_path(rel) || p.matches_path(&rel.join("_")))
    }
}

/// Creates and extracts backup archives.
pub trait Archiver {
    /// Archive `root` into a new file under `dest_dir`.
    fn create(&self, root: &Path, dest_dir: &Path, scope: &BackupScope) -> Result<BackupHandle>;

    /// Unpack `archive` into `staging`, returning the directory written.
    fn extract(&self, archive: &Path, staging: &Path) -> Result<PathBuf>;
}

/// Gzip-compressed tar archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarArchiver;

impl Archiver for TarArchiver {
    fn create(&self, root: &Path, dest_dir: &Path, scope: &BackupScope) -> Result<BackupHandle> {
        let failure = |what: &str, e: &dyn std::fmt::Display| {
            RepoWardenError::BackupFailure(format!("{what}: {e}"))
        };

        fs::create_dir_all(dest_dir).map_err(|e| failure("creating backup directory", &e))?;
        let created_at = Utc::now();
        let archive = dest_dir.join(format!("backup_{}.tar.gz", file_stamp(created_at)));
        let file = File::create(&archive).map_err(|e| failure("creating archive", &e))?;

        let written = write_archive(file, root, scope).and_then(|count| {
            let digest = checksum(&archive).map_err(|e| failure("hashing archive", &e))?;
            Ok((count, digest))
        });
        let (file_count, checksum) = match written {
            Ok(written) => written,
            Err(e) => {
                if let Err(remove) = fs::remove_file(&archive) {
                    warn!("Could not remove partial archive {}: {}", archive.display(), remove);
                }
                return Err(e);
            }
        };
        info!("Backed up {} files to {}", file_count, archive.display());

        Ok(BackupHandle {
            archive,
            created_at,
            file_count,
            checksum,
        })
    }

    fn extract(&self, archive: &Path, staging: &Path) -> Result<PathBuf> {
        let file = File::open(archive).map_err(|e| RepoWardenError::unreadable(archive, e))?;
        fs::create_dir_all(staging)?;
        let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
        tar.unpack(staging).map_err(|e| {
            RepoWardenError::BackupFailure(format!("extracting {}: {e}", archive.display()))
        })?;
        debug!("Extracted {} into {}", archive.display(), staging.display());
        Ok(staging.to_path_buf())
    }
}

/// Stream every in-scope file under `root` into a gzip-compressed tar.
fn write_archive(file: File, root: &Path, scope: &BackupScope) -> Result<usize> {
    let failure = |what: &str, e: &dyn std::fmt::Display| {
        RepoWardenError::BackupFailure(format!("{what}: {e}"))
    };

    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    let mut file_count = 0;
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.path() == root || !scope.skips(root, e.path()));

    for entry in walker {
        let entry = entry.map_err(|e| failure("walking tree", &e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        builder
            .append_path_with_name(entry.path(), rel)
            .map_err(|e| failure(&format!("archiving {}", rel.display()), &e))?;
        file_count += 1;
    }

    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .map_err(|e| failure("finishing archive", &e))?;
    Ok(file_count)
}

fn checksum(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Extract a backup into `<backup_dir>/staging/<name>/` for manual
/// verification. The live tree is never touched.
pub fn rollback<A: Archiver>(archiver: &A, archive: &Path, backup_dir: &Path) -> Result<PathBuf> {
    if !archive.is_file() {
        return Err(RepoWardenError::BackupFailure(format!(
            "backup {} does not exist",
            archive.display()
        )));
    }
    let staging = backup_dir.join("staging").join(backup_name(archive));
    if staging.exists() {
        return Err(RepoWardenError::BackupFailure(format!(
            "staging directory {} already exists",
            staging.display()
        )));
    }
    archiver.extract(archive, &staging)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::create_dir_all(dir.path().join(".repowarden")).unwrap();
        fs::write(dir.path().join("src/app.py"), "print('hi')\n").unwrap();
        fs::write(dir.path().join("README.md"), "# Readme\n").unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref\n").unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "x\n").unwrap();
        fs::write(dir.path().join(".repowarden/old.json"), "{}\n").unwrap();
        dir
    }

    #[test]
    fn test_backup_and_rollback_to_staging() {
        let repo = fixture();
        let output = repo.path().join(".repowarden");
        let backups = output.join("backups");
        let scope = BackupScope::new(vec![output.clone()], &["**/node_modules/**"]).unwrap();

        let handle = TarArchiver.create(repo.path(), &backups, &scope).unwrap();
        assert_eq!(handle.file_count, 2);
        assert_eq!(handle.checksum.len(), 64);

        let staging = rollback(&TarArchiver, &handle.archive, &backups).unwrap();
        assert_eq!(staging, backups.join("staging").join(handle.name()));
        assert_eq!(
            fs::read_to_string(staging.join("src/app.py")).unwrap(),
            "print('hi')\n"
        );
        assert!(!staging.join(".git").exists());
        assert!(!staging.join("node_modules").exists());

        // Staging is never reused
        assert!(rollback(&TarArchiver, &handle.archive, &backups).is_err());
    }

    #[test]
    fn test_failed_backup_leaves_no_archive() {
        let dir = TempDir::new().unwrap();
        let backups = dir.path().join("backups");
        let scope = BackupScope::default();

        let err = TarArchiver
            .create(&dir.path().join("vanished"), &backups, &scope)
            .unwrap_err();
        assert!(matches!(err, RepoWardenError::BackupFailure(_)));
        assert_eq!(fs::read_dir(&backups).unwrap().count(), 0);
    }

    #[test]
    fn test_rollback_missing_archive() {
        let dir = TempDir::new().unwrap();
        let err = rollback(&TarArchiver, &dir.path().join("nope.tar.gz"), dir.path()).unwrap_err();
        assert!(matches!(err, RepoWardenError::BackupFailure(_)));
    }

    #[test]
    fn test_backup_name() {
        assert_eq!(
            backup_name(Path::new("/b/backup_20240101T000000.000Z.tar.gz")),
            "backup_20240101T000000.000Z"
        );
    }
}
