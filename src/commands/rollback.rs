use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use super::context::{print_json, CommandContext};
use super::Outcome;
use crate::cleanup::{rollback, TarArchiver};

/// A bare archive name is looked up in the backup directory, with or
/// without its `.tar.gz` suffix.
fn resolve_archive(backup: &Path, backup_dir: &Path) -> PathBuf {
    if backup.is_file() {
        return backup.to_path_buf();
    }
    let in_dir = backup_dir.join(backup);
    if in_dir.is_file() {
        return in_dir;
    }
    let mut with_suffix = in_dir.into_os_string();
    with_suffix.push(".tar.gz");
    PathBuf::from(with_suffix)
}

/// Stage a backup for inspection. The live tree is never restored.
pub fn handle_rollback(ctx: &CommandContext, backup: &Path) -> Result<Outcome> {
    let backup_dir = ctx.config.backup_dir_for(&ctx.root);
    let archive = resolve_archive(backup, &backup_dir);
    let staged = rollback(&TarArchiver, &archive, &backup_dir)
        .with_context(|| format!("Could not stage backup {}", backup.display()))?;

    if ctx.is_json() {
        print_json(&serde_json::json!({
            "archive": archive,
            "staging": staged,
        }))?;
    } else {
        println!("{} {}", "Staged".green(), staged.display());
        println!("Compare it with the working tree and restore files by hand.");
    }
    Ok(Outcome::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_archive_by_name() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("backup_20260101_000000.tar.gz");
        fs::write(&archive, b"").unwrap();

        assert_eq!(resolve_archive(&archive, Path::new("/nowhere")), archive);
        assert_eq!(
            resolve_archive(Path::new("backup_20260101_000000.tar.gz"), dir.path()),
            archive
        );
        assert_eq!(
            resolve_archive(Path::new("backup_20260101_000000"), dir.path()),
            archive
        );
    }
}
