//! Persisted configuration blocks
//!
//! Read before write, write only on diff. The first write to a managed file
//! leaves exactly one `<file>.bak` holding the original state; it is never
//! replaced afterwards. A file that did not exist gets an empty backup.

use crate::error::{AirtightError, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of persisting a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// File already holds the block; nothing touched
    AlreadyPresent,
    /// Block written; `backup` is set when this write created the backup
    Written { backup: Option<PathBuf> },
}

/// `<path>.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}

/// Whether `path` already contains `block` verbatim (both trimmed)
pub fn block_present(path: &Path, block: &str) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let existing = fs::read_to_string(path).map_err(|source| AirtightError::PersistenceFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(existing.trim().contains(block.trim()))
}

fn persistence_error(path: &Path) -> impl FnOnce(std::io::Error) -> AirtightError + '_ {
    move |source| AirtightError::PersistenceFailed {
        path: path.to_path_buf(),
        source,
    }
}

/// Make sure `path` holds `block`, backing up the original state once
pub fn persist_block(path: &Path, block: &str) -> Result<PersistOutcome> {
    if block_present(path, block)? {
        return Ok(PersistOutcome::AlreadyPresent);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(persistence_error(path))?;
    }

    let backup = backup_path(path);
    let created_backup = if backup.exists() {
        None
    } else {
        if path.exists() {
            fs::copy(path, &backup).map_err(persistence_error(&backup))?;
        } else {
            fs::write(&backup, "").map_err(persistence_error(&backup))?;
        }
        info!("Backup created: {}", backup.display());
        Some(backup)
    };

    fs::write(path, block).map_err(persistence_error(path))?;
    info!("Config written: {}", path.display());

    Ok(PersistOutcome::Written {
        backup: created_backup,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BLOCK: &str = "# AirTIGHT Test\noptions foo bar=1\n";

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("/etc/modprobe.d/airtight_coex.conf")),
            PathBuf::from("/etc/modprobe.d/airtight_coex.conf.bak")
        );
    }

    #[test]
    fn test_new_file_gets_empty_backup() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("modprobe.d/test.conf");

        let outcome = persist_block(&path, BLOCK).unwrap();
        let backup = backup_path(&path);
        assert_eq!(
            outcome,
            PersistOutcome::Written {
                backup: Some(backup.clone())
            }
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), BLOCK);
        assert_eq!(fs::read_to_string(&backup).unwrap(), "");
    }

    #[test]
    fn test_second_write_is_noop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.conf");
        persist_block(&path, BLOCK).unwrap();

        let outcome = persist_block(&path, BLOCK).unwrap();
        assert_eq!(outcome, PersistOutcome::AlreadyPresent);
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_backup_preserves_original_and_is_never_overwritten() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.conf");
        fs::write(&path, "options foo bar=0\n").unwrap();

        persist_block(&path, BLOCK).unwrap();
        let backup = backup_path(&path);
        assert_eq!(fs::read_to_string(&backup).unwrap(), "options foo bar=0\n");

        // Someone edits the file; a later write must not touch the baseline
        fs::write(&path, "options foo bar=2\n").unwrap();
        let outcome = persist_block(&path, BLOCK).unwrap();
        assert_eq!(outcome, PersistOutcome::Written { backup: None });
        assert_eq!(fs::read_to_string(&backup).unwrap(), "options foo bar=0\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), BLOCK);
    }

    #[test]
    fn test_block_present_with_surrounding_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.conf");
        fs::write(&path, format!("# local\n{}\n\n# trailing\n", BLOCK)).unwrap();
        assert!(block_present(&path, BLOCK).unwrap());
        assert!(!block_present(&temp.path().join("missing.conf"), BLOCK).unwrap());
    }

    #[test]
    fn test_unwritable_location_is_persistence_failure() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not_a_dir");
        fs::write(&blocker, "file").unwrap();
        let err = persist_block(&blocker.join("test.conf"), BLOCK).unwrap_err();
        assert!(matches!(err, AirtightError::PersistenceFailed { .. }));
    }
}
