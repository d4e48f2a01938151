//! Rollback to the pre-AirTIGHT baseline
//!
//! Each managed file has at most one `.bak` holding its original state. An
//! empty backup means the file did not exist before AirTIGHT wrote it.

use crate::config::PathSettings;
use crate::error::{AirtightError, Result};
use crate::privilege::Privilege;
use crate::remediation::backup_path;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackAction {
    /// Original content copied back
    Restored,
    /// File did not exist originally and was removed
    Removed,
    /// No backup, file left untouched
    NoBackup,
    /// Restore failed; the backup is kept
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackEntry {
    pub path: PathBuf,
    pub action: RollbackAction,
}

fn restore_file(path: &Path) -> Result<RollbackAction> {
    let backup = backup_path(path);
    if !backup.exists() {
        return Ok(RollbackAction::NoBackup);
    }

    let failed = |source: std::io::Error| AirtightError::PersistenceFailed {
        path: path.to_path_buf(),
        source,
    };

    let action = if fs::metadata(&backup).map_err(failed)?.len() == 0 {
        if path.exists() {
            fs::remove_file(path).map_err(failed)?;
        }
        RollbackAction::Removed
    } else {
        fs::copy(&backup, path).map_err(failed)?;
        RollbackAction::Restored
    };

    fs::remove_file(&backup).map_err(failed)?;
    info!("Rolled back {}: {:?}", path.display(), action);
    Ok(action)
}

/// Restore every managed file that has a backup. A failed file does not
/// stop the others.
pub fn rollback(paths: &PathSettings, privilege: Privilege) -> Result<Vec<RollbackEntry>> {
    if !privilege.is_elevated() {
        return Err(AirtightError::PrivilegeRequired);
    }

    let entries = paths
        .managed_files()
        .into_iter()
        .map(|path| {
            let action = restore_file(&path).unwrap_or_else(|e| {
                warn!("Rollback of {} failed: {}", path.display(), e);
                RollbackAction::Failed(e.to_string())
            });
            RollbackEntry { path, action }
        })
        .collect();
    Ok(entries)
}
