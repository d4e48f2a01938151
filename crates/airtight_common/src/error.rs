//! Error types for AirTIGHT.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AirtightError {
    #[error("Root privileges required for system/kernel tweaks")]
    PrivilegeRequired,

    #[error("Required tool not found: {0}")]
    DependencyMissing(String),

    #[error("Failed to persist {}: {source}", path.display())]
    PersistenceFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reload failed: {0}")]
    ReloadFailed(String),

    #[error("No known tweaks for vendor: {0}")]
    UnknownVendor(String),

    #[error("Unknown init system: {0}")]
    UnknownInitSystem(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AirtightError {
    /// Benign conditions are reported as skips, never as failures.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            AirtightError::UnknownVendor(_)
                | AirtightError::UnknownInitSystem(_)
                | AirtightError::DependencyMissing(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AirtightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benign_classification() {
        assert!(AirtightError::UnknownVendor("MediaTek".into()).is_benign());
        assert!(AirtightError::DependencyMissing("amixer".into()).is_benign());
        assert!(!AirtightError::PrivilegeRequired.is_benign());
        assert!(!AirtightError::ReloadFailed("iwlwifi".into()).is_benign());
    }

    #[test]
    fn test_persistence_message_names_path() {
        let err = AirtightError::PersistenceFailed {
            path: PathBuf::from("/etc/modprobe.d/airtight_coex.conf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("airtight_coex.conf"));
    }
}
