use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, CapsuleError>;

/// Canonical error surface for capsule-core.
#[derive(Debug, Error)]
pub enum CapsuleError {
    #[error("Invalid capsule title: {title:?}")]
    InvalidTitle { title: String },

    #[error("Invalid date {input:?}: expected DD-MM-YYYY")]
    InvalidDateFormat { input: String },

    #[error(
        "Unlock date must be in the future (unlock {}, today {})",
        .unlock_date.format("%d-%m-%Y"),
        .today.format("%d-%m-%Y")
    )]
    PastOrPresentDate {
        unlock_date: NaiveDate,
        today: NaiveDate,
    },

    #[error("Attachment not found: {path}")]
    MissingAttachment { path: PathBuf },

    #[error("Capsule already exists: {path}")]
    CapsuleExists { path: PathBuf },

    #[error("Decryption failed - wrong key or corrupted capsule ({reason})")]
    DecryptionFailed { reason: String },

    #[error("Invalid capsule format: {reason}")]
    InvalidCapsuleFormat { reason: String },

    #[error("Key file {path}: {reason}")]
    KeyFile { path: PathBuf, reason: String },

    #[error("Key derivation failed: {reason}")]
    KeyDerivation { reason: String },

    #[error("Encryption failed: {reason}")]
    Encryption { reason: String },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {source}")]
    Io {
        source: std::io::Error,
        path: Option<PathBuf>,
    },
}

impl CapsuleError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| CapsuleError::Io {
            source,
            path: Some(path),
        }
    }

    pub(crate) fn format(reason: impl Into<String>) -> Self {
        CapsuleError::InvalidCapsuleFormat {
            reason: reason.into(),
        }
    }

    /// True for caller mistakes that are rejected before anything touches disk.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CapsuleError::InvalidTitle { .. }
                | CapsuleError::InvalidDateFormat { .. }
                | CapsuleError::PastOrPresentDate { .. }
                | CapsuleError::MissingAttachment { .. }
                | CapsuleError::CapsuleExists { .. }
        )
    }
}

impl From<std::io::Error> for CapsuleError {
    fn from(source: std::io::Error) -> Self {
        CapsuleError::Io { source, path: None }
    }
}
