use silo_archive::ArchiveError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClasspathError>;

/// Errors produced by classpath ingestion and lookups.
///
/// A genuine miss is always [`ClasspathError::NotFound`]; lower-level
/// archive or I/O problems never masquerade as one.
#[derive(Debug, Error)]
pub enum ClasspathError {
    #[error("resource not found: {path}")]
    NotFound { path: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(ArchiveError),

    #[error("corrupt compressed entry: expected {expected} bytes, decoded {actual}")]
    Corrupt { expected: u64, actual: u64 },

    #[error("locator {path}#{ordinal} is not valid for this classpath")]
    InvalidLocator { path: String, ordinal: u32 },
}

impl From<ArchiveError> for ClasspathError {
    fn from(err: ArchiveError) -> Self {
        match err {
            // A scan-tier entry whose record vanished from its archive is a
            // miss, not an archive failure.
            ArchiveError::EntryNotFound { path, .. } => ClasspathError::NotFound { path },
            other => ClasspathError::Archive(other),
        }
    }
}
