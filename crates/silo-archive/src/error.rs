use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors produced while opening or scanning archive containers.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive {archive} has no entry {path}")]
    EntryNotFound { archive: String, path: String },

    #[error("entry {path} in {archive} uses unsupported compression ({method})")]
    UnsupportedCompression {
        archive: String,
        path: String,
        method: String,
    },
}
