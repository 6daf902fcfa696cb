//! Archive container access for Silo.
//!
//! This crate is the container-format collaborator of the virtual classpath:
//! - `ArchiveSource`: a re-openable handle to a container's raw bytes,
//!   backed by memory (`BytesArchive`) or the filesystem (`FileArchive`).
//! - `scan`: walks every record of a container in stored order, flagging
//!   directory markers instead of dropping them.
//! - `read_entry_bytes` / `open_entry_stream`: re-scan a container for a
//!   single record and return its payload buffered or as an owned stream.
//!
//! Consumers see containers as a forward-only sequence of
//! (path, size hint, byte stream) records; everything zip-specific stays
//! behind this crate.

mod error;
mod scan;
mod source;

pub use error::{ArchiveError, Result};
pub use scan::{open_entry_stream, read_entry_bytes, scan, EntryStream, RecordInfo, ScanFlow};
pub use source::{ArchiveSource, BytesArchive, FileArchive, SourceReader};
