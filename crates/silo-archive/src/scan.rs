use std::io::{Read, Seek, SeekFrom};

use flate2::read::DeflateDecoder;
use zip::CompressionMethod;
use zip::ZipArchive;

use crate::error::{ArchiveError, Result};
use crate::source::{ArchiveSource, SourceReader};

/// One record of a container, in stored order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordInfo {
    /// Record path exactly as stored in the container.
    pub path: String,
    /// Declared payload size, if the container knows it at scan time.
    ///
    /// Advisory only: consumers may use it to pre-size buffers but must not
    /// rely on it being present or truthful.
    pub size_hint: Option<u64>,
    /// Directory marker. The payload reader of a directory record is empty.
    pub is_directory: bool,
}

/// Continue-or-stop decision returned by a [`scan`] callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanFlow {
    Continue,
    Stop,
}

/// Walks every record of the container in stored order.
///
/// The callback receives the record metadata and a reader over its payload;
/// the reader is only valid for the duration of that call. Directory markers
/// are passed through flagged, never silently dropped.
pub fn scan<F>(source: &dyn ArchiveSource, mut record: F) -> Result<()>
where
    F: FnMut(&RecordInfo, &mut dyn Read) -> Result<ScanFlow>,
{
    let mut archive = ZipArchive::new(source.open()?)?;
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        let info = RecordInfo {
            path: file.name().to_owned(),
            size_hint: Some(file.size()),
            is_directory: file.is_dir(),
        };
        match record(&info, &mut file)? {
            ScanFlow::Continue => {}
            ScanFlow::Stop => return Ok(()),
        }
    }
    Ok(())
}

/// Re-scans the container and buffers the payload of the first record whose
/// path matches.
pub fn read_entry_bytes(source: &dyn ArchiveSource, path: &str) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(source.open()?)?;
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() || file.name() != path {
            continue;
        }
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        return Ok(bytes);
    }
    Err(ArchiveError::EntryNotFound {
        archive: source.display_name().to_owned(),
        path: path.to_owned(),
    })
}

/// Re-scans the container and returns an owned stream positioned at the
/// payload of the first record whose path matches.
///
/// The stream holds a reader over the container open until dropped; callers
/// are expected to consume it promptly.
pub fn open_entry_stream(source: &dyn ArchiveSource, path: &str) -> Result<EntryStream> {
    let mut archive = ZipArchive::new(source.open()?)?;
    let mut found = None;
    for index in 0..archive.len() {
        let file = archive.by_index(index)?;
        if file.is_dir() || file.name() != path {
            continue;
        }
        found = Some((file.data_start(), file.compressed_size(), file.compression()));
        break;
    }
    let Some((data_start, compressed_len, method)) = found else {
        return Err(ArchiveError::EntryNotFound {
            archive: source.display_name().to_owned(),
            path: path.to_owned(),
        });
    };
    drop(archive);

    // The directory walk above consumed the first reader; payload bytes come
    // from a fresh one positioned at the record's data.
    let mut reader = source.open()?;
    reader.seek(SeekFrom::Start(data_start))?;
    let raw = reader.take(compressed_len);
    let inner = match method {
        CompressionMethod::Stored => EntryStreamInner::Stored(raw),
        CompressionMethod::Deflated => EntryStreamInner::Deflated(DeflateDecoder::new(raw)),
        other => {
            return Err(ArchiveError::UnsupportedCompression {
                archive: source.display_name().to_owned(),
                path: path.to_owned(),
                method: format!("{other:?}"),
            })
        }
    };
    Ok(EntryStream { inner })
}

/// Owned byte stream over a single record's payload.
pub struct EntryStream {
    inner: EntryStreamInner,
}

enum EntryStreamInner {
    Stored(std::io::Take<SourceReader>),
    Deflated(DeflateDecoder<std::io::Take<SourceReader>>),
}

impl Read for EntryStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            EntryStreamInner::Stored(reader) => reader.read(buf),
            EntryStreamInner::Deflated(reader) => reader.read(buf),
        }
    }
}
