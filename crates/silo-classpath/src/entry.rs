use std::borrow::Cow;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use silo_archive::{ArchiveSource, EntryStream};

use crate::error::{ClasspathError, Result};

/// Index of an entry record in a classpath's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EntryId(pub(crate) u32);

/// Storage tier selected for a payload at ingestion.
///
/// Purely observational: tier selection never changes the bytes a lookup
/// returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Raw bytes held in the arena.
    Inline,
    /// Gzip bytes plus the exact decoded size.
    Compressed,
    /// Reference back to the source archive, re-scanned on every access.
    Scan,
}

pub(crate) enum EntryData {
    Inline(Box<[u8]>),
    Compressed { data: Box<[u8]>, size: u64 },
    Scan { source: Arc<dyn ArchiveSource>, path: String },
}

/// One stored payload plus the chain link to the entry its path had before
/// this one was ingested.
pub(crate) struct EntryRecord {
    pub(crate) data: EntryData,
    pub(crate) next: Option<EntryId>,
}

impl EntryData {
    pub(crate) fn tier(&self) -> Tier {
        match self {
            EntryData::Inline(_) => Tier::Inline,
            EntryData::Compressed { .. } => Tier::Compressed,
            EntryData::Scan { .. } => Tier::Scan,
        }
    }

    pub(crate) fn bytes(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            EntryData::Inline(bytes) => Ok(Cow::Borrowed(&bytes[..])),
            EntryData::Compressed { data, size } => {
                decompress_exact(data, *size).map(Cow::Owned)
            }
            EntryData::Scan { source, path } => {
                tracing::debug!(
                    target: "silo.classpath",
                    archive = source.display_name(),
                    path = path.as_str(),
                    "re-scanning archive for payload bytes"
                );
                Ok(Cow::Owned(silo_archive::read_entry_bytes(
                    source.as_ref(),
                    path,
                )?))
            }
        }
    }

    pub(crate) fn stream(&self) -> Result<ResourceStream<'_>> {
        let inner = match self {
            EntryData::Inline(bytes) => StreamInner::Inline(&bytes[..]),
            EntryData::Compressed { data, .. } => StreamInner::Compressed(GzDecoder::new(&data[..])),
            EntryData::Scan { source, path } => {
                tracing::debug!(
                    target: "silo.classpath",
                    archive = source.display_name(),
                    path = path.as_str(),
                    "re-scanning archive for payload stream"
                );
                StreamInner::Scan(silo_archive::open_entry_stream(source.as_ref(), path)?)
            }
        };
        Ok(ResourceStream { inner })
    }
}

/// Gzip-compresses a payload for the compressed tier.
pub(crate) fn compress(payload: &[u8]) -> io::Result<Box<[u8]>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(payload.len()), Compression::default());
    encoder.write_all(payload)?;
    Ok(encoder.finish()?.into_boxed_slice())
}

fn decompress_exact(data: &[u8], size: u64) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(size as usize);
    GzDecoder::new(data).read_to_end(&mut out)?;
    if out.len() as u64 != size {
        return Err(ClasspathError::Corrupt {
            expected: size,
            actual: out.len() as u64,
        });
    }
    Ok(out)
}

/// Byte stream over one stored payload.
///
/// Scan-tier streams hold a reader over their source archive open until
/// dropped; consume them promptly.
pub struct ResourceStream<'a> {
    inner: StreamInner<'a>,
}

enum StreamInner<'a> {
    Inline(&'a [u8]),
    Compressed(GzDecoder<&'a [u8]>),
    Scan(EntryStream),
    Reader(Box<dyn Read + 'a>),
}

impl<'a> ResourceStream<'a> {
    /// Wraps an arbitrary reader, for providers that are not classpaths.
    pub fn from_reader(reader: impl Read + 'a) -> Self {
        Self {
            inner: StreamInner::Reader(Box::new(reader)),
        }
    }
}

impl fmt::Debug for ResourceStream<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.inner {
            StreamInner::Inline(_) => "Inline",
            StreamInner::Compressed(_) => "Compressed",
            StreamInner::Scan(_) => "Scan",
            StreamInner::Reader(_) => "Reader",
        };
        f.debug_struct("ResourceStream").field("inner", &kind).finish()
    }
}

impl Read for ResourceStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            StreamInner::Inline(slice) => slice.read(buf),
            StreamInner::Compressed(reader) => reader.read(buf),
            StreamInner::Scan(reader) => reader.read(buf),
            StreamInner::Reader(reader) => reader.read(buf),
        }
    }
}
