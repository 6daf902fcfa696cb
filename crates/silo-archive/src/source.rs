use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Owned reader over a container's raw bytes, produced by
/// [`ArchiveSource::open`].
pub struct SourceReader {
    inner: Box<dyn ReadSeek + Send>,
}

impl SourceReader {
    pub fn new(reader: impl Read + Seek + Send + 'static) -> Self {
        Self {
            inner: Box::new(reader),
        }
    }
}

impl Read for SourceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for SourceReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// A re-openable archive container.
///
/// Every `open` call must yield a fresh reader over the same container
/// bytes. Scanning consumes one reader per pass; scan-tier classpath entries
/// keep the source around and re-open it on every access, so sources are
/// expected to stay valid for the lifetime of whatever ingested them.
pub trait ArchiveSource: Send + Sync {
    /// Human-readable identifier used in errors and logs.
    fn display_name(&self) -> &str;

    fn open(&self) -> io::Result<SourceReader>;
}

/// In-memory archive container.
#[derive(Clone)]
pub struct BytesArchive {
    name: String,
    bytes: Arc<[u8]>,
}

impl BytesArchive {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl ArchiveSource for BytesArchive {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> io::Result<SourceReader> {
        Ok(SourceReader::new(Cursor::new(self.bytes.clone())))
    }
}

/// Archive container stored as a file on disk.
#[derive(Clone, Debug)]
pub struct FileArchive {
    path: PathBuf,
    name: String,
}

impl FileArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArchiveSource for FileArchive {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> io::Result<SourceReader> {
        Ok(SourceReader::new(File::open(&self.path)?))
    }
}
