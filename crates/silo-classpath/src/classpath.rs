use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

use silo_archive::{scan, ArchiveError, ArchiveSource, RecordInfo, ScanFlow};

use crate::entry::{compress, EntryData, EntryId, EntryRecord, ResourceStream, Tier};
use crate::error::{ClasspathError, Result};
use crate::locator::{ClasspathId, ResourceLocator};

/// Storage-tier thresholds applied to every payload at ingestion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TieringPolicy {
    /// Payloads up to this many bytes are stored raw.
    pub inline_max: usize,
    /// Capacity of the reusable read buffer. Payloads that fill it are never
    /// held in memory; they fall back to re-scanning their archive on every
    /// access.
    pub buffer_bytes: usize,
}

impl TieringPolicy {
    pub const DEFAULT_INLINE_MAX: usize = 128;
    pub const DEFAULT_BUFFER_BYTES: usize = 256 * 1024;
}

impl Default for TieringPolicy {
    fn default() -> Self {
        Self {
            inline_max: Self::DEFAULT_INLINE_MAX,
            buffer_bytes: Self::DEFAULT_BUFFER_BYTES,
        }
    }
}

/// In-memory virtual classpath.
///
/// Built by ingesting archives one at a time with [`Classpath::add_archive`],
/// then treated as read-only. Each ingested payload is stored in the tier its
/// size selects; paths ingested more than once keep their full history as a
/// chain whose head is the most recent entry.
///
/// Entries live in an arena indexed by the path→head map, so a completed
/// classpath has no interior mutability and is safe to read from any number
/// of threads.
pub struct Classpath {
    id: ClasspathId,
    policy: TieringPolicy,
    entries: Vec<EntryRecord>,
    heads: HashMap<String, EntryId>,
}

impl Classpath {
    pub fn new() -> Self {
        Self::with_policy(TieringPolicy::default())
    }

    /// # Panics
    ///
    /// Panics if the policy is inconsistent (`inline_max` must be smaller
    /// than `buffer_bytes`, and the buffer must not be empty).
    pub fn with_policy(policy: TieringPolicy) -> Self {
        assert!(policy.buffer_bytes > 0, "read buffer must not be empty");
        assert!(
            policy.inline_max < policy.buffer_bytes,
            "inline threshold must be below the read buffer capacity"
        );
        Self {
            id: ClasspathId::next(),
            policy,
            entries: Vec::new(),
            heads: HashMap::new(),
        }
    }

    pub fn id(&self) -> ClasspathId {
        self.id
    }

    pub fn policy(&self) -> TieringPolicy {
        self.policy
    }

    /// Number of distinct paths.
    pub fn len(&self) -> usize {
        self.heads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Ingests every non-directory record of the archive.
    ///
    /// Record paths are normalized (leading separators stripped, `\` becomes
    /// `/`) before they become lookup keys. A path that already has an entry
    /// gets a new chain head; nothing is overwritten. On error the call
    /// aborts, but records ingested before the failure stay: ingestion is
    /// not transactional.
    pub fn add_archive(&mut self, source: Arc<dyn ArchiveSource>) -> Result<()> {
        let mut buf = vec![0u8; self.policy.buffer_bytes];
        let mut records = 0usize;
        scan(source.as_ref(), |info, reader| {
            if info.is_directory {
                return Ok(ScanFlow::Continue);
            }
            let data = self.tier_payload(&source, info, reader, &mut buf)?;
            self.push_entry(&info.path, data);
            records += 1;
            Ok(ScanFlow::Continue)
        })?;
        tracing::debug!(
            target: "silo.classpath",
            archive = source.display_name(),
            records,
            paths = self.heads.len(),
            "ingested archive"
        );
        Ok(())
    }

    fn tier_payload(
        &self,
        source: &Arc<dyn ArchiveSource>,
        info: &RecordInfo,
        reader: &mut dyn Read,
        buf: &mut [u8],
    ) -> std::result::Result<EntryData, ArchiveError> {
        // A truthful size hint lets oversized payloads skip the buffer
        // entirely; a missing or lying hint only costs the buffered read
        // below.
        if info
            .size_hint
            .is_some_and(|size| size >= self.policy.buffer_bytes as u64)
        {
            return Ok(self.scan_entry(source, info));
        }

        match fill_buffer(reader, buf)? {
            Buffered::Complete(len) if len <= self.policy.inline_max => {
                Ok(EntryData::Inline(buf[..len].into()))
            }
            Buffered::Complete(len) => Ok(EntryData::Compressed {
                data: compress(&buf[..len])?,
                size: len as u64,
            }),
            Buffered::Overflow => Ok(self.scan_entry(source, info)),
        }
    }

    fn scan_entry(&self, source: &Arc<dyn ArchiveSource>, info: &RecordInfo) -> EntryData {
        tracing::debug!(
            target: "silo.classpath",
            archive = source.display_name(),
            path = info.path.as_str(),
            "payload exceeds read buffer, deferring to re-scan"
        );
        EntryData::Scan {
            source: Arc::clone(source),
            path: info.path.clone(),
        }
    }

    fn push_entry(&mut self, record_path: &str, data: EntryData) {
        let key = normalize_name(record_path).into_owned();
        let next = self.heads.get(&key).copied();
        let id = EntryId(self.entries.len() as u32);
        self.entries.push(EntryRecord { data, next });
        self.heads.insert(key, id);
    }

    /// Full payload bytes of the most recent entry for the path.
    pub fn bytes(&self, name: &str) -> Result<Cow<'_, [u8]>> {
        let key = normalize_name(name);
        match self.heads.get(key.as_ref()) {
            Some(id) => self.record(*id).data.bytes(),
            None => Err(ClasspathError::NotFound {
                path: key.into_owned(),
            }),
        }
    }

    /// Payload stream of the most recent entry for the path.
    pub fn stream(&self, name: &str) -> Result<ResourceStream<'_>> {
        let key = normalize_name(name);
        match self.heads.get(key.as_ref()) {
            Some(id) => self.record(*id).data.stream(),
            None => Err(ClasspathError::NotFound {
                path: key.into_owned(),
            }),
        }
    }

    /// Chain head for the path, for walking the duplicate history directly.
    pub fn entry(&self, name: &str) -> Option<ChainEntry<'_>> {
        let id = *self.heads.get(normalize_name(name).as_ref())?;
        Some(ChainEntry {
            classpath: self,
            id,
        })
    }

    /// Locator of the most recent entry for the path.
    pub fn locator(&self, name: &str) -> Option<ResourceLocator> {
        let key = normalize_name(name);
        self.heads
            .contains_key(key.as_ref())
            .then(|| ResourceLocator::new(self.id, key.into_owned(), 0))
    }

    /// Locators for every entry the path has, head to tail.
    ///
    /// Empty if the path was never ingested. Each locator resolves to the
    /// same bytes as walking the chain from [`Classpath::entry`] the same
    /// number of steps.
    pub fn enumerate(&self, name: &str) -> Vec<ResourceLocator> {
        let key = normalize_name(name);
        let mut locators = Vec::new();
        let mut cursor = self.heads.get(key.as_ref()).copied();
        while let Some(id) = cursor {
            locators.push(ResourceLocator::new(
                self.id,
                key.as_ref().to_owned(),
                locators.len() as u32,
            ));
            cursor = self.record(id).next;
        }
        locators
    }

    /// Resolves a locator issued by this classpath into a payload stream.
    ///
    /// Locators from other classpaths and ordinals beyond the current chain
    /// depth fail with [`ClasspathError::InvalidLocator`].
    pub fn resolve(&self, locator: &ResourceLocator) -> Result<ResourceStream<'_>> {
        if locator.classpath() != self.id {
            return Err(invalid_locator(locator));
        }
        // Locators carry normalized paths, no need to normalize again.
        let Some(mut id) = self.heads.get(locator.path()).copied() else {
            return Err(ClasspathError::NotFound {
                path: locator.path().to_owned(),
            });
        };
        for _ in 0..locator.ordinal() {
            id = self
                .record(id)
                .next
                .ok_or_else(|| invalid_locator(locator))?;
        }
        self.record(id).data.stream()
    }

    fn record(&self, id: EntryId) -> &EntryRecord {
        &self.entries[id.0 as usize]
    }
}

impl Default for Classpath {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Classpath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classpath")
            .field("id", &self.id)
            .field("paths", &self.heads.len())
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

fn invalid_locator(locator: &ResourceLocator) -> ClasspathError {
    ClasspathError::InvalidLocator {
        path: locator.path().to_owned(),
        ordinal: locator.ordinal(),
    }
}

/// One node of a path's duplicate chain.
#[derive(Clone, Copy)]
pub struct ChainEntry<'cp> {
    classpath: &'cp Classpath,
    id: EntryId,
}

impl<'cp> ChainEntry<'cp> {
    pub fn tier(&self) -> Tier {
        self.classpath.record(self.id).data.tier()
    }

    pub fn bytes(&self) -> Result<Cow<'cp, [u8]>> {
        self.classpath.record(self.id).data.bytes()
    }

    pub fn stream(&self) -> Result<ResourceStream<'cp>> {
        self.classpath.record(self.id).data.stream()
    }

    /// The entry this path had immediately before the current one was
    /// ingested, if any.
    pub fn next_entry(&self) -> Option<ChainEntry<'cp>> {
        let next = self.classpath.record(self.id).next?;
        Some(ChainEntry {
            classpath: self.classpath,
            id: next,
        })
    }
}

enum Buffered {
    /// The payload ended after this many bytes.
    Complete(usize),
    /// The payload filled the whole buffer (and may continue beyond it).
    Overflow,
}

fn fill_buffer(reader: &mut dyn Read, buf: &mut [u8]) -> std::io::Result<Buffered> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => return Ok(Buffered::Complete(filled)),
            n => filled += n,
        }
    }
    Ok(Buffered::Overflow)
}

fn normalize_name(name: &str) -> Cow<'_, str> {
    let trimmed = name.trim_start_matches(['/', '\\']);
    if trimmed.contains('\\') {
        Cow::Owned(trimmed.replace('\\', "/"))
    } else {
        Cow::Borrowed(trimmed)
    }
}
