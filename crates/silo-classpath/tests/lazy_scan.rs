use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};

use silo_archive::{ArchiveSource, BytesArchive, FileArchive, SourceReader};
use silo_classpath::{Classpath, ClasspathError, Tier, TieringPolicy};
use zip::write::FileOptions;
use zip::ZipWriter;

fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, bytes) in entries {
        writer
            .start_file(*path, FileOptions::<()>::default())
            .unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 253) as u8).collect()
}

fn small_buffer_policy() -> TieringPolicy {
    TieringPolicy {
        inline_max: 8,
        buffer_bytes: 64,
    }
}

/// Archive whose backing bytes can be replaced between opens, standing in
/// for an archive that changed on disk behind the classpath's back.
struct SwappableArchive {
    name: String,
    bytes: Mutex<Arc<[u8]>>,
}

impl SwappableArchive {
    fn new(name: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_owned(),
            bytes: Mutex::new(bytes.into()),
        }
    }

    fn swap(&self, bytes: Vec<u8>) {
        *self.bytes.lock().unwrap() = bytes.into();
    }
}

impl ArchiveSource for SwappableArchive {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> io::Result<SourceReader> {
        Ok(SourceReader::new(Cursor::new(
            self.bytes.lock().unwrap().clone(),
        )))
    }
}

#[test]
fn scan_entries_re_read_their_archive_on_every_access() {
    let big = payload(200);
    let source = Arc::new(BytesArchive::new(
        "big.zip",
        zip_bytes(&[("big.bin", &big)]),
    ));

    let mut cp = Classpath::with_policy(small_buffer_policy());
    cp.add_archive(source).unwrap();

    assert_eq!(cp.entry("big.bin").unwrap().tier(), Tier::Scan);
    // Every access re-scans; results stay identical.
    assert_eq!(cp.bytes("big.bin").unwrap().as_ref(), &big[..]);
    assert_eq!(cp.bytes("big.bin").unwrap().as_ref(), &big[..]);

    let mut streamed = Vec::new();
    cp.stream("big.bin")
        .unwrap()
        .read_to_end(&mut streamed)
        .unwrap();
    assert_eq!(streamed, big);
}

#[test]
fn vanished_record_surfaces_as_not_found() {
    let big = payload(200);
    let source = Arc::new(SwappableArchive::new(
        "mutable.zip",
        zip_bytes(&[("big.bin", &big)]),
    ));

    let mut cp = Classpath::with_policy(small_buffer_policy());
    cp.add_archive(source.clone()).unwrap();
    assert_eq!(cp.bytes("big.bin").unwrap().as_ref(), &big[..]);

    source.swap(zip_bytes(&[("unrelated", b"x")]));

    let err = cp.bytes("big.bin").unwrap_err();
    assert!(matches!(err, ClasspathError::NotFound { .. }), "{err}");
    assert!(cp.stream("big.bin").is_err());
}

#[test]
fn replaced_record_serves_current_archive_content() {
    let before = payload(200);
    let after: Vec<u8> = payload(300);
    let source = Arc::new(SwappableArchive::new(
        "mutable.zip",
        zip_bytes(&[("big.bin", &before)]),
    ));

    let mut cp = Classpath::with_policy(small_buffer_policy());
    cp.add_archive(source.clone()).unwrap();
    assert_eq!(cp.bytes("big.bin").unwrap().as_ref(), &before[..]);

    source.swap(zip_bytes(&[("big.bin", &after)]));
    assert_eq!(cp.bytes("big.bin").unwrap().as_ref(), &after[..]);
}

#[test]
fn file_backed_scan_entries_survive_classpath_reads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dep.zip");
    let big = payload(500);
    std::fs::write(&path, zip_bytes(&[("lib/big.bin", &big)])).unwrap();

    let mut cp = Classpath::with_policy(small_buffer_policy());
    cp.add_archive(Arc::new(FileArchive::new(&path))).unwrap();

    assert_eq!(cp.entry("lib/big.bin").unwrap().tier(), Tier::Scan);
    assert_eq!(cp.bytes("lib/big.bin").unwrap().as_ref(), &big[..]);
}

#[test]
fn deleted_archive_file_is_an_archive_failure_not_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dep.zip");
    let big = payload(500);
    std::fs::write(&path, zip_bytes(&[("big.bin", &big)])).unwrap();

    let mut cp = Classpath::with_policy(small_buffer_policy());
    cp.add_archive(Arc::new(FileArchive::new(&path))).unwrap();
    std::fs::remove_file(&path).unwrap();

    let err = cp.bytes("big.bin").unwrap_err();
    assert!(matches!(err, ClasspathError::Archive(_)), "{err}");
}
