use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use silo_archive::BytesArchive;
use silo_classpath::{Classpath, ClasspathError, ResourceLocator};
use zip::write::FileOptions;
use zip::ZipWriter;

fn archive(name: &str, entries: &[(&str, &[u8])]) -> Arc<BytesArchive> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, bytes) in entries {
        writer
            .start_file(*path, FileOptions::<()>::default())
            .unwrap();
        writer.write_all(bytes).unwrap();
    }
    Arc::new(BytesArchive::new(name, writer.finish().unwrap().into_inner()))
}

fn resolve_to_bytes(cp: &Classpath, locator: &ResourceLocator) -> Vec<u8> {
    let mut out = Vec::new();
    cp.resolve(locator).unwrap().read_to_end(&mut out).unwrap();
    out
}

fn chained_classpath() -> Classpath {
    let mut cp = Classpath::new();
    cp.add_archive(archive("a.zip", &[("x", b"content-a")])).unwrap();
    cp.add_archive(archive("b.zip", &[("x", b"content-b")])).unwrap();
    cp.add_archive(archive("c.zip", &[("x", b"content-c")])).unwrap();
    cp
}

#[test]
fn direct_lookup_answers_from_the_most_recent_archive() {
    let cp = chained_classpath();
    assert_eq!(cp.bytes("x").unwrap().as_ref(), b"content-c");
}

#[test]
fn enumerate_yields_most_recent_first() {
    let cp = chained_classpath();
    let locators = cp.enumerate("x");
    assert_eq!(locators.len(), 3);

    let resolved: Vec<Vec<u8>> = locators
        .iter()
        .map(|locator| resolve_to_bytes(&cp, locator))
        .collect();
    assert_eq!(resolved, vec![b"content-c".to_vec(), b"content-b".to_vec(), b"content-a".to_vec()]);

    for (ordinal, locator) in locators.iter().enumerate() {
        assert_eq!(locator.ordinal() as usize, ordinal);
        assert_eq!(locator.path(), "x");
        assert_eq!(locator.classpath(), cp.id());
    }
}

#[test]
fn enumerate_of_absent_path_is_empty() {
    let cp = chained_classpath();
    assert!(cp.enumerate("absent").is_empty());
}

#[test]
fn enumerate_is_restartable() {
    let cp = chained_classpath();
    let locators = cp.enumerate("x");
    // Resolving twice from the same sequence yields the same bytes.
    assert_eq!(
        resolve_to_bytes(&cp, &locators[1]),
        resolve_to_bytes(&cp, &locators[1])
    );
}

#[test]
fn locators_agree_with_chain_walking() {
    let cp = chained_classpath();
    let locators = cp.enumerate("x");

    let mut entry = cp.entry("x");
    for locator in &locators {
        let node = entry.expect("chain shorter than enumeration");
        assert_eq!(
            resolve_to_bytes(&cp, locator),
            node.bytes().unwrap().into_owned()
        );
        entry = node.next_entry();
    }
    assert!(entry.is_none(), "enumeration shorter than chain");
}

#[test]
fn duplicates_within_one_archive_are_chained_in_record_order() {
    let mut cp = Classpath::new();
    cp.add_archive(archive(
        "dup.zip",
        &[("dup", b"older"), ("other", b"x"), ("dup", b"newer")],
    ))
    .unwrap();

    assert_eq!(cp.bytes("dup").unwrap().as_ref(), b"newer");
    let locators = cp.enumerate("dup");
    assert_eq!(locators.len(), 2);
    assert_eq!(resolve_to_bytes(&cp, &locators[1]), b"older");
}

#[test]
fn foreign_locators_are_rejected() {
    let cp = chained_classpath();
    let other = chained_classpath();

    let locator = &cp.enumerate("x")[0];
    let err = other.resolve(locator).unwrap_err();
    assert!(matches!(err, ClasspathError::InvalidLocator { .. }), "{err}");
}

#[test]
fn out_of_range_ordinals_are_rejected() {
    let cp = chained_classpath();
    let locator = &cp.enumerate("x")[0];

    // Locators are serde values; forge an ordinal past the chain depth.
    let mut value = serde_json::to_value(locator).unwrap();
    value["ordinal"] = 99.into();
    let forged: ResourceLocator = serde_json::from_value(value).unwrap();

    let err = cp.resolve(&forged).unwrap_err();
    assert!(matches!(err, ClasspathError::InvalidLocator { .. }), "{err}");
}

#[test]
fn locator_survives_serde_round_trip() {
    let cp = chained_classpath();
    let locator = &cp.enumerate("x")[1];

    let json = serde_json::to_string(locator).unwrap();
    let restored: ResourceLocator = serde_json::from_str(&json).unwrap();
    assert_eq!(&restored, locator);
    assert_eq!(resolve_to_bytes(&cp, &restored), b"content-b");
}
