use blix_result::Error;
use blix_store::{KeyRange, MemStore, SegmentStore};

fn kv(k: &str, v: &str) -> (Vec<u8>, Vec<u8>) {
    (k.as_bytes().to_vec(), v.as_bytes().to_vec())
}

#[test]
fn flush_seals_sorted_segments_in_key_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemStore::open(dir.path(), &["mail"]).unwrap();

    store
        .put_batch("mail", vec![kv("c", "3"), kv("a", "1"), kv("b", "2")])
        .unwrap();
    let first = store.flush("mail").unwrap().expect("sealed");
    store
        .put_batch("mail", vec![kv("e", "5"), kv("d", "4")])
        .unwrap();
    let second = store.flush("mail").unwrap().expect("sealed");

    let segments = store.enumerate_segments("mail").unwrap();
    assert_eq!(segments, vec![first.clone(), second]);

    let pairs: Vec<(Vec<u8>, Vec<u8>)> = store.iterate(&first).unwrap().collect();
    assert_eq!(pairs, vec![kv("a", "1"), kv("b", "2"), kv("c", "3")]);

    // Empty memtable flush is a no-op.
    assert!(store.flush("mail").unwrap().is_none());
}

#[test]
fn segment_files_exist_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemStore::open(dir.path(), &["phone"]).unwrap();
    store.put_batch("phone", vec![kv("k1", "v1")]).unwrap();
    let path = store.flush("phone").unwrap().expect("sealed");
    assert!(std::path::Path::new(&path).is_file());
}

#[test]
fn scan_respects_inclusive_range_and_open_ends() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemStore::open(dir.path(), &["mail"]).unwrap();
    store
        .put_batch(
            "mail",
            vec![kv("a", "x"), kv("b", "y"), kv("c", "x"), kv("d", "x")],
        )
        .unwrap();
    let seg = store.flush("mail").unwrap().expect("sealed");

    let keys = store
        .scan_segment_for_value(&seg, b"x", &KeyRange::all())
        .unwrap();
    assert_eq!(keys, vec![b"a".to_vec(), b"c".to_vec(), b"d".to_vec()]);

    let keys = store
        .scan_segment_for_value(&seg, b"x", &KeyRange::new(b"b".to_vec(), b"c".to_vec()))
        .unwrap();
    assert_eq!(keys, vec![b"c".to_vec()]);

    let keys = store
        .scan_segment_for_value(
            &seg,
            b"x",
            &KeyRange::from_bounds(Some(b"c".to_vec()), None),
        )
        .unwrap();
    assert_eq!(keys, vec![b"c".to_vec(), b"d".to_vec()]);
}

#[test]
fn get_prefers_memtable_then_newest_segment() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemStore::open(dir.path(), &["mail"]).unwrap();

    store.put_batch("mail", vec![kv("k", "old")]).unwrap();
    store.flush("mail").unwrap();
    store.put_batch("mail", vec![kv("k", "newer")]).unwrap();
    store.flush("mail").unwrap();
    assert_eq!(store.get("mail", b"k").unwrap(), Some(b"newer".to_vec()));

    store.put_batch("mail", vec![kv("k", "newest")]).unwrap();
    assert_eq!(store.get("mail", b"k").unwrap(), Some(b"newest".to_vec()));
    assert_eq!(store.get("mail", b"absent").unwrap(), None);
}

#[test]
fn compact_collapses_to_one_segment_newest_wins() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemStore::open(dir.path(), &["mail"]).unwrap();

    store
        .put_batch("mail", vec![kv("a", "1"), kv("b", "1")])
        .unwrap();
    store.flush("mail").unwrap();
    store
        .put_batch("mail", vec![kv("b", "2"), kv("c", "2")])
        .unwrap();
    store.flush("mail").unwrap();

    let merged = store.compact("mail").unwrap().expect("merged");
    assert_eq!(store.enumerate_segments("mail").unwrap(), vec![merged.clone()]);

    let pairs: Vec<(Vec<u8>, Vec<u8>)> = store.iterate(&merged).unwrap().collect();
    assert_eq!(pairs, vec![kv("a", "1"), kv("b", "2"), kv("c", "2")]);
}

#[test]
fn unknown_column_and_segment_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemStore::open(dir.path(), &["mail"]).unwrap();
    assert!(matches!(
        store.enumerate_segments("nope"),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(store.iterate("nope.seg"), Err(Error::NotFound(_))));
}

#[test]
fn close_is_idempotent_and_blocks_reads() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemStore::open(dir.path(), &["mail"]).unwrap();
    store.close();
    store.close();
    assert!(matches!(
        store.get("mail", b"k"),
        Err(Error::Lifecycle(_))
    ));
}
