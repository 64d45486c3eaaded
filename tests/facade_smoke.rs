//! End-to-end smoke test through the facade surface only.

use blix::{
    IndexBuilder, IndexConfig, KeyRange, MemStore, MultiColumnEngine, SingleIndexProbe, WorkerPool,
};
use blix_test_utils::{fixture_key, fixture_value, populate_store_segmented};

#[test]
fn build_query_and_compare_strategies() {
    let dir = tempfile::tempdir().unwrap();
    let columns = ["phone", "mail"];
    let store = MemStore::open(dir.path(), &columns).unwrap();
    populate_store_segmented(&store, &columns, 400, 100).unwrap();

    let pool = WorkerPool::new().unwrap();
    let config = IndexConfig {
        partition_size: 50,
        filter_bits: 1024,
        hash_count: 7,
        branching: 4,
    };
    let builder = IndexBuilder::new(config, pool.clone()).unwrap();
    let trees = builder.build_for_columns(&store, &columns).unwrap();
    let tree_refs: Vec<_> = trees.iter().map(|(_, t)| t).collect();

    let values = vec![fixture_value("phone", 123), fixture_value("mail", 123)];

    let engine = MultiColumnEngine::new(&store, &pool);
    let multi = engine.query(&tree_refs, &values, &KeyRange::all()).unwrap();
    assert_eq!(multi.keys, vec![fixture_key(123)]);
    assert!(multi.telemetry.stats.bloom_probes > 0);

    let probe = SingleIndexProbe::new(&store, &pool);
    let single = probe.query(tree_refs[0], &columns, &values).unwrap();
    assert_eq!(single.keys, multi.keys);
}
