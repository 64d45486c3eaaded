//! Shared helpers for blix test binaries: tracing setup and the dense
//! row fixture used by the integration suites.

use std::sync::Once;

use blix_result::Result;
use blix_store::MemStore;

static INIT: Once = Once::new();

/// Initialize tracing for test binaries. Safe to call multiple times.
pub fn init_tracing_for_tests() {
    INIT.call_once(|| {
        use tracing_subscriber::filter::EnvFilter;
        use tracing_subscriber::fmt;
        let env = std::env::var("RUST_LOG").ok();
        let filter = match env {
            Some(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            None => EnvFilter::new("info"),
        };
        fmt().with_env_filter(filter).with_target(false).init();
    });
}

#[cfg(feature = "auto-init")]
mod auto {
    // Use ctor to run at binary init time to avoid having to call init in every test.
    use ctor::ctor;

    #[ctor]
    fn init() {
        super::init_tracing_for_tests();
    }
}

/// Row key of the dense fixture: `"key"` followed by the decimal row
/// number left-padded with zeros to 20 digits, so keys sort in row order.
pub fn fixture_key(i: usize) -> Vec<u8> {
    format!("key{i:020}").into_bytes()
}

/// Column value of the dense fixture: `"<column>_value<i>"`, unique per
/// row and column.
pub fn fixture_value(column: &str, i: usize) -> Vec<u8> {
    format!("{column}_value{i}").into_bytes()
}

/// Insert rows 1..=n into every column and seal one segment per column.
pub fn populate_store(store: &MemStore, columns: &[&str], n: usize) -> Result<()> {
    populate_store_segmented(store, columns, n, n)
}

/// Insert rows 1..=n into every column, sealing a segment after every
/// `rows_per_segment` rows so each column ends up with
/// ⌈n / rows_per_segment⌉ segments in key order.
pub fn populate_store_segmented(
    store: &MemStore,
    columns: &[&str],
    n: usize,
    rows_per_segment: usize,
) -> Result<()> {
    let rows_per_segment = rows_per_segment.max(1);
    for column in columns {
        let mut pending = Vec::with_capacity(rows_per_segment);
        for i in 1..=n {
            pending.push((fixture_key(i), fixture_value(column, i)));
            if pending.len() == rows_per_segment {
                store.put_batch(column, pending.drain(..).collect::<Vec<_>>())?;
                store.flush(column)?;
            }
        }
        if !pending.is_empty() {
            store.put_batch(column, pending)?;
            store.flush(column)?;
        }
    }
    Ok(())
}
