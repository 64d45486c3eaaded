use blix_result::{Error, Result};
use blix_store::{KeyBytes, SegmentStore, ValueBytes};

/// Index-free reference answer: iterate every key of the first column's
/// segments and verify the remaining columns with point gets.
///
/// Linear in the store size; exists as ground truth for the indexed
/// strategies, not as a serving path.
pub fn full_scan_match(
    store: &dyn SegmentStore,
    columns: &[&str],
    values: &[ValueBytes],
) -> Result<Vec<KeyBytes>> {
    if columns.is_empty() || columns.len() != values.len() {
        return Err(Error::InvalidConfig(format!(
            "scanned {} columns against {} values",
            columns.len(),
            values.len()
        )));
    }

    let mut matches = Vec::new();
    for segment in store.enumerate_segments(columns[0])? {
        for (key, value) in store.iterate(&segment)? {
            if value != values[0] {
                continue;
            }
            let mut all_match = true;
            for (column, expected) in columns.iter().zip(values).skip(1) {
                match store.get(column, &key)? {
                    Some(actual) if actual == *expected => {}
                    _ => {
                        all_match = false;
                        break;
                    }
                }
            }
            if all_match {
                matches.push(key);
            }
        }
    }
    matches.sort_unstable();
    matches.dedup();
    Ok(matches)
}
