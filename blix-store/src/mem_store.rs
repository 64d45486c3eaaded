use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use blix_result::{Error, Result};
use rustc_hash::FxHashMap;

use crate::key_range::KeyRange;
use crate::traits::SegmentStore;
use crate::types::{KeyBytes, SegmentPath, ValueBytes};

/// In-memory sorted-segment store used for tests and benchmarks.
///
/// Rows live in a per-column memtable until [`MemStore::flush`] seals
/// them into an immutable sorted segment. Segments carry real filesystem
/// paths under the store root so index code can persist leaf filters next
/// to them; the segment payload itself is also mirrored to that path in a
/// simple length-prefixed framing, but all reads are served from memory.
///
/// Point gets consult the memtable first, then sealed segments newest to
/// oldest, so a re-written key resolves to its latest value.
pub struct MemStore {
    root: PathBuf,
    inner: RwLock<Inner>,
}

struct Inner {
    open: bool,
    columns: FxHashMap<String, ColumnState>,
    by_path: FxHashMap<SegmentPath, Arc<Vec<(KeyBytes, ValueBytes)>>>,
}

#[derive(Default)]
struct ColumnState {
    memtable: BTreeMap<KeyBytes, ValueBytes>,
    // Seal order; `seq` increases monotonically per column.
    segments: Vec<SealedSegment>,
    next_seq: u64,
}

struct SealedSegment {
    path: SegmentPath,
    seq: u64,
    entries: Arc<Vec<(KeyBytes, ValueBytes)>>,
}

/// Owning forward iterator over one sealed segment.
struct SegmentIter {
    entries: Arc<Vec<(KeyBytes, ValueBytes)>>,
    pos: usize,
}

impl Iterator for SegmentIter {
    type Item = (KeyBytes, ValueBytes);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.entries.get(self.pos).cloned();
        self.pos += 1;
        item
    }
}

impl MemStore {
    /// Open a store rooted at `root` with the given attribute columns.
    /// Creates one directory per column so sealed segments (and any
    /// sidecar files an index writes beside them) have a home.
    pub fn open(root: impl AsRef<Path>, columns: &[&str]) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut states = FxHashMap::default();
        for column in columns {
            fs::create_dir_all(root.join(column))?;
            states.insert((*column).to_string(), ColumnState::default());
        }
        Ok(Self {
            root,
            inner: RwLock::new(Inner {
                open: true,
                columns: states,
                by_path: FxHashMap::default(),
            }),
        })
    }

    /// Close the store. Idempotent; subsequent reads fail.
    pub fn close(&self) {
        let mut inner = self.write_inner();
        inner.open = false;
    }

    /// Append `entries` into `column`'s memtable. Later writes to the
    /// same key shadow earlier ones.
    pub fn put_batch<I>(&self, column: &str, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (KeyBytes, ValueBytes)>,
    {
        let mut inner = self.write_inner();
        inner.ensure_open()?;
        let state = inner.column_mut(column)?;
        for (key, value) in entries {
            state.memtable.insert(key, value);
        }
        Ok(())
    }

    /// Seal `column`'s memtable into a new immutable sorted segment.
    /// No-op on an empty memtable.
    pub fn flush(&self, column: &str) -> Result<Option<SegmentPath>> {
        let mut inner = self.write_inner();
        inner.ensure_open()?;
        let root = self.root.clone();
        let state = inner.column_mut(column)?;
        if state.memtable.is_empty() {
            return Ok(None);
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        let entries: Vec<(KeyBytes, ValueBytes)> =
            std::mem::take(&mut state.memtable).into_iter().collect();
        let path = segment_path(&root, column, seq);
        write_segment_file(Path::new(&path), &entries)?;

        let entries = Arc::new(entries);
        state.segments.push(SealedSegment {
            path: path.clone(),
            seq,
            entries: Arc::clone(&entries),
        });
        inner.by_path.insert(path.clone(), entries);
        tracing::debug!("sealed segment {path}");
        Ok(Some(path))
    }

    /// Flush every column with pending rows.
    pub fn flush_all(&self) -> Result<()> {
        let columns: Vec<String> = {
            let inner = self.read_inner();
            inner.columns.keys().cloned().collect()
        };
        for column in columns {
            self.flush(&column)?;
        }
        Ok(())
    }

    /// Merge all of `column`'s sealed segments into one, newest value
    /// winning per key. Pending memtable rows are flushed first.
    pub fn compact(&self, column: &str) -> Result<Option<SegmentPath>> {
        self.flush(column)?;

        let mut inner = self.write_inner();
        inner.ensure_open()?;
        let root = self.root.clone();
        let state = inner.column_mut(column)?;
        if state.segments.len() <= 1 {
            return Ok(state.segments.first().map(|s| s.path.clone()));
        }

        let mut merged: BTreeMap<KeyBytes, ValueBytes> = BTreeMap::new();
        state.segments.sort_by_key(|s| s.seq);
        for segment in &state.segments {
            for (key, value) in segment.entries.iter() {
                merged.insert(key.clone(), value.clone());
            }
        }

        let old: Vec<SegmentPath> = state.segments.drain(..).map(|s| s.path).collect();
        let seq = state.next_seq;
        state.next_seq += 1;
        let entries: Vec<(KeyBytes, ValueBytes)> = merged.into_iter().collect();
        let path = segment_path(&root, column, seq);
        write_segment_file(Path::new(&path), &entries)?;

        let entries = Arc::new(entries);
        state.segments.push(SealedSegment {
            path: path.clone(),
            seq,
            entries: Arc::clone(&entries),
        });
        inner.by_path.insert(path.clone(), entries);
        for stale in old {
            inner.by_path.remove(&stale);
            let _ = fs::remove_file(&stale);
        }
        tracing::debug!("compacted column into {path}");
        Ok(Some(path))
    }

    fn read_inner(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().expect("MemStore lock poisoned")
    }

    fn write_inner(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().expect("MemStore lock poisoned")
    }
}

impl Inner {
    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(Error::Lifecycle("store is closed".to_string()))
        }
    }

    fn column(&self, column: &str) -> Result<&ColumnState> {
        self.columns
            .get(column)
            .ok_or_else(|| Error::NotFound(format!("column '{column}'")))
    }

    fn column_mut(&mut self, column: &str) -> Result<&mut ColumnState> {
        self.columns
            .get_mut(column)
            .ok_or_else(|| Error::NotFound(format!("column '{column}'")))
    }

    fn segment(&self, segment: &str) -> Result<Arc<Vec<(KeyBytes, ValueBytes)>>> {
        self.by_path
            .get(segment)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("segment '{segment}'")))
    }
}

impl SegmentStore for MemStore {
    fn enumerate_segments(&self, column: &str) -> Result<Vec<SegmentPath>> {
        let inner = self.read_inner();
        inner.ensure_open()?;
        let state = inner.column(column)?;
        let mut ordered: Vec<(&KeyBytes, &SegmentPath)> = state
            .segments
            .iter()
            .filter_map(|s| s.entries.first().map(|(k, _)| (k, &s.path)))
            .collect();
        ordered.sort();
        Ok(ordered.into_iter().map(|(_, p)| p.clone()).collect())
    }

    fn iterate(
        &self,
        segment: &str,
    ) -> Result<Box<dyn Iterator<Item = (KeyBytes, ValueBytes)> + Send>> {
        let inner = self.read_inner();
        inner.ensure_open()?;
        let entries = inner.segment(segment)?;
        Ok(Box::new(SegmentIter { entries, pos: 0 }))
    }

    fn scan_segment_for_value(
        &self,
        segment: &str,
        value: &[u8],
        range: &KeyRange,
    ) -> Result<Vec<KeyBytes>> {
        let inner = self.read_inner();
        inner.ensure_open()?;
        let entries = inner.segment(segment)?;

        let from = match range.start() {
            Some(s) => entries.partition_point(|(k, _)| k.as_slice() < s),
            None => 0,
        };
        let mut matches = Vec::new();
        for (key, stored) in &entries[from..] {
            if let Some(e) = range.end()
                && key.as_slice() > e
            {
                break;
            }
            if stored.as_slice() == value {
                matches.push(key.clone());
            }
        }
        Ok(matches)
    }

    fn get(&self, column: &str, key: &[u8]) -> Result<Option<ValueBytes>> {
        let inner = self.read_inner();
        inner.ensure_open()?;
        let state = inner.column(column)?;
        if let Some(value) = state.memtable.get(key) {
            return Ok(Some(value.clone()));
        }
        let mut newest_first: Vec<&SealedSegment> = state.segments.iter().collect();
        newest_first.sort_by(|a, b| b.seq.cmp(&a.seq));
        for segment in newest_first {
            if let Ok(i) = segment
                .entries
                .binary_search_by(|(k, _)| k.as_slice().cmp(key))
            {
                return Ok(Some(segment.entries[i].1.clone()));
            }
        }
        Ok(None)
    }
}

fn segment_path(root: &Path, column: &str, seq: u64) -> SegmentPath {
    root.join(column)
        .join(format!("segment-{seq:06}.seg"))
        .to_string_lossy()
        .into_owned()
}

/// Mirror sealed entries to disk: u32-LE key length, key bytes, u32-LE
/// value length, value bytes, repeated.
fn write_segment_file(path: &Path, entries: &[(KeyBytes, ValueBytes)]) -> Result<()> {
    let mut file = fs::File::create(path)?;
    let mut buf = Vec::new();
    for (key, value) in entries {
        buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
        buf.extend_from_slice(value);
    }
    file.write_all(&buf)?;
    Ok(())
}
