use crate::types::KeyBytes;

/// Inclusive key range with optionally open ends.
///
/// `None` bounds mean unbounded on that side; a fully open range matches
/// every key. Bounds compare byte-lexicographically, the key order of the
/// underlying store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyRange {
    start: Option<KeyBytes>,
    end: Option<KeyBytes>,
}

impl KeyRange {
    /// The fully open range.
    pub fn all() -> Self {
        Self::default()
    }

    /// Range bounded inclusively on both sides.
    pub fn new(start: impl Into<KeyBytes>, end: impl Into<KeyBytes>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    /// Range from optional bounds; `None` is open on that side.
    pub fn from_bounds(start: Option<KeyBytes>, end: Option<KeyBytes>) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn start(&self) -> Option<&[u8]> {
        self.start.as_deref()
    }

    #[inline]
    pub fn end(&self) -> Option<&[u8]> {
        self.end.as_deref()
    }

    /// True iff `key` lies inside the range.
    pub fn contains(&self, key: &[u8]) -> bool {
        if let Some(s) = self.start.as_deref()
            && key < s
        {
            return false;
        }
        if let Some(e) = self.end.as_deref()
            && key > e
        {
            return false;
        }
        true
    }

    /// True iff the inclusive span `[lo, hi]` intersects the range.
    pub fn overlaps(&self, lo: &[u8], hi: &[u8]) -> bool {
        let below = match self.end.as_deref() {
            Some(e) => lo <= e,
            None => true,
        };
        let above = match self.start.as_deref() {
            Some(s) => hi >= s,
            None => true,
        };
        below && above
    }
}
