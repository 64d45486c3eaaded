use std::fs;
use std::hash::Hasher;
use std::path::Path;

use blix_result::{Error, Result};
use rustc_hash::FxHasher;

/// Header bytes preceding the packed bit payload: u64 width + i32 probes.
const HEADER_LEN: usize = 12;

/// Fixed-width Bloom filter over byte-string values.
///
/// Design:
/// - `m_bits` is the number of bits in the filter (no power-of-two
///   requirement).
/// - Probe i hashes the value through a seeded FxHash64 pass (seed i
///   written before the value bytes), truncated to 32 bits and reduced
///   mod `m_bits`. Insert and lookup derive positions identically, so a
///   value that was inserted always reports present.
/// - Bits are packed little-endian: bit i lives in byte i/8 at position
///   i%8. Padding bits past `m_bits` in the last byte stay zero.
///
/// Filters of equal width can be unioned in place, which is how interior
/// index nodes summarise their children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilter {
    m_bits: u64,
    k_hashes: u32,
    bits: Vec<u8>,
}

impl BloomFilter {
    /// Create an empty filter of `m_bits` bits probed `k_hashes` times.
    pub fn new(m_bits: u64, k_hashes: u32) -> Result<Self> {
        if m_bits == 0 {
            return Err(Error::InvalidConfig(
                "bloom filter width must be non-zero".to_string(),
            ));
        }
        if k_hashes == 0 {
            return Err(Error::InvalidConfig(
                "bloom filter needs at least one hash probe".to_string(),
            ));
        }
        let byte_len = m_bits.div_ceil(8) as usize;
        Ok(Self {
            m_bits,
            k_hashes,
            bits: vec![0u8; byte_len],
        })
    }

    /// Number of bits in the filter.
    #[inline]
    pub fn m_bits(&self) -> u64 {
        self.m_bits
    }

    /// Number of hash probes per value.
    #[inline]
    pub fn k_hashes(&self) -> u32 {
        self.k_hashes
    }

    /// Serialized size in bytes: header plus packed payload.
    #[inline]
    pub fn serialized_len(&self) -> usize {
        HEADER_LEN + self.bits.len()
    }

    #[inline(always)]
    fn seeded_hash(seed: u32, value: &[u8]) -> u32 {
        let mut h = FxHasher::default();
        h.write_u32(seed);
        h.write(value);
        h.finish() as u32
    }

    #[inline(always)]
    fn probe_position(&self, seed: u32, value: &[u8]) -> u64 {
        (Self::seeded_hash(seed, value) as u64) % self.m_bits
    }

    #[inline(always)]
    fn index_of(bit: u64) -> (usize, u8) {
        ((bit >> 3) as usize, 1u8 << (bit & 7))
    }

    /// Set the probe bits for `value`.
    pub fn insert(&mut self, value: &[u8]) {
        for seed in 0..self.k_hashes {
            let (byte, mask) = Self::index_of(self.probe_position(seed, value));
            self.bits[byte] |= mask;
        }
    }

    /// Membership check; may return false positives, never false
    /// negatives.
    pub fn exists(&self, value: &[u8]) -> bool {
        for seed in 0..self.k_hashes {
            let (byte, mask) = Self::index_of(self.probe_position(seed, value));
            if self.bits[byte] & mask == 0 {
                return false;
            }
        }
        true
    }

    /// Bitwise-OR `other` into `self`.
    ///
    /// Widths must match; probe counts are expected to match because both
    /// filters come from the same tree configuration.
    pub fn union_in_place(&mut self, other: &BloomFilter) -> Result<()> {
        if self.m_bits != other.m_bits {
            return Err(Error::FilterSizeMismatch {
                expected: self.m_bits,
                actual: other.m_bits,
            });
        }
        debug_assert_eq!(self.k_hashes, other.k_hashes);
        for (dst, src) in self.bits.iter_mut().zip(&other.bits) {
            *dst |= src;
        }
        Ok(())
    }

    /// Encode as `m_bits` (u64 LE), `k_hashes` (i32 LE), then ⌈m/8⌉
    /// packed payload bytes with bit i stored at byte i/8, position i%8.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_len());
        out.extend_from_slice(&self.m_bits.to_le_bytes());
        out.extend_from_slice(&(self.k_hashes as i32).to_le_bytes());
        out.extend_from_slice(&self.bits);
        out
    }

    /// Decode a filter produced by [`BloomFilter::serialize`].
    ///
    /// Lenient on input: payload bits past `m_bits` are masked off rather
    /// than rejected, so any writer that left padding set still loads.
    /// Output from `serialize` is always canonical.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::Internal(format!(
                "bloom filter blob truncated: {} bytes",
                bytes.len()
            )));
        }
        let m_bits = u64::from_le_bytes(bytes[0..8].try_into().expect("sized slice"));
        let k_raw = i32::from_le_bytes(bytes[8..12].try_into().expect("sized slice"));
        if m_bits == 0 || k_raw <= 0 {
            return Err(Error::Internal(format!(
                "bloom filter header invalid: m={m_bits} k={k_raw}"
            )));
        }
        let byte_len = m_bits.div_ceil(8) as usize;
        let payload = &bytes[HEADER_LEN..];
        if payload.len() < byte_len {
            return Err(Error::Internal(format!(
                "bloom filter payload truncated: want {byte_len} bytes, got {}",
                payload.len()
            )));
        }
        let mut bits = payload[..byte_len].to_vec();
        let tail = (m_bits % 8) as u8;
        if tail != 0 {
            // Mask padding past m_bits so round-trips are byte-exact.
            let mask = (1u8 << tail) - 1;
            if let Some(last) = bits.last_mut() {
                *last &= mask;
            }
        }
        Ok(Self {
            m_bits,
            k_hashes: k_raw as u32,
            bits,
        })
    }

    /// Write the serialized filter to `path`, creating parent directories
    /// as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, self.serialize())?;
        Ok(())
    }

    /// Load a filter previously written with [`BloomFilter::save_to`].
    pub fn load_from(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::deserialize(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn make_in_set_values(n: usize, seed: u64) -> Vec<Vec<u8>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|i| {
                let len = rng.random_range(0..=32);
                let mut v = Vec::with_capacity(len + 1 + 8);
                for _ in 0..len {
                    v.push(b'a' + (rng.random::<u8>() % 26));
                }
                v.push(b'#');
                v.extend_from_slice(format!("{i:08x}").as_bytes());
                v
            })
            .collect()
    }

    fn make_out_set_values(n: usize, seed: u64) -> Vec<Vec<u8>> {
        let mut rng = StdRng::seed_from_u64(seed ^ 0xDEAD_BEEF);
        (0..n)
            .map(|i| {
                let len = rng.random_range(0..=32);
                let mut v = Vec::with_capacity(len + 1 + 8);
                for _ in 0..len {
                    v.push(b'0' + (rng.random::<u8>() % 10));
                }
                v.push(b'#');
                v.extend_from_slice(format!("{i:08x}").as_bytes());
                v
            })
            .collect()
    }

    #[test]
    fn inserted_values_are_maybe_present() {
        let values = make_in_set_values(10_000, 42);
        let mut bloom = BloomFilter::new(120_000, 7).unwrap();
        for v in &values {
            bloom.insert(v);
        }
        for v in &values {
            assert!(bloom.exists(v), "inserted value must be maybe-present");
        }
    }

    #[test]
    fn false_positive_rate_is_reasonable() {
        let n_in = 10_000usize;
        let n_out = 20_000usize;
        let values_in = make_in_set_values(n_in, 123);
        let values_out = make_out_set_values(n_out, 456);

        // 12 bits per value, k near optimum.
        let mut bloom = BloomFilter::new((n_in * 12) as u64, 7).unwrap();
        for v in &values_in {
            bloom.insert(v);
        }

        let fp = values_out.iter().filter(|v| bloom.exists(v)).count();
        let rate = fp as f64 / n_out as f64;
        assert!(
            rate < 0.015,
            "FP too high: {:.3}% (fp={}, n={})",
            rate * 100.0,
            fp,
            n_out
        );
    }

    #[test]
    fn zero_width_and_zero_probes_are_rejected() {
        assert!(matches!(
            BloomFilter::new(0, 7),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            BloomFilter::new(1024, 0),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn serialize_roundtrip_is_exact() {
        let values = make_in_set_values(2_000, 7);
        let mut bloom = BloomFilter::new(30_011, 5).unwrap();
        for v in &values {
            bloom.insert(v);
        }

        let bytes = bloom.serialize();
        assert_eq!(bytes.len(), bloom.serialized_len());
        let loaded = BloomFilter::deserialize(&bytes).unwrap();
        assert_eq!(loaded, bloom);
        assert_eq!(loaded.serialize(), bytes);
        for v in &values {
            assert!(loaded.exists(v));
        }
    }

    #[test]
    fn serialize_layout_is_little_endian() {
        let mut bloom = BloomFilter::new(16, 3).unwrap();
        bloom.insert(b"x");
        let bytes = bloom.serialize();
        assert_eq!(&bytes[0..8], &16u64.to_le_bytes());
        assert_eq!(&bytes[8..12], &3i32.to_le_bytes());
        assert_eq!(bytes.len(), 12 + 2);
    }

    #[test]
    fn deserialize_masks_padding_bits() {
        let bloom = BloomFilter::new(12, 2).unwrap();
        let mut bytes = bloom.serialize();
        // Dirty the padding above bit 12 in the last payload byte.
        *bytes.last_mut().unwrap() |= 0xF0;
        let loaded = BloomFilter::deserialize(&bytes).unwrap();
        assert_eq!(loaded, bloom);
    }

    #[test]
    fn deserialize_rejects_garbage() {
        assert!(BloomFilter::deserialize(&[0u8; 4]).is_err());
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&7i32.to_le_bytes());
        assert!(BloomFilter::deserialize(&bytes).is_err());
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1024u64.to_le_bytes());
        bytes.extend_from_slice(&7i32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]); // payload short of 128 bytes
        assert!(BloomFilter::deserialize(&bytes).is_err());
    }

    #[test]
    fn union_is_closed_over_membership() {
        let mut left = BloomFilter::new(4096, 4).unwrap();
        let mut right = BloomFilter::new(4096, 4).unwrap();
        left.insert(b"alpha");
        right.insert(b"beta");

        let mut parent = BloomFilter::new(4096, 4).unwrap();
        parent.union_in_place(&left).unwrap();
        parent.union_in_place(&right).unwrap();
        assert!(parent.exists(b"alpha"));
        assert!(parent.exists(b"beta"));
    }

    #[test]
    fn union_width_mismatch_fails() {
        let mut narrow = BloomFilter::new(1024, 4).unwrap();
        let wide = BloomFilter::new(2048, 4).unwrap();
        assert!(matches!(
            narrow.union_in_place(&wide),
            Err(Error::FilterSizeMismatch {
                expected: 1024,
                actual: 2048
            })
        ));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaves").join("f.bloom");

        let mut bloom = BloomFilter::new(8_192, 7).unwrap();
        for v in make_in_set_values(500, 9) {
            bloom.insert(&v);
        }
        bloom.save_to(&path).unwrap();
        let loaded = BloomFilter::load_from(&path).unwrap();
        assert_eq!(loaded, bloom);
    }
}
