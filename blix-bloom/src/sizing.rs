//! Sizing math for partition filters.
//!
//! The builder summarises `n` distinct values per leaf; these helpers pick
//! filter parameters for a target false-positive probability using
//! p = (1 - e^(-k*n/m))^k.

/// Expected false-positive probability of an `m_bits`-wide filter probed
/// `k_hashes` times after `n_items` distinct insertions.
pub fn false_positive_rate(m_bits: u64, k_hashes: u32, n_items: u64) -> f64 {
    if m_bits == 0 || k_hashes == 0 {
        return 1.0;
    }
    if n_items == 0 {
        return 0.0;
    }
    let k = k_hashes as f64;
    let exponent = -(k * n_items as f64) / m_bits as f64;
    (1.0 - exponent.exp()).powf(k)
}

/// Filter width achieving `target_fpp` for `n_items` values at the
/// optimal probe count: m = -n * ln p / ln^2 2.
pub fn bits_for(n_items: u64, target_fpp: f64) -> u64 {
    let p = target_fpp.clamp(f64::MIN_POSITIVE, 1.0);
    let ln2 = std::f64::consts::LN_2;
    let m = -(n_items as f64) * p.ln() / (ln2 * ln2);
    (m.ceil() as u64).max(8)
}

/// Probe count minimising the false-positive rate for a fixed width:
/// k = (m/n) * ln 2, clamped to [1, 16].
pub fn hashes_for(m_bits: u64, n_items: u64) -> u32 {
    if n_items == 0 {
        return 1;
    }
    let k = (m_bits as f64 / n_items as f64) * std::f64::consts::LN_2;
    (k.round() as i64).clamp(1, 16) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_matches_known_point() {
        // n = 1000, m = 10n, k = 7 sits just under 1%.
        let p = false_positive_rate(10_000, 7, 1_000);
        assert!(p > 0.0 && p < 0.01, "p = {p}");
    }

    #[test]
    fn rate_degenerate_inputs() {
        assert_eq!(false_positive_rate(0, 7, 100), 1.0);
        assert_eq!(false_positive_rate(1024, 0, 100), 1.0);
        assert_eq!(false_positive_rate(1024, 7, 0), 0.0);
    }

    #[test]
    fn sizing_closes_the_loop() {
        let n = 50_000;
        let m = bits_for(n, 0.01);
        let k = hashes_for(m, n);
        // ~9.6 bits per item and ~7 probes for 1%.
        assert!(m / n >= 9 && m / n <= 10, "m/n = {}", m / n);
        assert_eq!(k, 7);
        assert!(false_positive_rate(m, k, n) <= 0.011);
    }

    #[test]
    fn more_bits_never_hurt() {
        let tight = false_positive_rate(8_000, 7, 1_000);
        let roomy = false_positive_rate(16_000, 7, 1_000);
        assert!(roomy < tight);
    }
}
