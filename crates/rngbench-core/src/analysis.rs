//! Statistical quality measurements over a generated byte buffer.
//!
//! Pure, deterministic, side-effect-free functions: chi-square uniformity,
//! Shannon entropy, the NIST frequency (monobit) test, byte-frequency range,
//! and lag-1 autocorrelation. [`analyze`] bundles them into one [`Analysis`]
//! snapshot. Every function handles the empty buffer without dividing by
//! zero.

use serde::Serialize;

/// Pass threshold for the monobit test p-value.
pub const MONOBIT_ALPHA: f64 = 0.01;

/// Lag-1 autocorrelation is computed over at most this many bytes so large
/// buffers stay cheap to analyze.
pub const AUTOCORR_SAMPLE_CAP: usize = 50_000;

/// Immutable snapshot of all measurements over one buffer.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Buffer length in bytes.
    pub length: usize,
    /// Mean byte value (127.5 expected for uniform bytes).
    pub mean: f64,
    /// Chi-square statistic over the 256 byte-value bins (~255 expected).
    pub chi_square: f64,
    /// Lowest per-byte-value frequency.
    pub min_freq: u64,
    /// Highest per-byte-value frequency.
    pub max_freq: u64,
    /// `max_freq - min_freq`.
    pub freq_range: u64,
    /// Shannon entropy in bits per byte (8.0 maximum).
    pub shannon_entropy: f64,
    /// NIST frequency (monobit) test p-value.
    pub monobit_p: f64,
    /// Whether `monobit_p >= 0.01`.
    pub monobit_pass: bool,
    /// Fraction of adjacent byte pairs that are exactly equal (~1/256
    /// expected; 1.0 for a constant buffer).
    pub autocorr_lag1: f64,
}

/// Run every measurement over one buffer.
pub fn analyze(data: &[u8]) -> Analysis {
    let histogram = byte_histogram(data);
    let (min_freq, max_freq) = if data.is_empty() {
        (0, 0)
    } else {
        let min = *histogram.iter().min().unwrap_or(&0);
        let max = *histogram.iter().max().unwrap_or(&0);
        (min, max)
    };

    let monobit_p = monobit_p_value(data);

    Analysis {
        length: data.len(),
        mean: mean(data),
        chi_square: chi_square(data),
        min_freq,
        max_freq,
        freq_range: max_freq - min_freq,
        shannon_entropy: shannon_entropy(data),
        monobit_p,
        monobit_pass: monobit_p >= MONOBIT_ALPHA,
        autocorr_lag1: autocorr_lag1(data),
    }
}

fn byte_histogram(data: &[u8]) -> [u64; 256] {
    let mut histogram = [0u64; 256];
    for &b in data {
        histogram[b as usize] += 1;
    }
    histogram
}

/// Mean byte value. Empty buffer yields 0.
pub fn mean(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().map(|&b| b as u64).sum::<u64>() as f64 / data.len() as f64
}

/// Chi-square statistic over byte-value frequencies vs. the uniform
/// expectation `len/256`. Empty buffer yields 0.
pub fn chi_square(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let expected = data.len() as f64 / 256.0;
    byte_histogram(data)
        .iter()
        .map(|&observed| {
            let diff = observed as f64 - expected;
            diff * diff / expected
        })
        .sum()
}

/// Shannon entropy in bits per byte (max 8.0). Empty buffer yields 0.
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let n = data.len() as f64;
    byte_histogram(data)
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / n;
            -p * p.log2()
        })
        .sum()
}

/// NIST frequency (monobit) test p-value: `erfc(|S| / sqrt(2n))` where `S`
/// sums +1 per one-bit and -1 per zero-bit. Empty buffer yields 0.
pub fn monobit_p_value(data: &[u8]) -> f64 {
    let n_bits = data.len() * 8;
    if n_bits == 0 {
        return 0.0;
    }
    let ones: u64 = data.iter().map(|&b| b.count_ones() as u64).sum();
    let s = 2.0 * ones as f64 - n_bits as f64;
    let s_obs = s.abs() / (n_bits as f64).sqrt();
    erfc(s_obs / std::f64::consts::SQRT_2)
}

/// Fraction of adjacent byte pairs that are exactly equal, over the first
/// [`AUTOCORR_SAMPLE_CAP`] bytes. Buffers shorter than two bytes yield 0.
pub fn autocorr_lag1(data: &[u8]) -> f64 {
    let window = &data[..data.len().min(AUTOCORR_SAMPLE_CAP)];
    if window.len() < 2 {
        return 0.0;
    }
    let equal_pairs = window.windows(2).filter(|pair| pair[0] == pair[1]).count();
    equal_pairs as f64 / (window.len() - 1) as f64
}

// ---------------------------------------------------------------------------
// Special functions
// ---------------------------------------------------------------------------

/// Complementary error function via the Abramowitz & Stegun 7.1.26 rational
/// approximation (max absolute error ~1.5e-7, ample for a 0.01 threshold).
fn erfc(x: f64) -> f64 {
    if x < 0.0 {
        return 2.0 - erfc(-x);
    }
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    poly * (-x * x).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lcg_data(n: usize, seed: u64) -> Vec<u8> {
        let mut data = Vec::with_capacity(n);
        let mut state = seed;
        for _ in 0..n {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            data.push((state >> 33) as u8);
        }
        data
    }

    #[test]
    fn empty_buffer_is_safe_everywhere() {
        let a = analyze(&[]);
        assert_eq!(a.length, 0);
        assert_eq!(a.mean, 0.0);
        assert_eq!(a.chi_square, 0.0);
        assert_eq!(a.shannon_entropy, 0.0);
        assert_eq!(a.autocorr_lag1, 0.0);
        assert_eq!(a.freq_range, 0);
        assert!(!a.monobit_pass);
    }

    #[test]
    fn constant_buffer_entropy_zero_autocorr_one() {
        let data = vec![0x5A; 1000];
        let a = analyze(&data);
        assert_eq!(a.shannon_entropy, 0.0);
        assert_eq!(a.autocorr_lag1, 1.0);
        assert_eq!(a.mean, 0x5A as f64);
        assert_eq!(a.min_freq, 0);
        assert_eq!(a.max_freq, 1000);
    }

    #[test]
    fn perfect_uniform_block_is_flat() {
        let data: Vec<u8> = (0..=255u8).collect();
        let a = analyze(&data);
        assert_eq!(a.chi_square, 0.0);
        assert_eq!(a.shannon_entropy, 8.0);
        assert_eq!(a.freq_range, 0);
    }

    #[test]
    fn monobit_balanced_bits_pass() {
        // Alternating all-zero/all-one bytes: S is exactly 0, p = erfc(0) = 1.
        let data: Vec<u8> = (0..1000).map(|i| if i % 2 == 0 { 0x00 } else { 0xFF }).collect();
        let p = monobit_p_value(&data);
        assert!((p - 1.0).abs() < 1e-6);
        assert!(p >= MONOBIT_ALPHA);
    }

    #[test]
    fn monobit_all_zero_fails() {
        let data = vec![0u8; 1000];
        let p = monobit_p_value(&data);
        assert!(p < MONOBIT_ALPHA);
    }

    #[test]
    fn monobit_random_data_passes() {
        let data = lcg_data(100_000, 0xdeadbeef);
        assert!(monobit_p_value(&data) >= MONOBIT_ALPHA);
    }

    #[test]
    fn random_data_statistics_look_uniform() {
        let data = lcg_data(100_000, 0xcafebabe);
        let a = analyze(&data);
        assert!((a.mean - 127.5).abs() < 2.0);
        assert!(a.shannon_entropy > 7.9);
        // 255 degrees of freedom, expectation ~255: very wide acceptance band.
        assert!(a.chi_square > 100.0 && a.chi_square < 500.0);
        // Expected equal-pair rate is 1/256.
        assert!(a.autocorr_lag1 < 0.02);
    }

    #[test]
    fn autocorr_window_is_capped() {
        // All-equal tail beyond the cap must not influence the result.
        let mut data = lcg_data(AUTOCORR_SAMPLE_CAP, 1);
        let capped = autocorr_lag1(&data);
        data.extend(std::iter::repeat(7u8).take(AUTOCORR_SAMPLE_CAP));
        assert_eq!(autocorr_lag1(&data), capped);
    }

    #[test]
    fn erfc_reference_points() {
        assert!((erfc(0.0) - 1.0).abs() < 1e-7);
        assert!((erfc(1.0) - 0.157_299_2).abs() < 1e-6);
        assert!((erfc(2.0) - 0.004_677_7).abs() < 1e-6);
        assert!((erfc(-1.0) - 1.842_700_8).abs() < 1e-6);
    }
}
