//! Spectral weighting filter.
//!
//! Breakpoints split the spectrum into constant-weight bands. A bin takes
//! the weight of the first breakpoint (in the given order) whose frequency
//! lies strictly above the bin's frequency; bins above every breakpoint get
//! weight 0. This is a step function, there is no interpolation.
//!
//! ```text
//! breakpoints: (200 Hz, 0) (1000 Hz, 1)
//!
//!   0 Hz ── 200 Hz ───────── 1000 Hz ──────── nyquist
//!   weight 0 │    weight 1      │    weight 0
//! ```

use serde::{Deserialize, Serialize};

/// One filter breakpoint: everything below `frequency_hz` not claimed by an
/// earlier breakpoint is weighted by `weight`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterBand {
    pub frequency_hz: f64,
    pub weight: f64,
}

impl FilterBand {
    pub const fn new(frequency_hz: f64, weight: f64) -> Self {
        Self {
            frequency_hz,
            weight,
        }
    }
}

/// Build a per-bin weight vector of length `bin_count`.
///
/// Breakpoints are scanned in the order given. Out-of-order input is not
/// sorted and simply produces a discontinuous step function.
pub fn build_filter(bands: &[FilterBand], bin_count: usize, hertz_per_bin: f64) -> Vec<f64> {
    (0..bin_count)
        .map(|bin| {
            let bin_frequency = bin as f64 * hertz_per_bin;
            bands
                .iter()
                .find(|band| bin_frequency < band.frequency_hz)
                .map_or(0.0, |band| band.weight)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn speech_band_filter_at_16k_256() {
        let bands = [FilterBand::new(200.0, 0.0), FilterBand::new(1000.0, 1.0)];
        let filter = build_filter(&bands, 128, 62.5);

        assert_eq!(filter.len(), 128);
        // bins 0..=3 sit below 200 Hz
        assert!(filter[..4].iter().all(|&w| w == 0.0));
        // 250 Hz ..= 937.5 Hz
        assert!(filter[4..16].iter().all(|&w| w == 1.0));
        // 1000 Hz is not strictly below the last breakpoint
        assert!(filter[16..].iter().all(|&w| w == 0.0));
    }

    #[test]
    fn breakpoint_frequency_is_exclusive() {
        let bands = [FilterBand::new(100.0, 2.0)];
        let filter = build_filter(&bands, 4, 50.0);
        assert_eq!(filter, vec![2.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn out_of_order_breakpoints_shadow_later_ones() {
        // The first breakpoint already covers everything below 4 kHz, so the
        // 300 Hz band never wins.
        let bands = [FilterBand::new(4000.0, 1.0), FilterBand::new(300.0, 0.5)];
        let filter = build_filter(&bands, 8, 1000.0);
        assert_eq!(filter, vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn zero_bins_yield_empty_filter() {
        let bands = [FilterBand::new(100.0, 1.0)];
        assert!(build_filter(&bands, 0, 10.0).is_empty());
    }

    #[test]
    fn random_specs_only_use_configured_weights() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let n = rng.gen_range(1..8);
            let mut bands: Vec<FilterBand> = (0..n)
                .map(|_| FilterBand::new(rng.gen_range(0.0..24_000.0), rng.gen_range(-2.0..2.0)))
                .collect();
            bands.sort_by(|a, b| a.frequency_hz.total_cmp(&b.frequency_hz));

            let fft_size = 1usize << rng.gen_range(1..12);
            let bin_count = fft_size / 2;
            let hertz_per_bin = 48_000.0 / fft_size as f64;
            let filter = build_filter(&bands, bin_count, hertz_per_bin);

            assert_eq!(filter.len(), bin_count);
            for w in filter {
                assert!(
                    w == 0.0 || bands.iter().any(|b| b.weight == w),
                    "unexpected weight {w}"
                );
            }
        }
    }
}
