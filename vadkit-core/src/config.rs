//! Detector configuration.
//!
//! `VadOptions` is the loose options bag a host reads from JSON or builds in
//! code. It is turned into an immutable `VadConfig` exactly once, through
//! `VadConfig::try_from` (or `VadOptions::validate`). A `VadConfig` cannot be
//! built any other way, so every detector starts from validated values.
//!
//! ```
//! use vadkit_core::{VadConfig, VadOptions};
//!
//! let config = VadConfig::try_from(VadOptions {
//!     sample_rate: 16_000,
//!     fft_size: 256,
//!     hop_size: 160,
//!     ..VadOptions::default()
//! })
//! .unwrap();
//! assert_eq!(config.bin_count(), 128);
//! assert_eq!(config.clock().hertz_per_bin, 62.5);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, VadError};
use crate::vad::filter::FilterBand;

/// Construction-time options for a `SpectralVad`.
///
/// Field names match the JSON options file read by the host binary.
/// Missing fields fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VadOptions {
    /// Label carried by every emitted event.
    pub id: String,
    /// Initial noise-floor estimate. Default: `1e-8`.
    pub energy_offset: f64,
    /// Speech threshold as a multiple of the offset. Default: `4.0`.
    pub energy_threshold_ratio_pos: f64,
    /// Silence threshold as a multiple of the offset. Default: `0.5`.
    pub energy_threshold_ratio_neg: f64,
    /// Fraction of the signal folded into the offset per second, in [0, 1].
    /// Default: `0.5`.
    pub energy_integration: f64,
    /// Step-function breakpoints, ascending in frequency.
    pub filter: Vec<FilterBand>,
    /// Sample rate of the analysed audio (Hz). Default: `16000`.
    pub sample_rate: u32,
    /// FFT length in samples; the spectrum has `fft_size / 2` bins.
    pub fft_size: u32,
    /// Samples between successive spectrum snapshots.
    pub hop_size: u32,
}

impl Default for VadOptions {
    fn default() -> Self {
        Self {
            id: String::new(),
            energy_offset: 1e-8,
            energy_threshold_ratio_pos: 4.0,
            energy_threshold_ratio_neg: 0.5,
            energy_integration: 0.5,
            filter: vec![FilterBand::new(200.0, 0.0), FilterBand::new(1000.0, 1.0)],
            sample_rate: 16_000,
            fft_size: 512,
            hop_size: 512,
        }
    }
}

impl VadOptions {
    /// Validate and freeze these options.
    pub fn validate(self) -> Result<VadConfig> {
        VadConfig::try_from(self)
    }
}

/// Timing constants derived from sample rate, FFT size and hop size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IterationClock {
    /// Width of one spectrum bin.
    pub hertz_per_bin: f64,
    /// Spectrum snapshots per second.
    pub iteration_frequency: f64,
    /// Seconds between snapshots.
    pub iteration_period: f64,
}

/// Validated, immutable detector configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct VadConfig {
    id: String,
    energy_offset: f64,
    ratio_pos: f64,
    ratio_neg: f64,
    integration_rate: f64,
    filter: Vec<FilterBand>,
    sample_rate: u32,
    fft_size: u32,
    hop_size: u32,
}

impl TryFrom<VadOptions> for VadConfig {
    type Error = VadError;

    fn try_from(opts: VadOptions) -> Result<Self> {
        if opts.sample_rate == 0 {
            return Err(VadError::config("sample_rate", "must be greater than zero"));
        }
        if opts.fft_size == 0 || !opts.fft_size.is_power_of_two() {
            return Err(VadError::config(
                "fft_size",
                format!("{} is not a non-zero power of two", opts.fft_size),
            ));
        }
        if opts.hop_size == 0 {
            return Err(VadError::config("hop_size", "must be greater than zero"));
        }
        positive("energy_offset", opts.energy_offset)?;
        positive("energy_threshold_ratio_pos", opts.energy_threshold_ratio_pos)?;
        positive("energy_threshold_ratio_neg", opts.energy_threshold_ratio_neg)?;
        if !(0.0..=1.0).contains(&opts.energy_integration) {
            return Err(VadError::config(
                "energy_integration",
                format!("{} is outside [0, 1]", opts.energy_integration),
            ));
        }
        validate_filter(&opts.filter)?;

        Ok(Self {
            id: opts.id,
            energy_offset: opts.energy_offset,
            ratio_pos: opts.energy_threshold_ratio_pos,
            ratio_neg: opts.energy_threshold_ratio_neg,
            integration_rate: opts.energy_integration,
            filter: opts.filter,
            sample_rate: opts.sample_rate,
            fft_size: opts.fft_size,
            hop_size: opts.hop_size,
        })
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(VadError::config(field, format!("{value} must be finite and > 0")))
    }
}

/// Breakpoint order is the caller's business; only emptiness and
/// non-finite numbers are rejected.
pub(crate) fn validate_filter(bands: &[FilterBand]) -> Result<()> {
    if bands.is_empty() {
        return Err(VadError::EmptyFilter);
    }
    if let Some(band) = bands
        .iter()
        .find(|b| !b.frequency_hz.is_finite() || !b.weight.is_finite())
    {
        return Err(VadError::config(
            "filter",
            format!(
                "breakpoint ({}, {}) is not finite",
                band.frequency_hz, band.weight
            ),
        ));
    }
    Ok(())
}

impl VadConfig {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn energy_offset(&self) -> f64 {
        self.energy_offset
    }

    pub fn ratio_pos(&self) -> f64 {
        self.ratio_pos
    }

    pub fn ratio_neg(&self) -> f64 {
        self.ratio_neg
    }

    pub fn integration_rate(&self) -> f64 {
        self.integration_rate
    }

    /// Breakpoints the detector was constructed with.
    pub fn filter(&self) -> &[FilterBand] {
        &self.filter
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn fft_size(&self) -> u32 {
        self.fft_size
    }

    pub fn hop_size(&self) -> u32 {
        self.hop_size
    }

    /// Number of spectrum bins (`fft_size / 2`).
    pub fn bin_count(&self) -> usize {
        self.fft_size as usize / 2
    }

    pub fn clock(&self) -> IterationClock {
        let sample_rate = f64::from(self.sample_rate);
        let iteration_frequency = sample_rate / f64::from(self.hop_size);
        IterationClock {
            hertz_per_bin: sample_rate / f64::from(self.fft_size),
            iteration_frequency,
            iteration_period: 1.0 / iteration_frequency,
        }
    }

    /// Convert back into an options bag (e.g. to persist it).
    pub fn to_options(&self) -> VadOptions {
        VadOptions {
            id: self.id.clone(),
            energy_offset: self.energy_offset,
            energy_threshold_ratio_pos: self.ratio_pos,
            energy_threshold_ratio_neg: self.ratio_neg,
            energy_integration: self.integration_rate,
            filter: self.filter.clone(),
            sample_rate: self.sample_rate,
            fft_size: self.fft_size,
            hop_size: self.hop_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn options() -> VadOptions {
        VadOptions {
            sample_rate: 16_000,
            fft_size: 256,
            hop_size: 160,
            ..VadOptions::default()
        }
    }

    #[test]
    fn defaults_validate() {
        let config = VadOptions::default().validate().expect("defaults are valid");
        assert_eq!(config.bin_count(), 256);
        assert_eq!(config.filter().len(), 2);
    }

    #[test]
    fn clock_is_derived_from_rates() {
        let clock = options().validate().unwrap().clock();
        assert_relative_eq!(clock.hertz_per_bin, 62.5, epsilon = 1e-12);
        assert_relative_eq!(clock.iteration_frequency, 100.0, epsilon = 1e-12);
        assert_relative_eq!(clock.iteration_period, 0.01, epsilon = 1e-12);
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let err = VadOptions {
            sample_rate: 0,
            ..options()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, VadError::Config { field: "sample_rate", .. }));
        assert!(err.is_config());
    }

    #[test]
    fn rejects_non_power_of_two_fft() {
        for fft_size in [0, 3, 100, 257] {
            let err = VadOptions {
                fft_size,
                ..options()
            }
            .validate()
            .unwrap_err();
            assert!(
                matches!(err, VadError::Config { field: "fft_size", .. }),
                "fft_size={fft_size}"
            );
        }
    }

    #[test]
    fn rejects_zero_hop() {
        let err = VadOptions {
            hop_size: 0,
            ..options()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, VadError::Config { field: "hop_size", .. }));
    }

    #[test]
    fn rejects_empty_filter() {
        let err = VadOptions {
            filter: vec![],
            ..options()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, VadError::EmptyFilter));
    }

    #[test]
    fn rejects_non_positive_ratios_and_offset() {
        let bad = [
            VadOptions {
                energy_offset: 0.0,
                ..options()
            },
            VadOptions {
                energy_threshold_ratio_pos: -1.0,
                ..options()
            },
            VadOptions {
                energy_threshold_ratio_neg: f64::NAN,
                ..options()
            },
            VadOptions {
                energy_integration: 1.5,
                ..options()
            },
        ];
        for opts in bad {
            assert!(opts.validate().unwrap_err().is_config());
        }
    }

    #[test]
    fn unsorted_filter_is_accepted() {
        let config = VadOptions {
            filter: vec![FilterBand::new(4000.0, 1.0), FilterBand::new(300.0, 0.0)],
            ..options()
        }
        .validate();
        assert!(config.is_ok());
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let raw = r#"{
            "id": "mic",
            "fft_size": 1024,
            "filter": [{ "frequency_hz": 300.0, "weight": 0.0 }, { "frequency_hz": 3400.0, "weight": 1.0 }]
        }"#;
        let opts: VadOptions = serde_json::from_str(raw).expect("parse options");
        assert_eq!(opts.id, "mic");
        assert_eq!(opts.fft_size, 1024);
        assert_eq!(opts.sample_rate, 16_000);
        assert_eq!(opts.filter[1], FilterBand::new(3400.0, 1.0));
        assert_relative_eq!(opts.energy_integration, 0.5, epsilon = 1e-12);

        let config = opts.clone().validate().unwrap();
        assert_eq!(config.to_options(), opts);
    }
}
