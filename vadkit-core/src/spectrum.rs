//! dB magnitude spectrum front-end.
//!
//! ## Per-frame pipeline
//!
//! | Stage | Detail |
//! |-------|--------|
//! | Window | Blackman (α = 0.16), `fft_size` samples |
//! | FFT | rustfft forward, complex, `fft_size` points |
//! | Magnitude | `|X[k]| / fft_size` for `k < fft_size / 2` |
//! | Smoothing | `τ · prev[k] + (1 − τ) · mag[k]` |
//! | Scale | `20 · log10(smoothed)` dB |
//!
//! This matches a Web Audio analyser node, so options tuned against a
//! browser analyser carry over. Digital silence yields `-inf` dB.

use std::sync::Arc;

use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::{Result, VadError};

/// Default smoothing between successive frames.
pub const DEFAULT_SMOOTHING: f64 = 0.8;

pub struct SpectrumAnalyzer {
    fft_size: usize,
    smoothing: f64,
    window: Vec<f64>,
    fft: Arc<dyn rustfft::Fft<f64>>,
    fft_buf: Vec<Complex<f64>>,
    smoothed: Vec<f64>,
}

impl SpectrumAnalyzer {
    /// # Errors
    /// `VadError::Config` if `fft_size` is not a power of two ≥ 2 or
    /// `smoothing` is outside `[0, 1)`.
    pub fn new(fft_size: usize, smoothing: f64) -> Result<Self> {
        if fft_size < 2 || !fft_size.is_power_of_two() {
            return Err(VadError::config(
                "fft_size",
                format!("{fft_size} is not a power of two >= 2"),
            ));
        }
        if !(0.0..1.0).contains(&smoothing) {
            return Err(VadError::config(
                "smoothing",
                format!("{smoothing} is outside [0, 1)"),
            ));
        }

        Ok(Self {
            fft_size,
            smoothing,
            window: build_blackman_window(fft_size),
            fft: FftPlanner::<f64>::new().plan_fft_forward(fft_size),
            fft_buf: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
        })
    }

    /// Analyse one frame of exactly `fft_size` samples, writing
    /// `fft_size / 2` dB values into `out`.
    ///
    /// # Errors
    /// `VadError::SpectrumLength` if either slice has the wrong length.
    pub fn analyze_into(&mut self, frame: &[f32], out: &mut [f64]) -> Result<()> {
        if frame.len() != self.fft_size {
            return Err(VadError::SpectrumLength {
                expected: self.fft_size,
                actual: frame.len(),
            });
        }
        if out.len() != self.bin_count() {
            return Err(VadError::SpectrumLength {
                expected: self.bin_count(),
                actual: out.len(),
            });
        }

        for ((slot, &s), &w) in self.fft_buf.iter_mut().zip(frame).zip(&self.window) {
            *slot = Complex::new(f64::from(s) * w, 0.0);
        }
        self.fft.process(&mut self.fft_buf);

        let scale = 1.0 / self.fft_size as f64;
        let tau = self.smoothing;
        for ((db, prev), bin) in out.iter_mut().zip(self.smoothed.iter_mut()).zip(&self.fft_buf) {
            let magnitude = bin.norm() * scale;
            *prev = tau * *prev + (1.0 - tau) * magnitude;
            *db = 20.0 * prev.log10();
        }
        Ok(())
    }

    /// Allocating variant of `analyze_into`.
    pub fn analyze(&mut self, frame: &[f32]) -> Result<Vec<f64>> {
        let mut out = vec![0.0; self.bin_count()];
        self.analyze_into(frame, &mut out)?;
        Ok(out)
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }
}

fn build_blackman_window(n: usize) -> Vec<f64> {
    use std::f64::consts::PI;
    const ALPHA: f64 = 0.16;
    let a0 = 0.5 * (1.0 - ALPHA);
    let a1 = 0.5;
    let a2 = 0.5 * ALPHA;
    (0..n)
        .map(|i| {
            let x = i as f64 / n as f64;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}
