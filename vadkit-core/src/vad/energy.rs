//! Band-limited energy estimate from a dB magnitude spectrum.
//!
//! ## Algorithm
//!
//! 1. `update`: convert every bin from dB to linear (`10^(db/10)`) and drop
//!    the cached energy.
//! 2. `energy`: on first read after an update, compute
//!    `Σ filter[i] · linear[i]²` and cache it; later reads in the same
//!    iteration return the cached value untouched.

use crate::error::{Result, VadError};

#[derive(Debug, Clone)]
pub struct EnergyEstimator {
    filter: Vec<f64>,
    linear: Vec<f64>,
    cached_energy: Option<f64>,
}

impl EnergyEstimator {
    /// Create an estimator for `filter.len()` bins. The linear spectrum
    /// starts out all zero.
    pub fn new(filter: Vec<f64>) -> Self {
        let linear = vec![0.0; filter.len()];
        Self {
            filter,
            linear,
            cached_energy: None,
        }
    }

    /// Replace the linear spectrum with `spectrum_db` converted to power.
    ///
    /// # Errors
    /// `VadError::SpectrumLength` if the bin count differs; nothing is
    /// modified in that case.
    pub fn update(&mut self, spectrum_db: &[f64]) -> Result<()> {
        if spectrum_db.len() != self.linear.len() {
            return Err(VadError::SpectrumLength {
                expected: self.linear.len(),
                actual: spectrum_db.len(),
            });
        }
        for (lin, &db) in self.linear.iter_mut().zip(spectrum_db) {
            *lin = 10f64.powf(db / 10.0);
        }
        self.cached_energy = None;
        Ok(())
    }

    /// Weighted energy of the current spectrum, memoized until the next
    /// `update`.
    pub fn energy(&mut self) -> f64 {
        if let Some(energy) = self.cached_energy {
            return energy;
        }
        let energy: f64 = self
            .filter
            .iter()
            .zip(&self.linear)
            .map(|(w, lin)| w * lin * lin)
            .sum();
        self.cached_energy = Some(energy);
        energy
    }

    /// Swap in a rebuilt filter of the same length.
    pub(crate) fn set_filter(&mut self, filter: Vec<f64>) {
        debug_assert_eq!(filter.len(), self.linear.len());
        self.filter = filter;
        self.cached_energy = None;
    }

    /// Energy memoized for the current spectrum, if it has been read.
    pub fn cached_energy(&self) -> Option<f64> {
        self.cached_energy
    }

    pub fn filter(&self) -> &[f64] {
        &self.filter
    }

    pub fn linear_spectrum(&self) -> &[f64] {
        &self.linear
    }

    pub fn bin_count(&self) -> usize {
        self.linear.len()
    }
}
