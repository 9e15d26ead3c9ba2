//! Adaptive noise-floor tracking.
//!
//! The offset is a leaky integrator over the signal (`energy - offset`).
//! Both thresholds are always derived from the offset and never stored
//! independently of it.

/// Once silence is confirmed, a falling offset settles this many times
/// faster than the configured integration rate.
pub const FAST_SETTLE_FACTOR: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct AdaptiveBaseline {
    energy_offset: f64,
    threshold_pos: f64,
    threshold_neg: f64,
    ratio_pos: f64,
    ratio_neg: f64,
    integration_rate: f64,
}

impl AdaptiveBaseline {
    pub fn new(energy_offset: f64, ratio_pos: f64, ratio_neg: f64, integration_rate: f64) -> Self {
        let mut baseline = Self {
            energy_offset: energy_offset.max(0.0),
            threshold_pos: 0.0,
            threshold_neg: 0.0,
            ratio_pos,
            ratio_neg,
            integration_rate,
        };
        baseline.recompute_thresholds();
        baseline
    }

    /// Distance of `energy` from the current noise floor.
    pub fn signal(&self, energy: f64) -> f64 {
        energy - self.energy_offset
    }

    /// Fold `signal` into the offset over `elapsed_secs` and refresh the
    /// thresholds. Returns the nominal integration step.
    ///
    /// A negative step is amplified by `FAST_SETTLE_FACTOR` when
    /// `confirmed_silence` is set. The offset never drops below zero. A
    /// non-finite step (NaN or infinite energy) leaves offset and thresholds
    /// untouched.
    pub fn adapt(&mut self, signal: f64, elapsed_secs: f64, confirmed_silence: bool) -> f64 {
        let integration = signal * elapsed_secs * self.integration_rate;
        if !integration.is_finite() {
            return integration;
        }
        if integration > 0.0 || !confirmed_silence {
            self.energy_offset += integration;
        } else {
            self.energy_offset += integration * FAST_SETTLE_FACTOR;
        }
        self.energy_offset = self.energy_offset.max(0.0);
        self.recompute_thresholds();
        integration
    }

    fn recompute_thresholds(&mut self) {
        self.threshold_pos = self.energy_offset * self.ratio_pos;
        self.threshold_neg = self.energy_offset * self.ratio_neg;
    }

    pub fn energy_offset(&self) -> f64 {
        self.energy_offset
    }

    pub fn threshold_pos(&self) -> f64 {
        self.threshold_pos
    }

    pub fn threshold_neg(&self) -> f64 {
        self.threshold_neg
    }
}
