//! `SpectralVad`, the adaptive-threshold hysteresis detector.
//!
//! ## Per-iteration contract
//!
//! ```text
//! update(spectrum_db)   dB → linear, energy cache cleared
//! monitor()             energy → signal → trend step → offset adaptation
//!                       → edge-triggered transition → events
//! ```
//!
//! `process` runs both halves. A spectrum of the wrong length is rejected by
//! `update` before any state changes.
//!
//! ## Threading
//!
//! `SpectralVad` is single-owner and fully synchronous. To share it, wrap it
//! in a `VadHandle`, which locks around the whole `update` + `monitor` pair.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use super::{
    baseline::AdaptiveBaseline,
    energy::EnergyEstimator,
    filter::{build_filter, FilterBand},
    trend::{Transition, TrendStateMachine},
    VadDecision,
};
use crate::{
    config::{validate_filter, IterationClock, VadConfig, VadOptions},
    error::Result,
    events::{EventSink, MonitorReport, NullSink, VadEvent, VadEventKind},
};

/// Serializable snapshot of the detector's mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorState {
    pub energy_offset: f64,
    pub threshold_pos: f64,
    pub threshold_neg: f64,
    pub voice_trend: i32,
    pub is_speaking: bool,
    pub cached_energy: Option<f64>,
}

pub struct SpectralVad {
    config: VadConfig,
    clock: IterationClock,
    bands: Vec<FilterBand>,
    estimator: EnergyEstimator,
    baseline: AdaptiveBaseline,
    trend: TrendStateMachine,
    sink: Box<dyn EventSink>,
}

impl SpectralVad {
    /// Build a detector from a validated configuration.
    pub fn new(config: VadConfig, sink: impl EventSink + 'static) -> Self {
        let clock = config.clock();
        let bands = config.filter().to_vec();
        let filter = build_filter(&bands, config.bin_count(), clock.hertz_per_bin);
        let baseline = AdaptiveBaseline::new(
            config.energy_offset(),
            config.ratio_pos(),
            config.ratio_neg(),
            config.integration_rate(),
        );

        info!(
            id = config.id(),
            sample_rate = config.sample_rate(),
            hertz_per_bin = clock.hertz_per_bin,
            iteration_frequency = clock.iteration_frequency,
            iteration_period = clock.iteration_period,
            "spectral VAD ready"
        );

        Self {
            config,
            clock,
            bands,
            estimator: EnergyEstimator::new(filter),
            baseline,
            trend: TrendStateMachine::new(),
            sink: Box::new(sink),
        }
    }

    /// Validate `options` and build a detector that discards its events.
    ///
    /// # Errors
    /// Any configuration error from `VadConfig::try_from`.
    pub fn from_options(options: VadOptions) -> Result<Self> {
        Ok(Self::new(options.validate()?, NullSink))
    }

    /// Replace the event sink.
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Load a new dB spectrum snapshot (`fft_size / 2` bins).
    ///
    /// # Errors
    /// `VadError::SpectrumLength` on a bin-count mismatch; the detector is
    /// left untouched.
    pub fn update(&mut self, spectrum_db: &[f64]) -> Result<()> {
        self.estimator.update(spectrum_db)
    }

    /// Weighted energy of the current snapshot, memoized per iteration.
    pub fn energy(&mut self) -> f64 {
        self.estimator.energy()
    }

    /// Run one detection step over the current snapshot using the fixed
    /// iteration period. Returns `energy - offset` as seen before
    /// adaptation.
    pub fn monitor(&mut self) -> f64 {
        self.monitor_secs(self.clock.iteration_period)
    }

    /// Like `monitor`, but integrates over the actual time since the
    /// previous step. Useful when the caller drops or delays snapshots.
    pub fn monitor_elapsed(&mut self, elapsed: Duration) -> f64 {
        self.monitor_secs(elapsed.as_secs_f64())
    }

    /// `update` followed by `monitor`.
    pub fn process(&mut self, spectrum_db: &[f64]) -> Result<f64> {
        self.update(spectrum_db)?;
        Ok(self.monitor())
    }

    fn monitor_secs(&mut self, elapsed_secs: f64) -> f64 {
        let energy = self.estimator.energy();
        let signal = self.baseline.signal(energy);

        let step = self.trend.step(
            signal,
            self.baseline.threshold_pos(),
            self.baseline.threshold_neg(),
        );
        let integration = self.baseline.adapt(signal, elapsed_secs, step.end);
        let transition = self.trend.transition(step);

        self.sink.observe(&MonitorReport {
            energy,
            signal,
            integration,
            energy_offset: self.baseline.energy_offset(),
            threshold_pos: self.baseline.threshold_pos(),
            threshold_neg: self.baseline.threshold_neg(),
            voice_trend: self.trend.voice_trend(),
            start: step.start,
            end: step.end,
        });

        if let Some(transition) = transition {
            let kind = match transition {
                Transition::SpeechStart => VadEventKind::SpeechStart,
                Transition::SpeechEnd => VadEventKind::SpeechEnd,
            };
            debug!(
                id = self.config.id(),
                voice_trend = self.trend.voice_trend(),
                energy_offset = self.baseline.energy_offset(),
                "{}",
                kind.as_str()
            );
            self.emit(kind);
        }
        self.emit(VadEventKind::EnergyUpdate);

        signal
    }

    fn emit(&mut self, kind: VadEventKind) {
        let event = VadEvent {
            kind,
            detector_id: self.config.id().to_owned(),
            voice_trend: self.trend.voice_trend(),
        };
        self.sink.notify(&event);
    }

    /// Rebuild the weighting filter from new breakpoints.
    ///
    /// # Errors
    /// `VadError::EmptyFilter` (or a non-finite breakpoint); the current
    /// filter stays in place.
    pub fn set_filter(&mut self, bands: Vec<FilterBand>) -> Result<()> {
        validate_filter(&bands)?;
        let filter = build_filter(&bands, self.config.bin_count(), self.clock.hertz_per_bin);
        debug!(id = self.config.id(), breakpoints = bands.len(), "filter replaced");
        self.estimator.set_filter(filter);
        self.bands = bands;
        Ok(())
    }

    pub fn id(&self) -> &str {
        self.config.id()
    }

    pub fn config(&self) -> &VadConfig {
        &self.config
    }

    pub fn clock(&self) -> IterationClock {
        self.clock
    }

    /// Breakpoints the current filter was built from.
    pub fn filter_bands(&self) -> &[FilterBand] {
        &self.bands
    }

    /// Per-bin weights.
    pub fn filter(&self) -> &[f64] {
        self.estimator.filter()
    }

    pub fn linear_spectrum(&self) -> &[f64] {
        self.estimator.linear_spectrum()
    }

    pub fn is_speaking(&self) -> bool {
        self.trend.is_speaking()
    }

    pub fn decision(&self) -> VadDecision {
        self.trend.decision()
    }

    pub fn voice_trend(&self) -> i32 {
        self.trend.voice_trend()
    }

    pub fn energy_offset(&self) -> f64 {
        self.baseline.energy_offset()
    }

    pub fn threshold_pos(&self) -> f64 {
        self.baseline.threshold_pos()
    }

    pub fn threshold_neg(&self) -> f64 {
        self.baseline.threshold_neg()
    }

    pub fn state(&self) -> DetectorState {
        DetectorState {
            energy_offset: self.baseline.energy_offset(),
            threshold_pos: self.baseline.threshold_pos(),
            threshold_neg: self.baseline.threshold_neg(),
            voice_trend: self.trend.voice_trend(),
            is_speaking: self.trend.is_speaking(),
            cached_energy: self.estimator.cached_energy(),
        }
    }
}

impl std::fmt::Debug for SpectralVad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralVad")
            .field("id", &self.config.id())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Thread-safe handle to a `SpectralVad`.
///
/// Every call takes the lock once, so an `update` + `monitor` pair can never
/// interleave with another thread's.
#[derive(Clone)]
pub struct VadHandle(Arc<Mutex<SpectralVad>>);

impl VadHandle {
    pub fn new(vad: SpectralVad) -> Self {
        Self(Arc::new(Mutex::new(vad)))
    }

    /// `update` + `monitor` under one lock.
    pub fn process(&self, spectrum_db: &[f64]) -> Result<f64> {
        self.0.lock().process(spectrum_db)
    }

    pub fn state(&self) -> DetectorState {
        self.0.lock().state()
    }

    pub fn is_speaking(&self) -> bool {
        self.0.lock().is_speaking()
    }
}

impl std::fmt::Debug for VadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VadHandle").finish_non_exhaustive()
    }
}
