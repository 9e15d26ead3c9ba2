//! Spectral voice activity detection.
//!
//! ```text
//! dB spectrum ─► EnergyEstimator ─► AdaptiveBaseline ─► TrendStateMachine ─► EventSink
//!                (filter · lin²)    (signal, offset)    (±5 / ±10 bands)
//! ```
//!
//! `SpectralVad` wires the stages together and is driven by one
//! `update` + `monitor` pair per spectrum snapshot. `StreamingVad`
//! (in `crate::stream`) puts a PCM front-end in front of it and implements
//! the `VoiceActivityDetector` trait.

pub mod baseline;
pub mod detector;
pub mod energy;
pub mod filter;
pub mod trend;

pub use detector::{DetectorState, SpectralVad, VadHandle};
pub use filter::FilterBand;

use crate::buffering::chunk::AudioChunk;
use crate::error::Result;

/// Whether the detector currently classifies the stream as speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadDecision {
    Speech,
    Silence,
}

impl VadDecision {
    pub fn is_speech(self) -> bool {
        self == VadDecision::Speech
    }
}

/// Detectors that consume raw PCM.
///
/// There is no `reset`: a detector's adaptive state only ever moves
/// forward. Build a new one to start over.
pub trait VoiceActivityDetector: Send + 'static {
    /// Feed a chunk and return the classification after the last iteration
    /// it completed.
    ///
    /// # Errors
    /// Implementations reject chunks they cannot interpret (e.g. a sample
    /// rate other than the configured one) without changing state.
    fn classify(&mut self, chunk: &AudioChunk) -> Result<VadDecision>;
}
