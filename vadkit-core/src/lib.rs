//! # vadkit-core
//!
//! Spectral voice activity detection with an adaptive noise floor.
//!
//! ## Architecture
//!
//! ```text
//! PCM → StreamingVad ─► SpectrumAnalyzer (rustfft, dB) ─► SpectralVad
//!                                                             │
//!                         FilterVector · linear² ─► energy ─┤
//!                         energy − offset ───────► signal  ─┤
//!                         ±thresholds ─► voice_trend ───────┤
//!                                                             │
//!                                          EventSink::notify(VadEvent)
//! ```
//!
//! Callers that already have a dB spectrum drive `SpectralVad` directly,
//! one `process` call per snapshot.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod buffering;
pub mod config;
pub mod error;
pub mod events;
pub mod spectrum;
pub mod stream;
pub mod vad;

// Convenience re-exports for downstream crates
pub use buffering::chunk::AudioChunk;
pub use config::{IterationClock, VadConfig, VadOptions};
pub use error::{Result, VadError};
pub use events::{
    BroadcastSink, CallbackSink, ChannelSink, EventSink, MonitorReport, NullSink, TracingSink,
    VadEvent, VadEventKind,
};
pub use spectrum::SpectrumAnalyzer;
pub use stream::StreamingVad;
pub use vad::{
    DetectorState, FilterBand, SpectralVad, VadDecision, VadHandle, VoiceActivityDetector,
};
