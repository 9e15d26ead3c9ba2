//! PCM-in streaming detector.
//!
//! ```text
//! AudioChunk ─► HopWindow ─(every hop)─► SpectrumAnalyzer ─► SpectralVad::process
//! ```
//!
//! The first iteration runs once `fft_size` samples have been seen; every
//! `hop_size` samples after that trigger one more.

use crate::{
    buffering::{chunk::AudioChunk, HopWindow},
    config::VadConfig,
    error::{Result, VadError},
    events::EventSink,
    spectrum::{SpectrumAnalyzer, DEFAULT_SMOOTHING},
    vad::{SpectralVad, VadDecision, VoiceActivityDetector},
};

pub struct StreamingVad {
    vad: SpectralVad,
    analyzer: SpectrumAnalyzer,
    window: HopWindow,
    frame: Vec<f32>,
    spectrum: Vec<f64>,
    iterations: u64,
}

impl StreamingVad {
    /// Streaming detector with the default analyser smoothing.
    pub fn new(config: VadConfig, sink: impl EventSink + 'static) -> Result<Self> {
        Self::with_smoothing(config, sink, DEFAULT_SMOOTHING)
    }

    /// # Errors
    /// `VadError::Config` if `smoothing` is outside `[0, 1)`.
    pub fn with_smoothing(
        config: VadConfig,
        sink: impl EventSink + 'static,
        smoothing: f64,
    ) -> Result<Self> {
        let fft_size = config.fft_size() as usize;
        let hop_size = config.hop_size() as usize;
        let analyzer = SpectrumAnalyzer::new(fft_size, smoothing)?;
        Ok(Self {
            spectrum: vec![0.0; analyzer.bin_count()],
            analyzer,
            window: HopWindow::new(fft_size, hop_size),
            frame: vec![0.0; fft_size],
            vad: SpectralVad::new(config, sink),
            iterations: 0,
        })
    }

    /// Feed a chunk, running one detector iteration per completed hop.
    /// Returns how many iterations ran.
    ///
    /// # Errors
    /// `VadError::SampleRateMismatch` if the chunk's rate differs from the
    /// configured one; nothing is consumed in that case.
    pub fn push(&mut self, chunk: &AudioChunk) -> Result<usize> {
        let expected = self.vad.config().sample_rate();
        if chunk.sample_rate != expected {
            return Err(VadError::SampleRateMismatch {
                expected,
                actual: chunk.sample_rate,
            });
        }

        let mut ran = 0;
        for &sample in &chunk.samples {
            if !self.window.push(sample) {
                continue;
            }
            self.window.copy_to(&mut self.frame);
            self.analyzer.analyze_into(&self.frame, &mut self.spectrum)?;
            self.vad.process(&self.spectrum)?;
            self.iterations += 1;
            ran += 1;
        }
        Ok(ran)
    }

    /// Iterations completed since construction.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Stream time (seconds) at the end of the last completed iteration.
    pub fn elapsed_secs(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        let config = self.vad.config();
        let samples = u64::from(config.fft_size())
            + (self.iterations - 1) * u64::from(config.hop_size());
        samples as f64 / f64::from(config.sample_rate())
    }

    pub fn detector(&self) -> &SpectralVad {
        &self.vad
    }

    pub fn detector_mut(&mut self) -> &mut SpectralVad {
        &mut self.vad
    }

    pub fn into_detector(self) -> SpectralVad {
        self.vad
    }
}

impl VoiceActivityDetector for StreamingVad {
    fn classify(&mut self, chunk: &AudioChunk) -> Result<VadDecision> {
        self.push(chunk)?;
        Ok(self.vad.decision())
    }
}
