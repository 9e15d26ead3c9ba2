//! PCM buffering between the audio source and the detector.
//!
//! `HopWindow` keeps the most recent `fft_size` samples and tells the caller
//! when `hop_size` fresh samples have arrived, which is when a new spectrum
//! snapshot is due.

pub mod chunk;

use std::collections::VecDeque;

/// Sliding analysis window advanced in hops.
#[derive(Debug, Clone)]
pub struct HopWindow {
    window: VecDeque<f32>,
    window_len: usize,
    hop_len: usize,
    /// Samples received since the last completed hop.
    pending: usize,
    primed: bool,
}

impl HopWindow {
    pub fn new(window_len: usize, hop_len: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(window_len),
            window_len,
            hop_len,
            pending: 0,
            primed: false,
        }
    }

    /// Push one sample. Returns `true` when a new frame is ready.
    ///
    /// The first frame is ready once the window is full; after that, every
    /// `hop_len` samples.
    pub fn push(&mut self, sample: f32) -> bool {
        if self.window.len() == self.window_len {
            self.window.pop_front();
        }
        self.window.push_back(sample);
        self.pending += 1;

        if !self.primed {
            if self.window.len() == self.window_len {
                self.primed = true;
                self.pending = 0;
                return true;
            }
            return false;
        }
        if self.pending >= self.hop_len {
            self.pending = 0;
            return true;
        }
        false
    }

    /// Copy the current window (oldest first) into `out`.
    pub fn copy_to(&self, out: &mut [f32]) {
        for (dst, &src) in out.iter_mut().zip(self.window.iter()) {
            *dst = src;
        }
    }

    pub fn is_primed(&self) -> bool {
        self.primed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_after_window_fills_then_every_hop() {
        let mut w = HopWindow::new(4, 2);
        let ready: Vec<usize> = (0..10)
            .filter(|&i| w.push(i as f32))
            .collect();
        assert_eq!(ready, vec![3, 5, 7, 9]);
    }

    #[test]
    fn window_holds_latest_samples() {
        let mut w = HopWindow::new(3, 1);
        for i in 0..5 {
            w.push(i as f32);
        }
        let mut out = [0.0; 3];
        w.copy_to(&mut out);
        assert_eq!(out, [2.0, 3.0, 4.0]);
    }

    #[test]
    fn hop_longer_than_window_skips_samples() {
        let mut w = HopWindow::new(2, 5);
        let ready: Vec<usize> = (0..12).filter(|&i| w.push(i as f32)).collect();
        assert_eq!(ready, vec![1, 6, 11]);
    }
}
