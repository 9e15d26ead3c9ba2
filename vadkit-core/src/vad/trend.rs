//! Debounced speech/silence state machine.
//!
//! `voice_trend` is a bounded counter driven by a three-way decision per
//! iteration:
//!
//! ```text
//! signal >  threshold_pos   → trend + 1   (saturates at +10)
//! signal < -threshold_neg   → trend - 1   (saturates at -10)
//! otherwise                 → one step toward 0
//! ```
//!
//! `trend > +5` means "start", `trend < -5` means "end". Transitions are
//! edge-triggered against the current `Silence`/`Speech` state, so a flip
//! needs at least six consecutive same-direction iterations.

use super::VadDecision;

pub const TREND_MAX: i32 = 10;
pub const TREND_MIN: i32 = -10;
pub const TREND_START: i32 = 5;
pub const TREND_END: i32 = -5;

/// Per-iteration level flags derived from the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrendStep {
    pub start: bool,
    pub end: bool,
}

/// Edge between the two detector states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    SpeechStart,
    SpeechEnd,
}

#[derive(Debug, Clone, Default)]
pub struct TrendStateMachine {
    voice_trend: i32,
    is_speaking: bool,
}

impl TrendStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the trend one step for `signal` and report the start/end levels.
    pub fn step(&mut self, signal: f64, threshold_pos: f64, threshold_neg: f64) -> TrendStep {
        self.voice_trend = if signal > threshold_pos {
            (self.voice_trend + 1).min(TREND_MAX)
        } else if signal < -threshold_neg {
            (self.voice_trend - 1).max(TREND_MIN)
        } else {
            self.voice_trend - self.voice_trend.signum()
        };

        TrendStep {
            start: self.voice_trend > TREND_START,
            end: self.voice_trend < TREND_END,
        }
    }

    /// Apply the level flags to the speaking state, returning the edge if
    /// one occurred.
    pub fn transition(&mut self, step: TrendStep) -> Option<Transition> {
        if step.start && !self.is_speaking {
            self.is_speaking = true;
            return Some(Transition::SpeechStart);
        }
        if step.end && self.is_speaking {
            self.is_speaking = false;
            return Some(Transition::SpeechEnd);
        }
        None
    }

    pub fn voice_trend(&self) -> i32 {
        self.voice_trend
    }

    pub fn is_speaking(&self) -> bool {
        self.is_speaking
    }

    pub fn decision(&self) -> VadDecision {
        if self.is_speaking {
            VadDecision::Speech
        } else {
            VadDecision::Silence
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POS: f64 = 4.0;
    const NEG: f64 = 0.5;
    const LOUD: f64 = 10.0;
    const QUIET: f64 = -1.0;
    const AMBIGUOUS: f64 = 0.0;

    fn drive(sm: &mut TrendStateMachine, signal: f64) -> Option<Transition> {
        let step = sm.step(signal, POS, NEG);
        sm.transition(step)
    }

    #[test]
    fn sustained_speech_starts_on_sixth_iteration() {
        let mut sm = TrendStateMachine::new();
        let mut starts = Vec::new();
        for i in 1..=20 {
            if drive(&mut sm, LOUD) == Some(Transition::SpeechStart) {
                starts.push(i);
            }
            assert_eq!(sm.voice_trend(), i.min(TREND_MAX));
        }
        assert_eq!(starts, vec![6]);
        assert!(sm.is_speaking());
    }

    #[test]
    fn sustained_silence_ends_after_trend_drops_below_minus_five() {
        let mut sm = TrendStateMachine::new();
        for _ in 0..10 {
            drive(&mut sm, LOUD);
        }
        assert_eq!(sm.voice_trend(), 10);

        let mut ends = Vec::new();
        for i in 1..=30 {
            if drive(&mut sm, QUIET) == Some(Transition::SpeechEnd) {
                ends.push(i);
            }
            assert_eq!(sm.voice_trend(), (10 - i).max(TREND_MIN));
        }
        // 10 → -6 takes 16 iterations
        assert_eq!(ends, vec![16]);
        assert_eq!(sm.decision(), VadDecision::Silence);
    }

    #[test]
    fn ambiguous_signal_decays_toward_zero_without_overshoot() {
        let mut sm = TrendStateMachine::new();
        for _ in 0..3 {
            drive(&mut sm, LOUD);
        }
        let trace: Vec<i32> = (0..5)
            .map(|_| {
                drive(&mut sm, AMBIGUOUS);
                sm.voice_trend()
            })
            .collect();
        assert_eq!(trace, vec![2, 1, 0, 0, 0]);

        for _ in 0..2 {
            drive(&mut sm, QUIET);
        }
        assert_eq!(sm.voice_trend(), -2);
        drive(&mut sm, AMBIGUOUS);
        assert_eq!(sm.voice_trend(), -1);
    }

    #[test]
    fn short_burst_does_not_start_speech() {
        let mut sm = TrendStateMachine::new();
        for _ in 0..5 {
            assert_eq!(drive(&mut sm, LOUD), None);
        }
        // A gap decays the trend, so the next burst has to rebuild it.
        assert_eq!(drive(&mut sm, AMBIGUOUS), None);
        assert_eq!(drive(&mut sm, LOUD), None);
        assert!(!sm.is_speaking());
    }

    #[test]
    fn end_level_is_ignored_while_silent() {
        let mut sm = TrendStateMachine::new();
        for _ in 0..20 {
            assert_eq!(drive(&mut sm, QUIET), None);
        }
        assert_eq!(sm.voice_trend(), TREND_MIN);
    }

    #[test]
    fn step_reports_levels() {
        let mut sm = TrendStateMachine::new();
        let mut last = TrendStep::default();
        for _ in 0..6 {
            last = sm.step(LOUD, POS, NEG);
        }
        assert_eq!(last, TrendStep { start: true, end: false });
    }
}
