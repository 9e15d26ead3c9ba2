//! Detector events and the sinks that receive them.
//!
//! The detector never delivers events itself; it calls an injected
//! `EventSink`. Per monitor step the sink sees, in order:
//!
//! 1. `observe(report)` with the iteration's diagnostic values
//! 2. `notify(speech_start)` or `notify(speech_end)` if a transition occurred
//! 3. `notify(energy_update)`
//!
//! | Sink | Transport |
//! |------|-----------|
//! | `NullSink` | discards everything |
//! | `CallbackSink` | closure |
//! | `ChannelSink` | `crossbeam_channel::Sender<VadEvent>` |
//! | `BroadcastSink` | `tokio::sync::broadcast::Sender<VadEvent>` |
//! | `TracingSink` | `tracing` events |

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Kind of a detector event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VadEventKind {
    /// Silence → Speech.
    SpeechStart,
    /// Speech → Silence.
    SpeechEnd,
    /// Emitted every iteration, transition or not.
    EnergyUpdate,
}

impl VadEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SpeechStart => "speech_start",
            Self::SpeechEnd => "speech_end",
            Self::EnergyUpdate => "energy_update",
        }
    }

    pub fn is_transition(self) -> bool {
        !matches!(self, Self::EnergyUpdate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VadEvent {
    pub kind: VadEventKind,
    pub detector_id: String,
    /// Trend counter in [-10, 10] after this iteration.
    pub voice_trend: i32,
}

/// Diagnostic values of one monitor step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorReport {
    pub energy: f64,
    pub signal: f64,
    pub integration: f64,
    /// Offset and thresholds after adaptation.
    pub energy_offset: f64,
    pub threshold_pos: f64,
    pub threshold_neg: f64,
    pub voice_trend: i32,
    pub start: bool,
    pub end: bool,
}

/// Receiver of detector output.
pub trait EventSink: Send {
    fn notify(&mut self, event: &VadEvent);

    /// Per-iteration diagnostics. Ignored unless a sink opts in.
    fn observe(&mut self, _report: &MonitorReport) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&mut self, _event: &VadEvent) {}
}

/// Forwards events to a closure.
pub struct CallbackSink<F>(pub F);

impl<F> EventSink for CallbackSink<F>
where
    F: FnMut(&VadEvent) + Send,
{
    fn notify(&mut self, event: &VadEvent) {
        (self.0)(event)
    }
}

/// Sends cloned events over a crossbeam channel.
///
/// A dropped receiver is not an error; events are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: crossbeam_channel::Sender<VadEvent>,
    transitions_only: bool,
}

impl ChannelSink {
    pub fn new(tx: crossbeam_channel::Sender<VadEvent>) -> Self {
        Self {
            tx,
            transitions_only: false,
        }
    }

    /// Create an unbounded channel and return the sink with its receiver.
    pub fn unbounded() -> (Self, crossbeam_channel::Receiver<VadEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self::new(tx), rx)
    }

    /// Skip `energy_update` telemetry.
    pub fn transitions_only(mut self) -> Self {
        self.transitions_only = true;
        self
    }
}

impl EventSink for ChannelSink {
    fn notify(&mut self, event: &VadEvent) {
        if self.transitions_only && !event.kind.is_transition() {
            return;
        }
        let _ = self.tx.send(event.clone());
    }
}

/// Publishes events on a tokio broadcast channel for async consumers.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<VadEvent>,
}

impl BroadcastSink {
    pub fn new(tx: broadcast::Sender<VadEvent>) -> Self {
        Self { tx }
    }

    /// Create a channel with `capacity` buffered events per subscriber.
    pub fn channel(capacity: usize) -> (Self, broadcast::Receiver<VadEvent>) {
        let (tx, rx) = broadcast::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VadEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn notify(&mut self, event: &VadEvent) {
        // No subscribers: the event is dropped.
        let _ = self.tx.send(event.clone());
    }
}

/// Logs transitions at `debug` and per-iteration values at `trace`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn notify(&mut self, event: &VadEvent) {
        if event.kind.is_transition() {
            debug!(
                id = %event.detector_id,
                voice_trend = event.voice_trend,
                "{}",
                event.kind.as_str()
            );
        }
    }

    fn observe(&mut self, r: &MonitorReport) {
        trace!(
            energy = r.energy,
            energy_offset = r.energy_offset,
            threshold_pos = r.threshold_pos,
            threshold_neg = r.threshold_neg,
            signal = r.signal,
            integration = r.integration,
            voice_trend = r.voice_trend,
            start = r.start,
            end = r.end,
            "monitor"
        );
    }
}

/// Fan-out to several sinks in order.
impl EventSink for Vec<Box<dyn EventSink>> {
    fn notify(&mut self, event: &VadEvent) {
        for sink in self.iter_mut() {
            sink.notify(event);
        }
    }

    fn observe(&mut self, report: &MonitorReport) {
        for sink in self.iter_mut() {
            sink.observe(report);
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn notify(&mut self, event: &VadEvent) {
        (**self).notify(event)
    }

    fn observe(&mut self, report: &MonitorReport) {
        (**self).observe(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: VadEventKind) -> VadEvent {
        VadEvent {
            kind,
            detector_id: "mic-1".into(),
            voice_trend: 6,
        }
    }

    #[test]
    fn event_serializes_with_snake_case_kind_and_camel_case_fields() {
        let json = serde_json::to_value(event(VadEventKind::SpeechStart)).expect("serialize event");
        assert_eq!(json["kind"], "speech_start");
        assert_eq!(json["detectorId"], "mic-1");
        assert_eq!(json["voiceTrend"], 6);

        let round_trip: VadEvent = serde_json::from_value(json).expect("deserialize event");
        assert_eq!(round_trip, event(VadEventKind::SpeechStart));
    }

    #[test]
    fn kind_strings_match_serde_names() {
        for kind in [
            VadEventKind::SpeechStart,
            VadEventKind::SpeechEnd,
            VadEventKind::EnergyUpdate,
        ] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
        }
    }

    #[test]
    fn channel_sink_can_filter_telemetry() {
        let (sink, rx) = ChannelSink::unbounded();
        let mut sink = sink.transitions_only();
        sink.notify(&event(VadEventKind::EnergyUpdate));
        sink.notify(&event(VadEventKind::SpeechEnd));
        let got: Vec<_> = rx.try_iter().map(|e| e.kind).collect();
        assert_eq!(got, vec![VadEventKind::SpeechEnd]);
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (mut sink, rx) = ChannelSink::unbounded();
        drop(rx);
        sink.notify(&event(VadEventKind::SpeechStart));
    }

    #[test]
    fn broadcast_sink_without_subscribers_is_silent() {
        let (mut sink, rx) = BroadcastSink::channel(4);
        drop(rx);
        sink.notify(&event(VadEventKind::EnergyUpdate));

        let mut late = sink.subscribe();
        sink.notify(&event(VadEventKind::SpeechStart));
        assert_eq!(late.try_recv().unwrap().kind, VadEventKind::SpeechStart);
    }

    #[test]
    fn fan_out_reaches_every_sink() {
        let (a, rx_a) = ChannelSink::unbounded();
        let (b, rx_b) = ChannelSink::unbounded();
        let mut sinks: Vec<Box<dyn EventSink>> = vec![Box::new(a), Box::new(b), Box::new(NullSink)];
        sinks.notify(&event(VadEventKind::SpeechStart));
        assert_eq!(rx_a.len(), 1);
        assert_eq!(rx_b.len(), 1);
    }

    #[test]
    fn callback_sink_invokes_closure() {
        let mut seen = 0;
        {
            let mut sink = CallbackSink(|e: &VadEvent| {
                assert_eq!(e.voice_trend, 6);
                seen += 1;
            });
            sink.notify(&event(VadEventKind::EnergyUpdate));
            sink.notify(&event(VadEventKind::EnergyUpdate));
        }
        assert_eq!(seen, 2);
    }
}
