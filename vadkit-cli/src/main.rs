//! `vadkit`: scan a WAV file for speech segments.
//!
//! Prints one JSON object per detector event on stdout and a segment summary
//! through `tracing` on stderr.
//!
//! ```text
//! vadkit --input take1.wav [--config options.json] [--id mic] [--events all|transitions]
//! ```

mod settings;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::info;
use vadkit_core::{
    AudioChunk, ChannelSink, EventSink, StreamingVad, TracingSink, VadEvent, VadEventKind,
};

use settings::{default_settings_path, load_options, save_options};

/// Samples handed to the detector per push, mimicking a capture callback.
const PUSH_CHUNK: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventFilter {
    All,
    Transitions,
}

#[derive(Debug)]
struct Args {
    input: PathBuf,
    config: PathBuf,
    id: Option<String>,
    events: EventFilter,
}

enum Command {
    Scan(Args),
    WriteDefaultConfig(PathBuf),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventRecord<'a> {
    iteration: u64,
    time_secs: f64,
    #[serde(flatten)]
    event: &'a VadEvent,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vadkit=info")),
        )
        .init();

    let result = parse_args().and_then(|cmd| match cmd {
        Command::Scan(args) => scan(&args),
        Command::WriteDefaultConfig(path) => save_options(&path, &Default::default())
            .with_context(|| format!("writing {}", path.display())),
    });
    if let Err(e) = result {
        eprintln!("vadkit: {e:#}");
        std::process::exit(1);
    }
}

fn parse_args() -> Result<Command> {
    let mut input: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;
    let mut id: Option<String> = None;
    let mut events = EventFilter::All;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--input" | "-i" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --input");
                };
                input = Some(PathBuf::from(v));
            }
            "--config" | "-c" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --config");
                };
                config = Some(PathBuf::from(v));
            }
            "--id" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --id");
                };
                id = Some(v);
            }
            "--events" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --events");
                };
                events = match v.as_str() {
                    "all" => EventFilter::All,
                    "transitions" => EventFilter::Transitions,
                    other => bail!("invalid value for --events: {other}"),
                };
            }
            "--write-default-config" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --write-default-config");
                };
                return Ok(Command::WriteDefaultConfig(PathBuf::from(v)));
            }
            "--help" | "-h" => {
                println!(
                    "Usage: vadkit --input <file.wav> [--config <options.json>] [--id <label>] \\
  [--events all|transitions]\n       vadkit --write-default-config <options.json>"
                );
                std::process::exit(0);
            }
            other => bail!("unknown argument: {other}"),
        }
    }

    let Some(input) = input else {
        bail!("--input is required");
    };
    Ok(Command::Scan(Args {
        input,
        config: config.unwrap_or_else(default_settings_path),
        id,
        events,
    }))
}

fn scan(args: &Args) -> Result<()> {
    let (samples, sample_rate) = read_wav_mono_f32(&args.input)?;

    let mut options = load_options(&args.config);
    options.sample_rate = sample_rate;
    if let Some(id) = &args.id {
        options.id = id.clone();
    }
    let config = options.validate().context("invalid detector options")?;
    let fft_size = f64::from(config.fft_size());
    let hop_size = f64::from(config.hop_size());
    let rate = f64::from(config.sample_rate());

    let (channel, rx) = ChannelSink::unbounded();
    let sinks: Vec<Box<dyn EventSink>> = vec![Box::new(channel), Box::new(TracingSink)];
    let mut vad = StreamingVad::new(config, sinks)?;

    info!(
        file = %args.input.display(),
        sample_rate,
        seconds = samples.len() as f64 / rate,
        "scanning"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut iteration = 0u64;
    let mut segments: Vec<(f64, Option<f64>)> = Vec::new();

    for block in samples.chunks(PUSH_CHUNK) {
        vad.push(&AudioChunk::new(block.to_vec(), sample_rate))?;

        for event in rx.try_iter() {
            // Time at the end of the frame this event belongs to.
            let time_secs = (fft_size + iteration as f64 * hop_size) / rate;
            match event.kind {
                VadEventKind::SpeechStart => segments.push((time_secs, None)),
                VadEventKind::SpeechEnd => {
                    if let Some(last) = segments.last_mut() {
                        last.1 = Some(time_secs);
                    }
                }
                VadEventKind::EnergyUpdate => {}
            }
            if args.events == EventFilter::All || event.kind.is_transition() {
                serde_json::to_writer(
                    &mut out,
                    &EventRecord {
                        iteration,
                        time_secs,
                        event: &event,
                    },
                )?;
                writeln!(out)?;
            }
            if event.kind == VadEventKind::EnergyUpdate {
                iteration += 1;
            }
        }
    }
    out.flush()?;

    let total = samples.len() as f64 / rate;
    for &(start, end) in &segments {
        let end = end.unwrap_or(total);
        info!(start = start, end = end, duration = end - start, "speech segment");
    }
    info!(
        iterations = vad.iterations(),
        segments = segments.len(),
        final_offset = vad.detector().energy_offset(),
        "scan complete"
    );
    Ok(())
}

fn read_wav_mono_f32(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max = ((1_i64 << (spec.bits_per_sample - 1)) - 1) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let chunk = AudioChunk::from_interleaved(&interleaved, channels, spec.sample_rate);
    Ok((chunk.samples, chunk.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, samples: &[i16], sample_rate: u32, channels: u16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn reads_and_downmixes_stereo_pcm16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, &[i16::MAX, 0, 0, i16::MAX, -i16::MAX, -i16::MAX], 8000, 2);

        let (samples, rate) = read_wav_mono_f32(&path).unwrap();
        assert_eq!(rate, 8000);
        assert_eq!(samples.len(), 3);
        assert!((samples[0] - 0.5).abs() < 1e-6);
        assert!((samples[1] - 0.5).abs() < 1e-6);
        assert!((samples[2] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn missing_wav_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_wav_mono_f32(&dir.path().join("missing.wav")).is_err());
    }

    #[test]
    fn scan_runs_over_a_tone_burst() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("burst.wav");
        let rate = 16_000u32;
        let samples: Vec<i16> = (0..rate as usize * 2)
            .map(|i| {
                let in_burst = (8_000..16_000).contains(&i);
                let t = i as f32 / rate as f32;
                let amp = if in_burst { 12_000.0 } else { 0.0 };
                (amp * (2.0 * std::f32::consts::PI * 500.0 * t).sin()) as i16
            })
            .collect();
        write_wav(&wav, &samples, rate, 1);

        let args = Args {
            input: wav,
            config: dir.path().join("absent.json"),
            id: Some("test".into()),
            events: EventFilter::Transitions,
        };
        scan(&args).unwrap();
    }
}
