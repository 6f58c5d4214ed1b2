//! Standard MIDI File output.
//!
//! [`MidiFileSink`] captures engine commands against a virtual clock (advanced by
//! the engine after every chord) and renders them as a format-0 SMF at 480 ticks
//! per quarter and 120 BPM, so one millisecond is 0.96 ticks.

use super::sink::{gm_instruments, OutputSink, GM_CHANNELS};
use super::types::{Instrument, Pitch};
use crate::error::LabError;
use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub const TICKS_PER_QUARTER: u16 = 480;

/// Microseconds per quarter note (120 BPM).
pub const TEMPO_US: u32 = 500_000;

#[derive(Debug, Clone, Copy)]
enum Command {
    Program(u4, u7),
    On(u4, u7, u7),
    Off(u4, u7, u7),
}

#[derive(Debug, Default)]
struct Capture {
    clock_ms: u64,
    events: Vec<(u64, Command)>,
}

/// Sink that records a playable MIDI file. Clones share one capture.
#[derive(Debug, Clone, Default)]
pub struct MidiFileSink {
    capture: Arc<Mutex<Capture>>,
}

fn ms_to_ticks(ms: u64) -> u64 {
    ms * 24 / 25
}

/// Largest delta-time a track event can carry.
const MAX_DELTA: u64 = (1 << 28) - 1;

fn delta(ticks: u64) -> u28 {
    u28::new(ticks.min(MAX_DELTA) as u32)
}

fn channel_u4(channel: usize) -> Option<u4> {
    u8::try_from(channel).ok().and_then(u4::try_from)
}

fn key_u7(pitch: Pitch) -> Option<u7> {
    u8::try_from(pitch).ok().and_then(u7::try_from)
}

impl MidiFileSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed so far.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.lock().clock_ms)
    }

    /// Number of captured channel messages.
    pub fn event_count(&self) -> usize {
        self.lock().events.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Capture> {
        self.capture.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, command: Option<Command>) {
        match command {
            Some(command) => {
                let mut capture = self.lock();
                let at = capture.clock_ms;
                capture.events.push((at, command));
            }
            None => log::warn!("midi: dropping command outside MIDI range"),
        }
    }

    /// Build the SMF from everything captured so far.
    pub fn to_smf(&self) -> Smf<'static> {
        let capture = self.lock();
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
        ));

        let mut track = vec![TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(TEMPO_US))),
        }];

        let mut last_tick = 0u64;
        for &(ms, command) in &capture.events {
            let tick = ms_to_ticks(ms);
            let gap = tick - last_tick;
            last_tick = tick;

            let (channel, message) = match command {
                Command::Program(channel, program) => {
                    (channel, MidiMessage::ProgramChange { program })
                }
                Command::On(channel, key, vel) => (channel, MidiMessage::NoteOn { key, vel }),
                Command::Off(channel, key, vel) => (channel, MidiMessage::NoteOff { key, vel }),
            };
            track.push(TrackEvent {
                delta: delta(gap),
                kind: TrackEventKind::Midi { channel, message },
            });
        }

        let end = ms_to_ticks(capture.clock_ms);
        track.push(TrackEvent {
            delta: delta(end.saturating_sub(last_tick)),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });

        smf.tracks.push(track);
        smf
    }

    /// Encode the capture as SMF bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LabError> {
        let mut buf = Vec::new();
        self.to_smf()
            .write(&mut buf)
            .map_err(|e| LabError::MidiExport(e.to_string()))?;
        Ok(buf)
    }

    /// Write the capture to `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), LabError> {
        let path = path.as_ref();
        let buf = self.to_bytes()?;
        std::fs::write(path, &buf)
            .map_err(|e| LabError::MidiExport(format!("{}: {}", path.display(), e)))?;
        log::info!("midi: wrote {} bytes to {}", buf.len(), path.display());
        Ok(())
    }
}

impl OutputSink for MidiFileSink {
    fn channel_count(&self) -> usize {
        GM_CHANNELS
    }

    fn available_instruments(&self) -> Vec<Instrument> {
        gm_instruments()
    }

    fn program_change(&mut self, channel: usize, program: u8) {
        self.record(
            channel_u4(channel)
                .zip(u7::try_from(program))
                .map(|(c, p)| Command::Program(c, p)),
        );
    }

    fn note_on(&mut self, channel: usize, pitch: Pitch, velocity: u8) {
        self.record(
            channel_u4(channel)
                .zip(key_u7(pitch))
                .zip(u7::try_from(velocity))
                .map(|((c, k), v)| Command::On(c, k, v)),
        );
    }

    fn note_off(&mut self, channel: usize, pitch: Pitch, velocity: u8) {
        self.record(
            channel_u4(channel)
                .zip(key_u7(pitch))
                .zip(u7::try_from(velocity))
                .map(|((c, k), v)| Command::Off(c, k, v)),
        );
    }

    fn advance(&mut self, elapsed: Duration) {
        self.lock().clock_ms += elapsed.as_millis() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_single_track_with_timing() {
        let mut sink = MidiFileSink::new();
        sink.program_change(0, 11);
        sink.note_on(0, 60, 100);
        sink.advance(Duration::from_millis(500));
        sink.note_off(0, 60, 100);

        let smf = sink.to_smf();
        assert_eq!(smf.header.format, Format::SingleTrack);
        assert_eq!(smf.tracks.len(), 1);

        let track = &smf.tracks[0];
        // tempo, program, on, off, end of track
        assert_eq!(track.len(), 5);
        assert_eq!(track[3].delta, u28::new(480));
        assert!(matches!(
            track[2].kind,
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { .. },
                ..
            }
        ));
        assert_eq!(sink.elapsed(), Duration::from_millis(500));
    }

    #[test]
    fn test_out_of_range_commands_dropped() {
        let mut sink = MidiFileSink::new();
        sink.note_on(16, 60, 64);
        sink.note_on(0, -1, 64);
        sink.note_on(0, 200, 64);
        assert_eq!(sink.event_count(), 0);
    }

    #[test]
    fn test_bytes_parse_back() {
        let mut sink = MidiFileSink::new();
        sink.note_on(1, 72, 90);
        sink.advance(Duration::from_millis(250));
        sink.note_off(1, 72, 90);

        let bytes = sink.to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"MThd");
        let parsed = Smf::parse(&bytes).unwrap();
        assert_eq!(parsed.tracks[0].len(), 4);
    }
}
