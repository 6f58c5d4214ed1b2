//! Output sinks: where note commands go.
//!
//! A sink is a MIDI-like synthesizer surface. The playback engine only ever issues
//! `program_change`, `note_on` and `note_off` per channel; channel count and the
//! instrument list are reported by the sink.

use super::types::{Instrument, Pitch};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Number of channels of a General MIDI synthesizer.
pub const GM_CHANNELS: usize = 16;

pub trait OutputSink {
    fn channel_count(&self) -> usize;

    fn available_instruments(&self) -> Vec<Instrument>;

    fn program_change(&mut self, channel: usize, program: u8);

    fn note_on(&mut self, channel: usize, pitch: Pitch, velocity: u8);

    fn note_off(&mut self, channel: usize, pitch: Pitch, velocity: u8);

    /// Called by the engine after each chord with the time it paced.
    fn advance(&mut self, _elapsed: Duration) {}
}

/// One command received by a [`RecordingSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SinkEvent {
    ProgramChange {
        channel: usize,
        program: u8,
    },
    NoteOn {
        channel: usize,
        pitch: Pitch,
        velocity: u8,
    },
    NoteOff {
        channel: usize,
        pitch: Pitch,
        velocity: u8,
    },
}

impl SinkEvent {
    pub fn channel(&self) -> usize {
        match *self {
            SinkEvent::ProgramChange { channel, .. }
            | SinkEvent::NoteOn { channel, .. }
            | SinkEvent::NoteOff { channel, .. } => channel,
        }
    }
}

/// In-memory command log.
///
/// Clones share one log, so a clone kept by the caller sees everything a
/// playback thread sent to its own copy.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    channels: usize,
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::with_channels(GM_CHANNELS)
    }
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channels(channels: usize) -> Self {
        Self {
            channels,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of every command received so far.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Note on/off commands only, in order.
    pub fn note_events(&self) -> Vec<SinkEvent> {
        self.events()
            .into_iter()
            .filter(|e| !matches!(e, SinkEvent::ProgramChange { .. }))
            .collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn push(&self, event: SinkEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl OutputSink for RecordingSink {
    fn channel_count(&self) -> usize {
        self.channels
    }

    fn available_instruments(&self) -> Vec<Instrument> {
        gm_instruments()
    }

    fn program_change(&mut self, channel: usize, program: u8) {
        self.push(SinkEvent::ProgramChange { channel, program });
    }

    fn note_on(&mut self, channel: usize, pitch: Pitch, velocity: u8) {
        self.push(SinkEvent::NoteOn {
            channel,
            pitch,
            velocity,
        });
    }

    fn note_off(&mut self, channel: usize, pitch: Pitch, velocity: u8) {
        self.push(SinkEvent::NoteOff {
            channel,
            pitch,
            velocity,
        });
    }
}

/// General MIDI family names, eight programs each.
const GM_FAMILIES: [&str; 16] = [
    "Piano",
    "Chromatic Percussion",
    "Organ",
    "Guitar",
    "Bass",
    "Strings",
    "Ensemble",
    "Brass",
    "Reed",
    "Pipe",
    "Synth Lead",
    "Synth Pad",
    "Synth Effects",
    "Ethnic",
    "Percussive",
    "Sound Effects",
];

/// The 128 General MIDI programs, named by family and position.
pub fn gm_instruments() -> Vec<Instrument> {
    (0..128u8)
        .map(|program| Instrument {
            program,
            name: format!("{} {}", GM_FAMILIES[program as usize / 8], program % 8 + 1),
        })
        .collect()
}
