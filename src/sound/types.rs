//! Note, chord and tune type definitions
//!
//! These are the values that flow from the sonifier to the playback engine.

use serde::Serialize;
use std::time::Duration;

/// MIDI-style note number. Negative values are reserved for the null note.
pub type Pitch = i16;

/// Pitch carried by the null note: "nothing sounds on this channel".
pub const NULL_PITCH: Pitch = -1;

/// Highest MIDI note number.
pub const MAX_PITCH: Pitch = 127;

/// Middle C (C4), the center of the sonification scale.
pub const MIDDLE_C: Pitch = 60;

/// Pianissimo: the quietest velocity a generated note starts from.
pub const VELOCITY_BASE: u8 = 33;

/// Span added on top of [`VELOCITY_BASE`]; base + range reaches fortissimo (127).
pub const VELOCITY_RANGE: u8 = 94;

/// Highest MIDI velocity.
pub const MAX_VELOCITY: u8 = 127;

/// Default velocity for notes built without an explicit one (mezzo-piano).
pub const STD_VELOCITY: u8 = 64;

/// Dotted eighth at 120 BPM, in milliseconds.
pub const DOTTED_EIGHTH_MS: u32 = 375;

/// Default note duration: half a dotted eighth.
pub const DEFAULT_DURATION_MS: u32 = DOTTED_EIGHTH_MS / 2;

/// General MIDI programs (zero-based).
pub const VIBRAPHONE: u8 = 11;
pub const PIZZICATO_STRINGS: u8 = 45;
pub const MELODIC_TOM: u8 = 117;

/// Instruments for the red, green and blue channels.
pub const DEFAULT_INSTRUMENTS: [u8; 3] = [VIBRAPHONE, PIZZICATO_STRINGS, MELODIC_TOM];

/// How the playback engine waits between chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Sleep for each chord's duration (cancellable).
    RealTime,
    /// Do not sleep; sinks are still told how much time passed.
    Offline,
}

/// An instrument a sink can play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub program: u8,
    pub name: String,
}

/// One sounding event on one output channel.
///
/// # Fields
/// - `channel`: output channel index
/// - `pitch`: note number (0-127); any negative pitch is silence
/// - `duration_ms`: how long the engine waits after this note starts
/// - `velocity`: note-on velocity (0-127)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub channel: usize,
    pub pitch: Pitch,
    pub duration_ms: u32,
    pub velocity: u8,
}

impl Note {
    /// Build a note. Pitches above [`MAX_PITCH`] are clamped, negative pitches
    /// give the null note.
    pub fn new(channel: usize, pitch: Pitch, duration_ms: u32, velocity: u8) -> Self {
        Self {
            channel,
            pitch,
            duration_ms,
            velocity,
        }
        .normalized()
    }

    /// The null note for `channel`.
    pub fn null(channel: usize) -> Self {
        Self {
            channel,
            pitch: NULL_PITCH,
            duration_ms: 0,
            velocity: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.pitch < 0
    }

    /// The same note with pitch and velocity brought into MIDI range.
    pub fn normalized(self) -> Self {
        if self.is_null() {
            return Self::null(self.channel);
        }
        Self {
            pitch: self.pitch.min(MAX_PITCH),
            velocity: self.velocity.min(MAX_VELOCITY),
            ..self
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms as u64)
    }
}

/// Notes that start together, at most one per channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Chord {
    notes: Vec<Note>,
}

impl Chord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a note, replacing any note already on the same channel.
    ///
    /// Returns the replaced note, if any.
    pub fn add_note(&mut self, note: Note) -> Option<Note> {
        match self.notes.iter_mut().find(|n| n.channel == note.channel) {
            Some(existing) => Some(std::mem::replace(existing, note)),
            None => {
                self.notes.push(note);
                None
            }
        }
    }

    pub fn with_note(mut self, note: Note) -> Self {
        self.add_note(note);
        self
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note_on(&self, channel: usize) -> Option<&Note> {
        self.notes.iter().find(|n| n.channel == channel)
    }

    pub fn num_voices(&self) -> usize {
        self.notes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.notes.iter()
    }
}

impl<'a> IntoIterator for &'a Chord {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}

/// An ordered sequence of chords: one per image row, top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tune {
    chords: Vec<Chord>,
}

impl Tune {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_chord(&mut self, chord: Chord) {
        self.chords.push(chord);
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn chord_count(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    /// One past the highest channel index used by any note.
    pub fn channel_span(&self) -> usize {
        self.chords
            .iter()
            .flat_map(|c| c.iter())
            .map(|n| n.channel + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chord> {
        self.chords.iter()
    }
}

impl FromIterator<Chord> for Tune {
    fn from_iter<I: IntoIterator<Item = Chord>>(iter: I) -> Self {
        Self {
            chords: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Tune {
    type Item = &'a Chord;
    type IntoIter = std::slice::Iter<'a, Chord>;

    fn into_iter(self) -> Self::IntoIter {
        self.chords.iter()
    }
}
