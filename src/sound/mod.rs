//! # Sound Module
//!
//! Turn an image into a tune and play it on a MIDI-like synthesizer.
//!
//! ## Purpose
//! This module covers everything after the pixel codec:
//! 1. **Sonification** - one three-voice chord per image row, pitches from the mean
//!    red/green/blue intensity, velocities from the mean hue/saturation/brightness
//! 2. **Playback** - a per-channel note state machine that never re-triggers a
//!    sustained pitch, paced by note durations and cancellable at any chord
//! 3. **Reveal** - the image is shown row by row, one row ahead of or level with
//!    the sound
//!
//! ## Sub-modules
//! - `types` - Note, Chord, Tune and the musical constants
//! - `scale` - The 35-pitch pentatonic scale
//! - `sonifier` - Raster to Tune conversion
//! - `engine` - Playback state machine and background playback handle
//! - `sink` - Output sink trait and the in-memory recording sink
//! - `midi` - Standard MIDI File sink
//! - `sync` - Progressive reveal feeds
//!
//! ## Example
//! ```rust
//! use imagelab::sound::{Pacing, PlaybackEngine, RecordingSink, Sonifier};
//! use imagelab::{Raster, SonifyConfig};
//!
//! let raster = Raster::filled(4, 3, 0xFF80_4020);
//! let tune = Sonifier::default().run(&raster).unwrap();
//!
//! let sink = RecordingSink::new();
//! let mut engine =
//!     PlaybackEngine::with_sink(sink.clone(), &SonifyConfig::default()).pacing(Pacing::Offline);
//! let report = engine.run(&tune, None);
//!
//! assert_eq!(report.chords_played, 3);
//! // every row is identical: three note-ons, three note-offs
//! assert_eq!(sink.note_events().len(), 6);
//! ```
//!
//! ## Related Modules
//! - `crate::codec` - Pixel decoding used by the sonifier
//! - `crate::musicxml` - Score export of a Tune

pub mod engine;
pub mod midi;
pub mod scale;
pub mod sink;
pub mod sonifier;
pub mod sync;
pub mod types;

pub use engine::{PlaybackEngine, PlaybackHandle, PlaybackReport, Reveal};
pub use midi::MidiFileSink;
pub use scale::Scale;
pub use sink::{OutputSink, RecordingSink, SinkEvent};
pub use sonifier::Sonifier;
pub use sync::{LogFeed, RevealBuffer, SyncFeed};
pub use types::{Chord, Instrument, Note, Pacing, Pitch, Tune};

#[cfg(test)]
mod tests;
