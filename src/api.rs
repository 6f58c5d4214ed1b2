//! # Public API
//!
//! Main entry points for one-shot use of the library, without an [`ImageLab`](crate::ImageLab).
//!
//! ## Functions
//!
//! - [`sonify_raster()`] - Turn a decoded raster into a Tune
//! - [`sonify_file()`] - Load an image file (with the configured trim) and sonify it
//! - [`render_midi()`] - Play a Tune offline into a Standard MIDI File
//! - [`export_musicxml()`] - Render a Tune as a MusicXML score
//!
//! ## Typical Usage
//!
//! ```rust
//! use imagelab::{render_midi, sonify_raster, Raster, SonifyConfig};
//!
//! let raster = Raster::filled(8, 4, 0xFF3366CC);
//! let config = SonifyConfig::default();
//!
//! let tune = sonify_raster(&raster, &config)?;
//! assert_eq!(tune.chord_count(), 4);
//!
//! let midi = render_midi(&tune, &config)?;
//! assert_eq!(&midi[..4], b"MThd");
//! # Ok::<(), imagelab::LabError>(())
//! ```

use crate::config::SonifyConfig;
use crate::error::LabError;
use crate::musicxml::tune_to_musicxml_with;
use crate::raster::Raster;
use crate::source;
use crate::sound::{MidiFileSink, Pacing, PlaybackEngine, Sonifier, Tune};
use std::path::Path;

/// Sonify a raster: one three-voice chord per row.
///
/// # Errors
/// [`LabError::EmptyImage`] for a raster without rows or columns.
pub fn sonify_raster(raster: &Raster, config: &SonifyConfig) -> Result<Tune, LabError> {
    Sonifier::new(config).run(raster)
}

/// Load, trim and sonify an image file.
///
/// # Errors
/// [`LabError::ImageLoadFailed`] if the file cannot be decoded; nothing is
/// sonified in that case. [`LabError::InvalidTrim`] if the configured trim
/// does not fit the image.
pub fn sonify_file(path: impl AsRef<Path>, config: &SonifyConfig) -> Result<Tune, LabError> {
    let raster = source::load_trimmed(path, config.trim_columns, config.trim_rows)?;
    sonify_raster(&raster, config)
}

/// Play a tune offline through the note state machine and return SMF bytes.
///
/// The file sounds exactly what real-time playback would: sustained pitches are
/// not re-triggered and every channel ends with a note-off.
pub fn render_midi(tune: &Tune, config: &SonifyConfig) -> Result<Vec<u8>, LabError> {
    let sink = MidiFileSink::new();
    PlaybackEngine::with_sink(sink.clone(), config)
        .pacing(Pacing::Offline)
        .run(tune, None);
    sink.to_bytes()
}

/// Render a tune as MusicXML using the configured instruments.
pub fn export_musicxml(tune: &Tune, title: &str, config: &SonifyConfig) -> String {
    tune_to_musicxml_with(tune, title, &config.instruments)
}
