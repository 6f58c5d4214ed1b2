//! Image-to-tune conversion
//!
//! Converts a raster into a [`Tune`] with one three-voice chord per row.
//!
//! ## Per-Row Mapping
//! - **Pitch**: the mean of the red, green and blue planes picks a scale index each,
//!   `scale_len * channel_sum / width / 256` (integer division, left to right), clamped
//! - **Velocity**: the mean hue, saturation and brightness give the velocities of the
//!   red, green and blue notes, `velocity_base + velocity_range * mean`, truncated
//! - **Channels**: 0 = red, 1 = green, 2 = blue
//!
//! Rows are emitted top to bottom; none are skipped or merged.

use super::scale::Scale;
use super::types::{Chord, Note, Tune, MAX_VELOCITY};
use crate::codec::decode;
use crate::color::rgb_to_hsb;
use crate::config::SonifyConfig;
use crate::error::LabError;
use crate::raster::Raster;

/// Running per-row sums.
#[derive(Debug, Default)]
struct RowStats {
    gray: u64,
    red: u64,
    green: u64,
    blue: u64,
    hue: f32,
    saturation: f32,
    brightness: f32,
}

impl RowStats {
    fn collect(row: &[u32]) -> Self {
        let mut stats = Self::default();
        for &codeword in row {
            let pixel = decode(codeword);
            stats.gray += pixel.gray() as u64;
            stats.red += pixel.red as u64;
            stats.green += pixel.green as u64;
            stats.blue += pixel.blue as u64;

            let hsb = rgb_to_hsb(pixel.red, pixel.green, pixel.blue);
            stats.hue += hsb.hue;
            stats.saturation += hsb.saturation;
            stats.brightness += hsb.brightness;
        }
        stats
    }
}

/// Derives a [`Tune`] from pixel statistics.
#[derive(Debug, Clone)]
pub struct Sonifier {
    scale: Scale,
    velocity_base: u8,
    velocity_range: u8,
    duration_ms: u32,
}

impl Default for Sonifier {
    fn default() -> Self {
        Self::new(&SonifyConfig::default())
    }
}

impl Sonifier {
    pub fn new(config: &SonifyConfig) -> Self {
        Self {
            scale: Scale::build(),
            velocity_base: config.velocity_base,
            velocity_range: config.velocity_range,
            duration_ms: config.note_duration_ms,
        }
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    /// Sonify a raster.
    ///
    /// # Example
    /// ```
    /// use imagelab::{Raster, sound::Sonifier};
    ///
    /// let white = Raster::filled(2, 2, 0xFFFFFFFF);
    /// let tune = Sonifier::default().run(&white).unwrap();
    /// assert_eq!(tune.chord_count(), 2);
    /// assert!(tune.iter().all(|c| c.iter().all(|n| n.pitch == 106)));
    /// ```
    ///
    /// # Errors
    /// [`LabError::EmptyImage`] for a raster with no rows or no columns.
    pub fn run(&self, raster: &Raster) -> Result<Tune, LabError> {
        if raster.is_empty() {
            return Err(LabError::EmptyImage);
        }

        (0..raster.height())
            .map(|row| self.row_chord(raster.row(row)))
            .collect()
    }

    fn row_chord(&self, row: &[u32]) -> Result<Chord, LabError> {
        let width = row.len();
        let stats = RowStats::collect(row);

        let pitches = [stats.red, stats.green, stats.blue]
            .into_iter()
            .map(|sum| self.scale.pitch_at(self.scale_index(sum, width)))
            .collect::<Result<Vec<_>, _>>()?;

        let velocities = [stats.hue, stats.saturation, stats.brightness]
            .map(|sum| self.velocity(sum / width as f32));

        let chord = pitches
            .into_iter()
            .zip(velocities)
            .enumerate()
            .fold(Chord::new(), |chord, (channel, (pitch, velocity))| {
                chord.with_note(Note::new(channel, pitch, self.duration_ms, velocity))
            });

        log::trace!(
            "row mean gray {} -> pitches {:?}",
            stats.gray / width as u64,
            chord.iter().map(|n| n.pitch).collect::<Vec<_>>()
        );
        Ok(chord)
    }

    /// `len * sum / width / 256`, truncating at each step, then clamped.
    fn scale_index(&self, channel_sum: u64, width: usize) -> usize {
        let raw = self.scale.len() as u64 * channel_sum / width as u64 / 256;
        self.scale.clamp_index(raw.min(i64::MAX as u64) as i64)
    }

    fn velocity(&self, mean: f32) -> u8 {
        let v = (self.velocity_base as f32 + self.velocity_range as f32 * mean).floor();
        v.clamp(0.0, MAX_VELOCITY as f32) as u8
    }
}
