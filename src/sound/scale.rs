//! Pentatonic scale used to map channel intensity onto pitch.
//!
//! Seven octaves (-3..=+3 around [`MIDDLE_C`]) of the degrees {0, 3, 5, 7, 10}:
//! 35 pitches from C1 (24) to Bb7 (106), strictly ascending.

use super::types::{Pitch, MIDDLE_C};
use crate::error::LabError;

/// Semitone offsets of the scale degrees within one octave.
pub const DEGREES: [Pitch; 5] = [0, 3, 5, 7, 10];

/// Octave offsets relative to the center octave.
pub const OCTAVES: std::ops::RangeInclusive<i16> = -3..=3;

/// An ordered, duplicate-free pitch sequence fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scale {
    pitches: Vec<Pitch>,
}

impl Scale {
    /// The 35-pitch pentatonic scale.
    ///
    /// # Example
    /// ```
    /// use imagelab::sound::Scale;
    ///
    /// let scale = Scale::build();
    /// assert_eq!(scale.len(), 35);
    /// assert_eq!(scale.pitch_at(0).unwrap(), 24);
    /// assert_eq!(scale.pitch_at(15).unwrap(), 60); // middle C
    /// ```
    pub fn build() -> Self {
        let pitches = OCTAVES
            .flat_map(|octave| DEGREES.iter().map(move |d| MIDDLE_C + 12 * octave + d))
            .collect();
        Self { pitches }
    }

    /// Pitch at `index`, which must be below [`Scale::len`].
    pub fn pitch_at(&self, index: usize) -> Result<Pitch, LabError> {
        self.pitches
            .get(index)
            .copied()
            .ok_or(LabError::IndexOutOfRange {
                index,
                len: self.pitches.len(),
            })
    }

    /// Clamp an arbitrary computed index into `[0, len - 1]`.
    pub fn clamp_index(&self, index: i64) -> usize {
        index.clamp(0, self.pitches.len().saturating_sub(1) as i64) as usize
    }

    /// Number of pitches.
    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    pub fn pitches(&self) -> &[Pitch] {
        &self.pitches
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::build()
    }
}
