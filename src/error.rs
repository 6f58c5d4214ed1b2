//! # Error Types
//!
//! This module defines all error types for the ImageLab core.
//!
//! ## Error Types
//! - `DimensionMismatch` - Planes or codeword arrays whose sizes disagree
//! - `InvalidTrim` - Crop offsets outside the image
//! - `EmptyImage` - Zero-sized raster handed to the sonifier
//! - `IndexOutOfRange` - Scale lookup past either end (a caller bug)
//! - `NoOutputSink` - Playback without a synthesizer (reported, not fatal)
//! - `ImageLoadFailed` / `ImageSaveFailed` - Upstream decode or PNG export failure
//! - `Config` - Invalid YAML configuration
//! - `MidiExport` - Standard MIDI File serialisation failure
//! - `UnknownImage` / `PlaybackActive` - Session bookkeeping in [`ImageLab`](crate::ImageLab)
//! - `PlaybackThread` - Background playback thread failed to start or panicked
//!
//! ## Usage
//! ```rust
//! use imagelab::{codec, LabError, Raster};
//!
//! let raster = Raster::new(2, 2, vec![0xFF00_0000; 4])?;
//! match codec::trim(&raster, 5, 0) {
//!     Ok(_) => unreachable!(),
//!     Err(LabError::InvalidTrim { columns, width, .. }) => {
//!         assert_eq!((columns, width), (5, 2));
//!     }
//!     Err(e) => panic!("unexpected error: {}", e),
//! }
//! # Ok::<(), LabError>(())
//! ```

use crate::raster::ImageId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LabError {
    /// Planes, rows or codeword arrays that do not share one W×H shape.
    ///
    /// # Example
    /// ```
    /// # use imagelab::LabError;
    /// let err = LabError::DimensionMismatch {
    ///     expected: (2, 3),
    ///     found: (2, 2),
    /// };
    /// assert_eq!(err.to_string(), "Dimension mismatch: expected 2x3, found 2x2");
    /// ```
    #[error("Dimension mismatch: expected {}x{}, found {}x{}", expected.0, expected.1, found.0, found.1)]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Trim offsets that would leave nothing of the image.
    #[error("Invalid trim: cannot skip {columns} columns and {rows} rows of a {width}x{height} image")]
    InvalidTrim {
        columns: usize,
        rows: usize,
        width: usize,
        height: usize,
    },

    #[error("Image is empty: sonification needs at least one row and one column")]
    EmptyImage,

    /// Scale index misuse. Callers clamp before lookup, so this indicates a bug.
    #[error("Scale index {index} out of range (scale has {len} pitches)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("No available synthesizer: playback is silent")]
    NoOutputSink,

    #[error("Failed to load image '{source_name}': {message}")]
    ImageLoadFailed {
        source_name: String,
        message: String,
    },

    #[error("Failed to save image '{path}': {message}")]
    ImageSaveFailed { path: String, message: String },

    /// Invalid configuration.
    ///
    /// # Example
    /// ```
    /// # use imagelab::LabError;
    /// let err = LabError::Config("velocity-base + velocity-range must not exceed 127".to_string());
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Invalid configuration: velocity-base + velocity-range must not exceed 127"
    /// );
    /// ```
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("MIDI export failed: {0}")]
    MidiExport(String),

    #[error("No image with id {0}")]
    UnknownImage(ImageId),

    #[error("Image {0} is already playing")]
    PlaybackActive(ImageId),

    /// The background playback thread could not be started or panicked.
    #[error("Playback thread failed: {0}")]
    PlaybackThread(String),
}
