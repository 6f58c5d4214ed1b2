//! # Raster and Plane Types
//!
//! ## Type Hierarchy
//! ```text
//! Raster (height × width composite codewords, row-major)
//!   └── u32 codeword = 0xAARRGGBB
//!
//! Planes (four Plane values of the same shape)
//!   ├── alpha: Plane
//!   ├── red:   Plane
//!   ├── green: Plane
//!   └── blue:  Plane
//! ```
//!
//! A `Raster` and its four `Planes` carry the same information; see
//! [`codec::pack`](crate::codec::pack) and [`codec::unpack`](crate::codec::unpack).
//!
//! Values are never shared between a caller and the lab: every accessor that hands
//! out pixel data hands out a fresh copy.

use crate::error::LabError;
use serde::Serialize;
use std::fmt;

/// Identifier assigned to an image when it enters an [`ImageLab`](crate::ImageLab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One of the four 8-bit fields of a composite codeword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Alpha,
    Red,
    Green,
    Blue,
}

impl Channel {
    /// Bit offset of this channel inside a codeword (alpha high byte, blue low byte).
    pub fn shift(self) -> u32 {
        match self {
            Channel::Alpha => 24,
            Channel::Red => 16,
            Channel::Green => 8,
            Channel::Blue => 0,
        }
    }
}

/// A decoded image: `width * height` ARGB codewords in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Raster {
    /// Build a raster, checking that the codeword count matches the dimensions.
    pub fn new(width: usize, height: usize, pixels: Vec<u32>) -> Result<Self, LabError> {
        if pixels.len() != width * height {
            return Err(LabError::DimensionMismatch {
                expected: (width, height),
                found: (pixels.len(), 1),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Shape-preserving constructor for codec output derived from an existing raster or plane.
    pub(crate) fn from_parts(width: usize, height: usize, pixels: Vec<u32>) -> Self {
        debug_assert_eq!(pixels.len(), width * height);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A raster with every pixel set to `codeword`.
    pub fn filled(width: usize, height: usize, codeword: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![codeword; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }

    /// Codeword at (`row`, `col`), or `None` outside the image.
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        if row < self.height && col < self.width {
            Some(self.pixels[row * self.width + col])
        } else {
            None
        }
    }

    /// The codewords of one row.
    pub fn row(&self, row: usize) -> &[u32] {
        let start = row * self.width;
        &self.pixels[start..start + self.width]
    }

    /// The first `rows` rows as one contiguous slice (clamped to the image height).
    pub fn prefix_rows(&self, rows: usize) -> &[u32] {
        let rows = rows.min(self.height);
        &self.pixels[..rows * self.width]
    }

    /// Fresh copy of one channel.
    pub fn plane(&self, channel: Channel) -> Plane {
        let shift = channel.shift();
        Plane::from_parts(
            self.width,
            self.height,
            self.pixels.iter().map(|p| ((p >> shift) & 0xFF) as u8).collect(),
        )
    }
}

/// An H×W grid of 8-bit values for a single channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    width: usize,
    height: usize,
    values: Vec<u8>,
}

impl Plane {
    pub fn new(width: usize, height: usize, values: Vec<u8>) -> Result<Self, LabError> {
        if values.len() != width * height {
            return Err(LabError::DimensionMismatch {
                expected: (width, height),
                found: (values.len(), 1),
            });
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    pub(crate) fn from_parts(width: usize, height: usize, values: Vec<u8>) -> Self {
        debug_assert_eq!(values.len(), width * height);
        Self {
            width,
            height,
            values,
        }
    }

    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            values: vec![value; width * height],
        }
    }

    /// Build a plane from nested rows; ragged rows are rejected.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self, LabError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        let mut values = Vec::with_capacity(width * height);
        for row in rows {
            if row.len() != width {
                return Err(LabError::DimensionMismatch {
                    expected: (width, height),
                    found: (row.len(), height),
                });
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        if row < self.height && col < self.width {
            Some(self.values[row * self.width + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[u8] {
        let start = row * self.width;
        &self.values[start..start + self.width]
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        if self.width == 0 {
            return vec![Vec::new(); self.height];
        }
        self.values.chunks(self.width).map(|c| c.to_vec()).collect()
    }
}

/// The four channel planes of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Planes {
    pub alpha: Plane,
    pub red: Plane,
    pub green: Plane,
    pub blue: Plane,
}

impl Planes {
    pub fn get(&self, channel: Channel) -> &Plane {
        match channel {
            Channel::Alpha => &self.alpha,
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }
}
