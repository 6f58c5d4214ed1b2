//! # Pixel Codec
//!
//! Packs four 8-bit channel planes into 32-bit composite codewords and back.
//!
//! ## Codeword Layout
//! ```text
//!  31      24 23      16 15       8 7        0
//! +----------+----------+----------+----------+
//! |  alpha   |   red    |  green   |   blue   |
//! +----------+----------+----------+----------+
//! ```
//!
//! ## Guarantees
//! - `pack(unpack(raster)) == raster` for every raster
//! - `unpack(pack(planes)) == planes` for every same-shaped plane set
//! - `to_grayscale` is idempotent and never touches alpha
//!
//! ## Grayscale Policy
//! `gray = (red + green + blue) / 3` with integer truncation. The value is written back into
//! all three color fields.
//!
//! ## Example
//! ```rust
//! use imagelab::{codec, Raster};
//!
//! let raster = Raster::new(2, 1, vec![0xFF102030, 0x80FFFFFF])?;
//! let planes = codec::unpack(&raster);
//! assert_eq!(planes.red.values(), &[0x10, 0xFF]);
//! assert_eq!(codec::pack(&planes.alpha, &planes.red, &planes.green, &planes.blue)?, raster);
//!
//! let gray = codec::to_grayscale(&raster);
//! assert_eq!(gray.pixels()[0], 0xFF202020);
//! # Ok::<(), imagelab::LabError>(())
//! ```

use crate::error::LabError;
use crate::raster::{Channel, Plane, Planes, Raster};

/// Opaque alpha.
pub const OPAQUE: u8 = 0xFF;

/// One decoded codeword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Argb {
    pub alpha: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Argb {
    pub fn new(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self {
            alpha,
            red,
            green,
            blue,
        }
    }

    /// Grayscale value of this pixel (truncating mean of red, green and blue).
    pub fn gray(&self) -> u8 {
        ((self.red as u16 + self.green as u16 + self.blue as u16) / 3) as u8
    }
}

/// Concatenate the four fields into a codeword.
pub fn encode(pixel: Argb) -> u32 {
    (pixel.alpha as u32) << Channel::Alpha.shift()
        | (pixel.red as u32) << Channel::Red.shift()
        | (pixel.green as u32) << Channel::Green.shift()
        | (pixel.blue as u32) << Channel::Blue.shift()
}

/// Split a codeword into its four fields.
pub fn decode(codeword: u32) -> Argb {
    let field = |channel: Channel| ((codeword >> channel.shift()) & 0xFF) as u8;
    Argb {
        alpha: field(Channel::Alpha),
        red: field(Channel::Red),
        green: field(Channel::Green),
        blue: field(Channel::Blue),
    }
}

/// Pack four planes into a raster.
///
/// All planes must share the alpha plane's dimensions.
pub fn pack(alpha: &Plane, red: &Plane, green: &Plane, blue: &Plane) -> Result<Raster, LabError> {
    let expected = alpha.dimensions();
    for plane in [red, green, blue] {
        if plane.dimensions() != expected {
            return Err(LabError::DimensionMismatch {
                expected,
                found: plane.dimensions(),
            });
        }
    }

    let pixels = alpha
        .values()
        .iter()
        .zip(red.values())
        .zip(green.values())
        .zip(blue.values())
        .map(|(((&a, &r), &g), &b)| encode(Argb::new(a, r, g, b)))
        .collect();

    Raster::new(expected.0, expected.1, pixels)
}

/// Pack a [`Planes`] bundle.
pub fn pack_planes(planes: &Planes) -> Result<Raster, LabError> {
    pack(&planes.alpha, &planes.red, &planes.green, &planes.blue)
}

/// Split a raster into its four channel planes.
pub fn unpack(raster: &Raster) -> Planes {
    Planes {
        alpha: raster.plane(Channel::Alpha),
        red: raster.plane(Channel::Red),
        green: raster.plane(Channel::Green),
        blue: raster.plane(Channel::Blue),
    }
}

/// Replace red, green and blue of every pixel with its grayscale value.
pub fn to_grayscale(raster: &Raster) -> Raster {
    let pixels: Vec<u32> = raster
        .pixels()
        .iter()
        .map(|&codeword| {
            let pixel = decode(codeword);
            let gray = pixel.gray();
            encode(Argb::new(pixel.alpha, gray, gray, gray))
        })
        .collect();
    Raster::from_parts(raster.width(), raster.height(), pixels)
}

/// The black-and-white plane: one grayscale value per pixel.
pub fn grayscale_plane(raster: &Raster) -> Plane {
    let values = raster.pixels().iter().map(|&c| decode(c).gray()).collect();
    Plane::from_parts(raster.width(), raster.height(), values)
}

/// Build an opaque raster from a black-and-white plane.
pub fn from_grayscale(plane: &Plane) -> Raster {
    let pixels: Vec<u32> = plane
        .values()
        .iter()
        .map(|&v| encode(Argb::new(OPAQUE, v, v, v)))
        .collect();
    Raster::from_parts(plane.width(), plane.height(), pixels)
}

/// Skip `columns` columns and `rows` rows from the top-left corner.
///
/// Offsets must leave at least one column and one row.
pub fn trim(raster: &Raster, columns: usize, rows: usize) -> Result<Raster, LabError> {
    if columns >= raster.width() || rows >= raster.height() {
        return Err(LabError::InvalidTrim {
            columns,
            rows,
            width: raster.width(),
            height: raster.height(),
        });
    }
    if columns == 0 && rows == 0 {
        return Ok(raster.clone());
    }

    let width = raster.width() - columns;
    let height = raster.height() - rows;
    let mut pixels = Vec::with_capacity(width * height);
    for row in rows..raster.height() {
        pixels.extend_from_slice(&raster.row(row)[columns..]);
    }
    Raster::new(width, height, pixels)
}
