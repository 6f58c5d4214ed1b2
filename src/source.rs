//! Raster files: decoding into [`Raster`] and lossless PNG export.
//!
//! Decoding is synchronous; dimensions and pixels come back together.

use crate::codec::{self, decode, encode, Argb};
use crate::error::LabError;
use crate::raster::Raster;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader};
use std::io::{BufRead, Cursor, Seek};
use std::path::Path;

/// Decode an image file in any format the `image` crate recognises.
pub fn load_raster(path: impl AsRef<Path>) -> Result<Raster, LabError> {
    let path = path.as_ref();
    let source_name = path.display().to_string();
    let reader = ImageReader::open(path).map_err(|e| LabError::ImageLoadFailed {
        source_name: source_name.clone(),
        message: e.to_string(),
    })?;
    let raster = read(reader, &source_name)?;
    log::info!(
        "load_raster: {} ({}x{})",
        source_name,
        raster.width(),
        raster.height()
    );
    Ok(raster)
}

/// Decode an image file and skip `columns` columns and `rows` rows from its
/// top-left corner.
pub fn load_trimmed(
    path: impl AsRef<Path>,
    columns: usize,
    rows: usize,
) -> Result<Raster, LabError> {
    let raster = load_raster(path)?;
    if columns == 0 && rows == 0 {
        return Ok(raster);
    }
    codec::trim(&raster, columns, rows)
}

/// Decode an in-memory image.
pub fn decode_raster(bytes: &[u8]) -> Result<Raster, LabError> {
    read(ImageReader::new(Cursor::new(bytes)), "<memory>")
}

fn read<R: BufRead + Seek>(reader: ImageReader<R>, source_name: &str) -> Result<Raster, LabError> {
    let failed = |message: String| LabError::ImageLoadFailed {
        source_name: source_name.to_string(),
        message,
    };

    let image = reader
        .with_guessed_format()
        .map_err(|e| failed(e.to_string()))?
        .decode()
        .map_err(|e| failed(e.to_string()))?;
    from_image(&image)
}

/// Convert a decoded image into ARGB codewords.
pub fn from_image(image: &DynamicImage) -> Result<Raster, LabError> {
    let rgba = image.to_rgba8();
    let (width, height) = (rgba.width() as usize, rgba.height() as usize);
    let pixels = rgba
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            encode(Argb::new(a, r, g, b))
        })
        .collect();
    Raster::new(width, height, pixels)
}

/// RGBA bytes of a raster, row-major.
pub fn to_rgba_bytes(raster: &Raster) -> Vec<u8> {
    raster
        .pixels()
        .iter()
        .flat_map(|&codeword| {
            let p = decode(codeword);
            [p.red, p.green, p.blue, p.alpha]
        })
        .collect()
}

/// Write a raster as an RGBA PNG.
pub fn save_png(raster: &Raster, path: impl AsRef<Path>) -> Result<(), LabError> {
    let path = path.as_ref();
    let failed = |message: String| LabError::ImageSaveFailed {
        path: path.display().to_string(),
        message,
    };

    let width = u32::try_from(raster.width()).map_err(|e| failed(e.to_string()))?;
    let height = u32::try_from(raster.height()).map_err(|e| failed(e.to_string()))?;

    let output = std::fs::File::create(path).map_err(|e| failed(e.to_string()))?;
    PngEncoder::new(output)
        .write_image(
            &to_rgba_bytes(raster),
            width,
            height,
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| failed(e.to_string()))?;

    log::info!("save_png: {}", path.display());
    Ok(())
}
