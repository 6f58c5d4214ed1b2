pub mod api;
pub mod codec;
pub mod color;
pub mod config;
pub mod error;
pub mod lab;
pub mod musicxml;
pub mod raster;
pub mod sound;
pub mod source;

pub use api::{export_musicxml, render_midi, sonify_file, sonify_raster};
pub use config::{load_config, SonifyConfig};
pub use error::*;
pub use lab::ImageLab;
pub use musicxml::tune_to_musicxml;
pub use raster::{Channel, ImageId, Plane, Planes, Raster};

use std::path::Path;

/// Sonify an image file and render the tune as Standard MIDI File bytes.
/// This is the main entry point for the library.
pub fn compile(path: impl AsRef<Path>, config: &SonifyConfig) -> Result<Vec<u8>, LabError> {
    let tune = sonify_file(path, config)?;
    render_midi(&tune, config)
}

/// Sonify an image file to a MusicXML score titled after the file name.
pub fn compile_score(path: impl AsRef<Path>, config: &SonifyConfig) -> Result<String, LabError> {
    let path = path.as_ref();
    let tune = sonify_file(path, config)?;
    let title = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(export_musicxml(&tune, &title, config))
}
