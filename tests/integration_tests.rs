//! Integration tests for the imagelab pipeline
//!
//! Decode a real PNG, sonify it, play it offline and export the result.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imagelab::sound::{
    Pacing, PlaybackEngine, RecordingSink, Reveal, RevealBuffer, SinkEvent, Sonifier,
};
use imagelab::{codec, source, ImageLab, LabError, Raster, SonifyConfig};
use std::io::Cursor;

fn offline() -> SonifyConfig {
    SonifyConfig {
        pacing: Pacing::Offline,
        ..SonifyConfig::default()
    }
}

/// 4x3 gradient: black, mid gray, white rows.
fn gradient_png() -> Vec<u8> {
    let image = RgbaImage::from_fn(4, 3, |_, y| {
        let v = [0, 127, 255][y as usize];
        Rgba([v, v, v, 255])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn test_png_to_tune() {
    let raster = source::decode_raster(&gradient_png()).unwrap();
    assert_eq!((raster.width(), raster.height()), (4, 3));

    let tune = imagelab::sonify_raster(&raster, &offline()).unwrap();
    assert_eq!(tune.chord_count(), 3);

    let red: Vec<i16> = tune
        .iter()
        .map(|c| c.note_on(0).unwrap().pitch)
        .collect();
    assert_eq!(red[0], 24);
    assert_eq!(red[2], 106);
    assert!(red[0] < red[1] && red[1] < red[2]);
}

#[test]
fn test_white_image_example() {
    let white = Raster::filled(2, 2, 0xFFFFFFFF);
    assert_eq!(codec::to_grayscale(&white), white);

    let tune = Sonifier::default().run(&white).unwrap();
    assert_eq!(tune.chord_count(), 2);
    for chord in &tune {
        assert_eq!(chord.num_voices(), 3);
        assert!(chord.iter().all(|n| n.pitch == 106));
        // brightness is 1 for white
        assert_eq!(chord.note_on(2).unwrap().velocity, 127);
    }
}

#[test]
fn test_codec_round_trip_through_png() {
    let raster = Raster::new(
        3,
        1,
        vec![0x80102030, 0xFFFFFFFF, 0x00000000],
    )
    .unwrap();
    let path = std::env::temp_dir().join(format!("imagelab-it-{}.png", std::process::id()));

    source::save_png(&raster, &path).unwrap();
    let loaded = source::load_raster(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded, raster);
    assert_eq!(codec::pack_planes(&codec::unpack(&loaded)).unwrap(), raster);
}

#[test]
fn test_offline_playback_is_balanced_and_revealed() {
    let raster = source::decode_raster(&gradient_png()).unwrap();
    let tune = imagelab::sonify_raster(&raster, &offline()).unwrap();

    let sink = RecordingSink::new();
    let buffer = RevealBuffer::new();
    let mut reveal = Reveal::new(raster.clone(), buffer.clone());
    let report = PlaybackEngine::with_sink(sink.clone(), &offline()).run(&tune, Some(&mut reveal));

    assert_eq!(report.chords_played, 3);
    assert_eq!(report.degraded, None);
    assert_eq!(buffer.rows_revealed(), 3);

    let events = sink.note_events();
    let ons = events
        .iter()
        .filter(|e| matches!(e, SinkEvent::NoteOn { .. }))
        .count();
    let offs = events.len() - ons;
    // three rows of distinct gray: every chord retriggers all three voices
    assert_eq!(ons, 9);
    assert_eq!(offs, 9);
}

#[test]
fn test_exports() {
    let raster = source::decode_raster(&gradient_png()).unwrap();
    let config = offline();
    let tune = imagelab::sonify_raster(&raster, &config).unwrap();

    let midi = imagelab::render_midi(&tune, &config).unwrap();
    assert_eq!(&midi[..4], b"MThd");
    let smf = midly::Smf::parse(&midi).unwrap();
    assert_eq!(smf.tracks.len(), 1);

    let xml = imagelab::export_musicxml(&tune, "Gradient & Co", &config);
    assert!(xml.contains("<work-title>Gradient &amp; Co</work-title>"));
    assert_eq!(xml.matches("<part id=").count(), 3);
}

#[test]
fn test_compile_entry_points() {
    let path = std::env::temp_dir().join(format!("imagelab-compile-{}.png", std::process::id()));
    std::fs::write(&path, gradient_png()).unwrap();
    let config = offline();

    let midi = imagelab::compile(&path, &config);
    let xml = imagelab::compile_score(&path, &config);
    let _ = std::fs::remove_file(&path);

    let midi = midi.unwrap();
    let smf = midly::Smf::parse(&midi).unwrap();
    assert_eq!(smf.tracks.len(), 1);

    let xml = xml.unwrap();
    let title = format!("<work-title>imagelab-compile-{}</work-title>", std::process::id());
    assert!(xml.contains(&title));
    assert_eq!(xml.matches("<part id=").count(), 3);

    let err = imagelab::compile("/nonexistent/imagelab/input.png", &config).unwrap_err();
    assert!(matches!(err, LabError::ImageLoadFailed { .. }));
}

#[test]
fn test_load_failure_stops_pipeline() {
    let err = imagelab::sonify_file("/nonexistent/imagelab/input.png", &offline()).unwrap_err();
    assert!(matches!(err, LabError::ImageLoadFailed { .. }));
}

#[test]
fn test_lab_session() {
    let path = std::env::temp_dir().join(format!("imagelab-session-{}.png", std::process::id()));
    std::fs::write(&path, gradient_png()).unwrap();

    let mut lab = ImageLab::new(SonifyConfig {
        trim_rows: 1,
        ..offline()
    });
    let id = lab.open(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(lab.get(id).unwrap().height(), 2);
    let tune = lab.sonify(id).unwrap();
    assert_eq!(tune.chord_count(), 2);

    let sink = RecordingSink::new();
    lab.play(id, Some(Box::new(sink.clone())), None).unwrap();
    let report = lab.wait(id).unwrap().unwrap();
    assert_eq!(report.chords_played, 2);
    assert!(!sink.note_events().is_empty());
}
