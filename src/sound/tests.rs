use super::types::MAX_PITCH;
use super::*;
use crate::config::SonifyConfig;
use crate::error::LabError;
use crate::raster::Raster;
use std::time::Duration;

fn offline_config() -> SonifyConfig {
    SonifyConfig {
        pacing: Pacing::Offline,
        ..SonifyConfig::default()
    }
}

fn recording_engine() -> (PlaybackEngine, RecordingSink) {
    let sink = RecordingSink::new();
    let engine = PlaybackEngine::with_sink(sink.clone(), &offline_config());
    (engine, sink)
}

fn single_channel_tune(pitches: &[Pitch]) -> Tune {
    pitches
        .iter()
        .map(|&p| {
            let note = if p < 0 {
                Note::null(0)
            } else {
                Note::new(0, p, 100, 80)
            };
            Chord::new().with_note(note)
        })
        .collect()
}

fn count_on(events: &[SinkEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SinkEvent::NoteOn { .. }))
        .count()
}

fn count_off(events: &[SinkEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SinkEvent::NoteOff { .. }))
        .count()
}

#[test]
fn test_identical_pitches_sustain() {
    let (mut engine, sink) = recording_engine();
    let report = engine.run(&single_channel_tune(&[60, 60, 60]), None);

    assert_eq!(report.chords_played, 3);
    assert_eq!(
        sink.note_events(),
        vec![
            SinkEvent::NoteOn {
                channel: 0,
                pitch: 60,
                velocity: 80
            },
            SinkEvent::NoteOff {
                channel: 0,
                pitch: 60,
                velocity: 80
            },
        ]
    );
}

#[test]
fn test_pitch_change_retriggers() {
    let (mut engine, sink) = recording_engine();
    engine.run(&single_channel_tune(&[60, 63, 63, 60]), None);

    let events = sink.note_events();
    assert_eq!(count_on(&events), 3);
    assert_eq!(count_off(&events), 3);
    // off for the old pitch precedes on for the new one
    assert_eq!(
        events[1],
        SinkEvent::NoteOff {
            channel: 0,
            pitch: 60,
            velocity: 80
        }
    );
    assert!(matches!(events[2], SinkEvent::NoteOn { pitch: 63, .. }));
}

#[test]
fn test_null_note_silences_channel() {
    let (mut engine, sink) = recording_engine();
    engine.start();
    engine.play_chord(&Chord::new().with_note(Note::new(0, 67, 100, 90)));
    sink.clear();

    engine.play_chord(&Chord::new().with_note(Note::null(0)));

    assert_eq!(
        sink.events(),
        vec![SinkEvent::NoteOff {
            channel: 0,
            pitch: 67,
            velocity: 90
        }]
    );
    assert!(engine.history()[0].is_null());
    assert!(!engine.is_sounding());

    // a second null note has nothing left to silence
    engine.play_chord(&Chord::new().with_note(Note::null(0)));
    assert_eq!(sink.events().len(), 1);
}

#[test]
fn test_null_note_then_same_pitch_restarts() {
    let (mut engine, sink) = recording_engine();
    engine.run(&single_channel_tune(&[60, -1, 60]), None);

    let events = sink.note_events();
    assert_eq!(count_on(&events), 2);
    assert_eq!(count_off(&events), 2);
}

#[test]
fn test_out_of_range_pitches_never_reach_sink() {
    let (mut engine, sink) = recording_engine();
    engine.start();
    engine.play_chord(&Chord::new().with_note(Note::new(0, 60, 100, 80)));
    sink.clear();

    // any negative pitch silences the channel
    let below = Note {
        channel: 0,
        pitch: -2,
        duration_ms: 100,
        velocity: 80,
    };
    engine.play_chord(&Chord::new().with_note(below));
    assert_eq!(
        sink.events(),
        vec![SinkEvent::NoteOff {
            channel: 0,
            pitch: 60,
            velocity: 80
        }]
    );
    assert!(!engine.is_sounding());

    // pitches above the MIDI range are clamped before the note-on
    let above = Note {
        channel: 0,
        pitch: 300,
        duration_ms: 100,
        velocity: 200,
    };
    engine.play_chord(&Chord::new().with_note(above));
    assert_eq!(
        sink.events()[1],
        SinkEvent::NoteOn {
            channel: 0,
            pitch: MAX_PITCH,
            velocity: 127
        }
    );
    assert!(sink
        .note_events()
        .iter()
        .all(|e| !matches!(e, SinkEvent::NoteOn { pitch, .. } if !(0..=MAX_PITCH).contains(pitch))));
}

#[test]
fn test_end_of_tune_cleanup() {
    let raster = Raster::new(
        2,
        3,
        vec![
            0xFF000000, 0xFF102030, 0xFFFF0000, 0xFF00FF00, 0xFF0000FF, 0xFFFFFFFF,
        ],
    )
    .unwrap();
    let tune = Sonifier::default().run(&raster).unwrap();

    let (mut engine, sink) = recording_engine();
    engine.run(&tune, None);

    for channel in 0..3 {
        let mut sounding: Option<Pitch> = None;
        for event in sink.note_events().iter().filter(|e| e.channel() == channel) {
            match *event {
                SinkEvent::NoteOn { pitch, .. } => {
                    assert_eq!(sounding, None, "note-on while channel {} sounds", channel);
                    sounding = Some(pitch);
                }
                SinkEvent::NoteOff { pitch, .. } => {
                    assert_eq!(sounding, Some(pitch));
                    sounding = None;
                }
                SinkEvent::ProgramChange { .. } => {}
            }
        }
        assert_eq!(sounding, None, "channel {} left sounding", channel);
    }
    assert!(engine.history().is_empty());
}

#[test]
fn test_program_changes_sent_at_start() {
    let (mut engine, sink) = recording_engine();
    engine.run(&single_channel_tune(&[60]), None);

    let programs: Vec<SinkEvent> = sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, SinkEvent::ProgramChange { .. }))
        .collect();
    assert_eq!(
        programs,
        vec![
            SinkEvent::ProgramChange {
                channel: 0,
                program: 11
            },
            SinkEvent::ProgramChange {
                channel: 1,
                program: 45
            },
            SinkEvent::ProgramChange {
                channel: 2,
                program: 117
            },
        ]
    );
}

#[test]
fn test_channels_beyond_sink_are_skipped() {
    let sink = RecordingSink::with_channels(1);
    let mut engine = PlaybackEngine::with_sink(sink.clone(), &offline_config());
    let tune: Tune = vec![Chord::new()
        .with_note(Note::new(0, 60, 100, 64))
        .with_note(Note::new(1, 62, 100, 64))]
    .into_iter()
    .collect();

    engine.run(&tune, None);

    assert!(sink.events().iter().all(|e| e.channel() == 0));
    assert_eq!(sink.note_events().len(), 2);
}

#[test]
fn test_wait_is_shortest_started_note() {
    let (mut engine, _sink) = recording_engine();
    engine.start();
    let chord = Chord::new()
        .with_note(Note::new(0, 60, 300, 64))
        .with_note(Note::new(1, 62, 120, 64));
    assert_eq!(engine.play_chord(&chord), Duration::from_millis(120));

    // nothing changed: default duration
    let wait = engine.play_chord(&chord);
    assert_eq!(
        wait,
        Duration::from_millis(SonifyConfig::default().note_duration_ms as u64)
    );

    // only channel 0 restarts; its duration alone counts
    let next = Chord::new()
        .with_note(Note::new(0, 65, 300, 64))
        .with_note(Note::new(1, 62, 120, 64));
    assert_eq!(engine.play_chord(&next), Duration::from_millis(300));
}

#[test]
fn test_offline_pacing_advances_sink_clock() {
    let sink = MidiFileSink::new();
    let mut engine = PlaybackEngine::with_sink(sink.clone(), &offline_config());
    engine.run(&single_channel_tune(&[60, 62, 64]), None);
    assert_eq!(sink.elapsed(), Duration::from_millis(300));
}

#[test]
fn test_degrades_without_sink_and_still_reveals() {
    let raster = Raster::filled(3, 4, 0xFF336699);
    let tune = Sonifier::default().run(&raster).unwrap();
    let buffer = RevealBuffer::new();
    let mut reveal = Reveal::new(raster.clone(), buffer.clone());

    let mut engine = PlaybackEngine::silent(&offline_config());
    let report = engine.run(&tune, Some(&mut reveal));

    assert_eq!(report.degraded, Some(LabError::NoOutputSink));
    assert_eq!(report.chords_played, 4);
    assert!(!report.stopped);
    assert_eq!(buffer.updates(), 4);
    assert_eq!(buffer.pixels(), raster.pixels());
}

/// Feed that snapshots the recording sink each time it is synchronized.
struct OrderFeed {
    sink: RecordingSink,
    seen: std::sync::Arc<std::sync::Mutex<Vec<(usize, usize)>>>,
}

impl SyncFeed for OrderFeed {
    fn synchronize(&mut self, width: usize, _height: usize, prefix: &[u32]) {
        let rows = prefix.len() / width;
        let ons = count_on(&self.sink.note_events());
        self.seen.lock().unwrap().push((rows, ons));
    }
}

#[test]
fn test_reveal_precedes_audio() {
    let raster = Raster::new(1, 3, vec![0xFF000000, 0xFFFFFFFF, 0xFF000000]).unwrap();
    let tune = Sonifier::default().run(&raster).unwrap();

    let sink = RecordingSink::new();
    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let feed = OrderFeed {
        sink: sink.clone(),
        seen: seen.clone(),
    };
    let mut reveal = Reveal::new(raster, feed);
    let mut engine = PlaybackEngine::with_sink(sink, &offline_config());
    engine.run(&tune, Some(&mut reveal));

    // row r is shown before chord r's note-ons (three per row here)
    assert_eq!(*seen.lock().unwrap(), vec![(1, 0), (2, 3), (3, 6)]);
}

/// Feed that panics once `fail_at` rows are shown.
struct PanickingFeed {
    fail_at: usize,
}

impl SyncFeed for PanickingFeed {
    fn synchronize(&mut self, width: usize, _height: usize, prefix: &[u32]) {
        if prefix.len() / width >= self.fail_at {
            panic!("feed failed at row {}", self.fail_at);
        }
    }
}

#[test]
fn test_panicking_feed_still_silences_channels() {
    let raster = Raster::new(1, 3, vec![0xFF000000, 0xFFFFFFFF, 0xFF000000]).unwrap();
    let tune = Sonifier::default().run(&raster).unwrap();

    let sink = RecordingSink::new();
    let reveal = Reveal::new(raster, PanickingFeed { fail_at: 2 });
    let handle = PlaybackEngine::with_sink(sink.clone(), &offline_config())
        .spawn(tune, Some(reveal))
        .unwrap();

    let err = handle.join().unwrap_err();
    assert!(matches!(err, LabError::PlaybackThread(_)));

    // the first chord started all three voices; each got its note-off
    let events = sink.note_events();
    assert_eq!(count_on(&events), 3);
    assert_eq!(count_off(&events), 3);
}

#[test]
fn test_panic_on_calling_thread_is_reraised_after_silence() {
    let tune = single_channel_tune(&[60, 62, 64]);
    let raster = Raster::filled(1, 3, 0xFF000000);
    let sink = RecordingSink::new();
    let mut engine = PlaybackEngine::with_sink(sink.clone(), &offline_config());

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut reveal = Reveal::new(raster, PanickingFeed { fail_at: 3 });
        engine.run(&tune, Some(&mut reveal))
    }));

    assert!(result.is_err());
    assert!(!engine.is_sounding());
    let events = sink.note_events();
    assert_eq!(count_on(&events), 2);
    assert_eq!(count_on(&events), count_off(&events));
}

#[test]
fn test_stop_from_handle() {
    let long: Vec<Pitch> = (0..200).map(|i| 40 + (i % 2) as Pitch).collect();
    let tune = single_channel_tune(&long);

    let sink = RecordingSink::new();
    let config = SonifyConfig {
        pacing: Pacing::RealTime,
        ..SonifyConfig::default()
    };
    let engine = PlaybackEngine::with_sink(sink.clone(), &config);
    let handle = engine.spawn(tune, None).unwrap();

    std::thread::sleep(Duration::from_millis(30));
    let report = handle.stop_and_join().unwrap();

    assert!(report.stopped);
    assert!(report.chords_played < 200);
    let events = sink.note_events();
    assert_eq!(count_on(&events), count_off(&events));
}

#[test]
fn test_join_waits_for_natural_end() {
    let sink = RecordingSink::new();
    let engine = PlaybackEngine::with_sink(sink.clone(), &offline_config());
    let handle = engine.spawn(single_channel_tune(&[60, 62]), None).unwrap();

    let report = handle.join().unwrap();
    assert_eq!(report.chords_played, 2);
    assert!(!report.stopped);
    assert_eq!(sink.note_events().len(), 4);
}

#[test]
fn test_dropping_handle_stops_playback() {
    let long: Vec<Pitch> = (0..200).map(|i| 50 + (i % 3) as Pitch).collect();
    let sink = RecordingSink::new();
    let config = SonifyConfig {
        pacing: Pacing::RealTime,
        ..SonifyConfig::default()
    };
    let handle = PlaybackEngine::with_sink(sink.clone(), &config)
        .spawn(single_channel_tune(&long), None)
        .unwrap();
    drop(handle);

    // the detached thread notices the disconnect within one chord
    std::thread::sleep(Duration::from_millis(400));
    let events = sink.note_events();
    assert!(count_on(&events) < 200);
    assert_eq!(count_on(&events), count_off(&events));
}
