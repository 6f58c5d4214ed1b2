//! Playback engine
//!
//! Walks a [`Tune`] chord by chord, keeping one "currently sounding" note per
//! channel and issuing note-on/note-off commands only when a channel changes.
//!
//! ## Transition Rules (per note `n` on channel `c`)
//! - `n` is the null note: note-off for the sounding note on `c`, if any
//! - `n.pitch` differs from the sounding pitch: note-off (if sounding), then note-on
//! - same pitch: nothing, the tone sustains
//!
//! After each chord the engine waits for the shortest duration among the notes
//! that started in it (the default duration if none did). When the tune ends or a
//! stop is requested, every sounding channel gets its note-off.

use super::sink::OutputSink;
use super::sync::SyncFeed;
use super::types::{Chord, Note, Pacing, Tune};
use crate::config::SonifyConfig;
use crate::error::LabError;
use crate::raster::Raster;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::panic::{self, AssertUnwindSafe};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// An image revealed row by row while its tune plays.
pub struct Reveal {
    raster: Raster,
    feed: Box<dyn SyncFeed + Send>,
}

impl Reveal {
    pub fn new(raster: Raster, feed: impl SyncFeed + Send + 'static) -> Self {
        Self {
            raster,
            feed: Box::new(feed),
        }
    }

    fn show_rows(&mut self, rows: usize) {
        let prefix = self.raster.prefix_rows(rows);
        self.feed
            .synchronize(self.raster.width(), self.raster.height(), prefix);
    }
}

/// Outcome of one playback.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackReport {
    pub chords_played: usize,
    /// True when a stop request ended playback before the tune was exhausted.
    pub stopped: bool,
    /// Set when playback ran without sound, e.g. [`LabError::NoOutputSink`].
    pub degraded: Option<LabError>,
}

pub struct PlaybackEngine {
    sink: Option<Box<dyn OutputSink + Send>>,
    history: Vec<Note>,
    instruments: Vec<u8>,
    default_duration: Duration,
    pacing: Pacing,
    warned_channels: Vec<usize>,
}

impl PlaybackEngine {
    pub fn new(sink: Option<Box<dyn OutputSink + Send>>, config: &SonifyConfig) -> Self {
        Self {
            sink,
            history: Vec::new(),
            instruments: config.instruments.clone(),
            default_duration: Duration::from_millis(config.note_duration_ms as u64),
            pacing: config.pacing,
            warned_channels: Vec::new(),
        }
    }

    pub fn with_sink(sink: impl OutputSink + Send + 'static, config: &SonifyConfig) -> Self {
        Self::new(Some(Box::new(sink)), config)
    }

    /// An engine with no synthesizer; playback is degraded but still paced.
    pub fn silent(config: &SonifyConfig) -> Self {
        Self::new(None, config)
    }

    pub fn pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Currently sounding note per channel (null notes for silent channels).
    pub fn history(&self) -> &[Note] {
        &self.history
    }

    /// Whether any channel is currently sounding.
    pub fn is_sounding(&self) -> bool {
        self.history.iter().any(|n| !n.is_null())
    }

    /// Reset channel history and select instruments.
    pub fn start(&mut self) {
        self.history.clear();
        let Some(sink) = self.sink.as_mut() else {
            return;
        };

        let channels = sink.channel_count();
        let available = sink.available_instruments();
        for (channel, &program) in self.instruments.iter().enumerate() {
            if channel >= channels {
                log::warn!(
                    "playback: sink has {} channels, no instrument for channel {}",
                    channels,
                    channel
                );
                continue;
            }
            if !available.iter().any(|i| i.program == program) {
                log::warn!("playback: program {} not offered by the sink", program);
                continue;
            }
            sink.program_change(channel, program);
        }
    }

    /// Apply one chord to the channel state and return how long to wait before
    /// the next one.
    pub fn play_chord(&mut self, chord: &Chord) -> Duration {
        let mut wait: Option<Duration> = None;

        for note in chord {
            let note = &note.normalized();
            let channel = note.channel;
            let previous = *self.slot(channel);

            if note.is_null() {
                if !previous.is_null() {
                    self.send_off(&previous);
                    self.history[channel] = Note::null(channel);
                }
            } else if note.pitch != previous.pitch {
                if !previous.is_null() {
                    self.send_off(&previous);
                }
                self.send_on(note);
                self.history[channel] = *note;
                let duration = note.duration();
                wait = Some(wait.map_or(duration, |w| w.min(duration)));
            }
        }

        wait.unwrap_or(self.default_duration)
    }

    /// Note-off on every sounding channel, then clear history.
    pub fn silence(&mut self) {
        let sounding: Vec<Note> = self
            .history
            .iter()
            .filter(|n| !n.is_null())
            .copied()
            .collect();
        for note in &sounding {
            self.send_off(note);
        }
        self.history.clear();
    }

    /// Play a tune on the calling thread until it ends or `stop` fires.
    ///
    /// A message on `stop`, or its sender disconnecting, ends playback after the
    /// current chord. The reveal (if any) is advanced before each chord sounds.
    /// Sounding channels are silenced on every exit, including a panic raised
    /// by the sink or the sync feed, which is re-raised afterwards.
    pub fn play_tune(
        &mut self,
        tune: &Tune,
        reveal: Option<&mut Reveal>,
        stop: &Receiver<()>,
    ) -> PlaybackReport {
        let degraded = if self.sink.is_none() {
            log::warn!("playback: no synthesizer available, playing silently");
            Some(LabError::NoOutputSink)
        } else {
            None
        };

        log::info!("playback: {} chords", tune.chord_count());
        self.start();

        let walked = panic::catch_unwind(AssertUnwindSafe(|| self.walk(tune, reveal, stop)));
        self.silence();
        let (chords_played, stopped) = match walked {
            Ok(progress) => progress,
            Err(payload) => {
                log::error!("playback: aborted by a panic, channels silenced");
                panic::resume_unwind(payload)
            }
        };

        log::info!(
            "playback: finished after {} chords{}",
            chords_played,
            if stopped { " (stopped)" } else { "" }
        );

        PlaybackReport {
            chords_played,
            stopped,
            degraded,
        }
    }

    /// The chord loop. Returns chords played and whether a stop cut it short.
    fn walk(
        &mut self,
        tune: &Tune,
        mut reveal: Option<&mut Reveal>,
        stop: &Receiver<()>,
    ) -> (usize, bool) {
        let mut chords_played = 0;
        for (line, chord) in tune.iter().enumerate() {
            if stop_requested(stop) {
                return (chords_played, true);
            }

            if let Some(reveal) = reveal.as_deref_mut() {
                reveal.show_rows(line + 1);
            }

            log::debug!("[Line {}]", line + 1);
            let wait = self.play_chord(chord);
            chords_played += 1;

            if self.pace(wait, stop) {
                return (chords_played, chords_played < tune.chord_count());
            }
        }
        (chords_played, false)
    }

    /// Play a tune on the calling thread with no way to stop it early.
    pub fn run(&mut self, tune: &Tune, reveal: Option<&mut Reveal>) -> PlaybackReport {
        self.play_tune(tune, reveal, &channel::never())
    }

    /// Play a tune on a named background thread.
    pub fn spawn(
        mut self,
        tune: Tune,
        mut reveal: Option<Reveal>,
    ) -> Result<PlaybackHandle, LabError> {
        let (stop_tx, stop_rx) = channel::bounded(1);
        let join = std::thread::Builder::new()
            .name("imagelab-playback".to_string())
            .spawn(move || self.play_tune(&tune, reveal.as_mut(), &stop_rx))
            .map_err(|e| LabError::PlaybackThread(e.to_string()))?;

        Ok(PlaybackHandle { stop_tx, join })
    }

    /// Wait out one chord. Returns true if a stop was requested meanwhile.
    fn pace(&mut self, wait: Duration, stop: &Receiver<()>) -> bool {
        let (elapsed, stop) = match self.pacing {
            Pacing::RealTime => {
                let started = Instant::now();
                let stop = match stop.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => false,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
                };
                (started.elapsed().min(wait), stop)
            }
            Pacing::Offline => (wait, false),
        };

        if let Some(sink) = self.sink.as_mut() {
            sink.advance(elapsed);
        }
        stop
    }

    fn slot(&mut self, channel: usize) -> &mut Note {
        if channel >= self.history.len() {
            let start = self.history.len();
            self.history.extend((start..=channel).map(Note::null));
        }
        &mut self.history[channel]
    }

    fn audible(&mut self, channel: usize) -> Option<&mut Box<dyn OutputSink + Send>> {
        let sink = self.sink.as_mut()?;
        if channel < sink.channel_count() {
            return Some(sink);
        }
        if !self.warned_channels.contains(&channel) {
            log::warn!(
                "playback: channel {} is beyond the sink's {} channels",
                channel,
                sink.channel_count()
            );
            self.warned_channels.push(channel);
        }
        None
    }

    fn send_on(&mut self, note: &Note) {
        if let Some(sink) = self.audible(note.channel) {
            sink.note_on(note.channel, note.pitch, note.velocity);
        }
    }

    fn send_off(&mut self, note: &Note) {
        if let Some(sink) = self.audible(note.channel) {
            sink.note_off(note.channel, note.pitch, note.velocity);
        }
    }
}

fn stop_requested(stop: &Receiver<()>) -> bool {
    match stop.try_recv() {
        Err(TryRecvError::Empty) => false,
        Ok(()) | Err(TryRecvError::Disconnected) => true,
    }
}

/// Handle to a playback running on its own thread.
///
/// Dropping the handle requests a stop.
pub struct PlaybackHandle {
    stop_tx: Sender<()>,
    join: JoinHandle<PlaybackReport>,
}

impl PlaybackHandle {
    /// Ask the playback to end after the current chord.
    pub fn stop(&self) {
        // full means a stop is already pending
        let _ = self.stop_tx.try_send(());
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Block until playback ends, without stopping it.
    pub fn join(self) -> Result<PlaybackReport, LabError> {
        let PlaybackHandle { stop_tx, join } = self;
        let result = join
            .join()
            .map_err(|_| LabError::PlaybackThread("playback thread panicked".to_string()));
        drop(stop_tx);
        result
    }

    /// Stop and wait for the thread to finish.
    pub fn stop_and_join(self) -> Result<PlaybackReport, LabError> {
        self.stop();
        self.join()
    }
}
