//! Progressive reveal of the image in step with playback.

use std::sync::{Arc, Mutex, PoisonError};

/// Receives a growing prefix of the raster's codewords.
///
/// Before chord `r` sounds, the feed gets rows `0..=r` (`(r + 1) * width` codewords).
pub trait SyncFeed {
    fn synchronize(&mut self, width: usize, height: usize, prefix: &[u32]);
}

impl<F: SyncFeed + ?Sized> SyncFeed for Box<F> {
    fn synchronize(&mut self, width: usize, height: usize, prefix: &[u32]) {
        (**self).synchronize(width, height, prefix);
    }
}

#[derive(Debug, Default)]
struct RevealState {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
    updates: usize,
}

/// Keeps the latest revealed prefix. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RevealBuffer {
    state: Arc<Mutex<RevealState>>,
}

impl RevealBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Codewords revealed so far.
    pub fn pixels(&self) -> Vec<u32> {
        self.lock().pixels.clone()
    }

    /// Number of complete rows revealed so far.
    pub fn rows_revealed(&self) -> usize {
        let state = self.lock();
        if state.width == 0 {
            0
        } else {
            state.pixels.len() / state.width
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        let state = self.lock();
        (state.width, state.height)
    }

    pub fn updates(&self) -> usize {
        self.lock().updates
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RevealState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SyncFeed for RevealBuffer {
    fn synchronize(&mut self, width: usize, height: usize, prefix: &[u32]) {
        let mut state = self.lock();
        state.width = width;
        state.height = height;
        state.pixels.clear();
        state.pixels.extend_from_slice(prefix);
        state.updates += 1;
    }
}

/// Logs each revealed row instead of drawing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFeed;

impl SyncFeed for LogFeed {
    fn synchronize(&mut self, width: usize, height: usize, prefix: &[u32]) {
        let rows = if width == 0 { 0 } else { prefix.len() / width };
        log::info!("reveal: {}/{} rows", rows, height);
    }
}
