//! # Image Lab
//!
//! A session object holding the images a user works on, their identifiers and
//! at most one running playback per image.
//!
//! ## Purpose
//! Every image opened or derived in a session gets a fresh [`ImageId`], counted
//! per lab. Codec operations never mutate a stored raster: grayscale conversion
//! and plane packing produce new images, and plane access hands out copies.
//!
//! ## Example
//! ```rust
//! use imagelab::{ImageLab, Raster, SonifyConfig};
//! use imagelab::sound::{Pacing, RecordingSink};
//!
//! let config = SonifyConfig { pacing: Pacing::Offline, ..SonifyConfig::default() };
//! let mut lab = ImageLab::new(config);
//! let id = lab.insert(Raster::filled(3, 2, 0xFF204060));
//! let gray = lab.grayscale(id)?;
//! assert_ne!(id, gray);
//!
//! let sink = RecordingSink::new();
//! lab.play(gray, Some(Box::new(sink.clone())), None)?;
//! let report = lab.wait(gray)?.expect("playback was started");
//! assert_eq!(report.chords_played, 2);
//! # Ok::<(), imagelab::LabError>(())
//! ```
//!
//! ## Related Modules
//! - `crate::codec` - Packing, grayscale and trim
//! - `crate::sound` - Sonifier and playback engine

use crate::codec;
use crate::config::SonifyConfig;
use crate::error::LabError;
use crate::raster::{ImageId, Plane, Planes, Raster};
use crate::source;
use crate::sound::{
    OutputSink, PlaybackEngine, PlaybackHandle, PlaybackReport, Reveal, Sonifier, SyncFeed, Tune,
};
use std::collections::HashMap;
use std::path::Path;

pub struct ImageLab {
    config: SonifyConfig,
    sonifier: Sonifier,
    images: HashMap<ImageId, Raster>,
    playbacks: HashMap<ImageId, PlaybackHandle>,
    next_id: u64,
}

impl Default for ImageLab {
    fn default() -> Self {
        Self::new(SonifyConfig::default())
    }
}

impl ImageLab {
    pub fn new(config: SonifyConfig) -> Self {
        Self {
            sonifier: Sonifier::new(&config),
            config,
            images: HashMap::new(),
            playbacks: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &SonifyConfig {
        &self.config
    }

    /// Load an image file, applying the configured trim.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<ImageId, LabError> {
        let raster =
            source::load_trimmed(path, self.config.trim_columns, self.config.trim_rows)?;
        Ok(self.insert(raster))
    }

    pub fn insert(&mut self, raster: Raster) -> ImageId {
        let id = ImageId(self.next_id);
        self.next_id += 1;
        log::debug!("lab: {} is {}x{}", id, raster.width(), raster.height());
        self.images.insert(id, raster);
        id
    }

    pub fn get(&self, id: ImageId) -> Result<&Raster, LabError> {
        self.images.get(&id).ok_or(LabError::UnknownImage(id))
    }

    /// Ids of every held image, in creation order.
    pub fn ids(&self) -> Vec<ImageId> {
        let mut ids: Vec<ImageId> = self.images.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Drop an image, stopping its playback first.
    ///
    /// If the playback thread failed the error is returned and the image stays.
    pub fn remove(&mut self, id: ImageId) -> Result<Raster, LabError> {
        if !self.images.contains_key(&id) {
            return Err(LabError::UnknownImage(id));
        }
        if let Some(handle) = self.playbacks.remove(&id) {
            handle.stop_and_join()?;
        }
        self.images.remove(&id).ok_or(LabError::UnknownImage(id))
    }

    /// Fresh copies of the four channel planes.
    pub fn planes(&self, id: ImageId) -> Result<Planes, LabError> {
        Ok(codec::unpack(self.get(id)?))
    }

    /// Pack four planes into a new image.
    pub fn set_planes(&mut self, planes: &Planes) -> Result<ImageId, LabError> {
        let raster = codec::pack_planes(planes)?;
        Ok(self.insert(raster))
    }

    /// Grayscale copy of an image as a new image.
    pub fn grayscale(&mut self, id: ImageId) -> Result<ImageId, LabError> {
        let gray = codec::to_grayscale(self.get(id)?);
        Ok(self.insert(gray))
    }

    pub fn grayscale_plane(&self, id: ImageId) -> Result<Plane, LabError> {
        Ok(codec::grayscale_plane(self.get(id)?))
    }

    pub fn sonify(&self, id: ImageId) -> Result<Tune, LabError> {
        self.sonifier.run(self.get(id)?)
    }

    /// Sonify an image and play it in the background.
    ///
    /// Without a sink the playback is degraded but the reveal still advances.
    ///
    /// # Errors
    /// [`LabError::PlaybackActive`] if this image is already playing.
    pub fn play(
        &mut self,
        id: ImageId,
        sink: Option<Box<dyn OutputSink + Send>>,
        feed: Option<Box<dyn SyncFeed + Send>>,
    ) -> Result<(), LabError> {
        self.reap(id);
        if self.playbacks.contains_key(&id) {
            return Err(LabError::PlaybackActive(id));
        }

        let raster = self.get(id)?;
        let tune = self.sonifier.run(raster)?;
        let reveal = feed.map(|feed| Reveal::new(raster.clone(), feed));

        let handle = PlaybackEngine::new(sink, &self.config).spawn(tune, reveal)?;
        log::info!("lab: playing {}", id);
        self.playbacks.insert(id, handle);
        Ok(())
    }

    /// Whether a playback for `id` is still running.
    pub fn is_playing(&self, id: ImageId) -> bool {
        self.playbacks
            .get(&id)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Request a stop and wait for the playback to finish.
    ///
    /// Returns `None` if nothing was playing.
    pub fn stop(&mut self, id: ImageId) -> Result<Option<PlaybackReport>, LabError> {
        self.playbacks
            .remove(&id)
            .map(PlaybackHandle::stop_and_join)
            .transpose()
    }

    /// Wait for the playback of `id` to end on its own.
    ///
    /// Returns `None` if nothing was playing.
    ///
    /// # Errors
    /// [`LabError::UnknownImage`] if `id` names no image.
    pub fn wait(&mut self, id: ImageId) -> Result<Option<PlaybackReport>, LabError> {
        self.get(id)?;
        self.playbacks
            .remove(&id)
            .map(PlaybackHandle::join)
            .transpose()
    }

    pub fn save(&self, id: ImageId, path: impl AsRef<Path>) -> Result<(), LabError> {
        source::save_png(self.get(id)?, path)
    }

    /// Forget a finished playback so the image can play again.
    fn reap(&mut self, id: ImageId) {
        if self
            .playbacks
            .get(&id)
            .is_some_and(PlaybackHandle::is_finished)
        {
            if let Some(Err(e)) = self.playbacks.remove(&id).map(PlaybackHandle::join) {
                log::warn!("lab: previous playback of {} failed: {}", id, e);
            }
        }
    }
}
