//! Audio playback seam for pronunciation clips.

use async_trait::async_trait;
use thiserror::Error;

use lingo_core::model::MediaRef;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AudioError {
    #[error("playback failed: {0}")]
    Playback(String),
}

/// Plays one clip to completion. Dropping the future stops playback.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// # Errors
    ///
    /// Returns `AudioError` if the clip cannot be loaded or played.
    async fn play(&self, media: &MediaRef) -> Result<(), AudioError>;
}

/// Player for hosts without audio output; only logs the cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAudioPlayer;

#[async_trait]
impl AudioPlayer for SilentAudioPlayer {
    async fn play(&self, media: &MediaRef) -> Result<(), AudioError> {
        tracing::debug!(%media, "audio cue (silent)");
        Ok(())
    }
}
