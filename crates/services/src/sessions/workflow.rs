use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use lingo_core::model::SessionContext;
use lingo_core::{Clock, SessionConfig};
use storage::repository::{ContentProvider, ContentRequest, ProgressStore};

use super::driver::SessionDriver;
use super::engine::SessionEngine;
use crate::audio::AudioPlayer;
use crate::error::SessionError;

/// Orchestrates session start: fetches items from the content provider and
/// wires a driver to the progress store and audio player.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    config: SessionConfig,
    content: Arc<dyn ContentProvider>,
    progress: Arc<dyn ProgressStore>,
    audio: Arc<dyn AudioPlayer>,
    seed: Option<u64>,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        config: SessionConfig,
        content: Arc<dyn ContentProvider>,
        progress: Arc<dyn ProgressStore>,
        audio: Arc<dyn AudioPlayer>,
    ) -> Self {
        Self {
            clock,
            config,
            content,
            progress,
            audio,
            seed: None,
        }
    }

    /// Use a fixed seed for item shuffling, question rolls, and options.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fetch items for the context's category and start a session over them.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the category has no items, or
    /// `SessionError::Storage` if the content provider fails.
    pub async fn start_session(&self, context: SessionContext) -> Result<SessionDriver, SessionError> {
        let mut items = self
            .content
            .fetch_items(ContentRequest {
                category_id: context.category_id,
                desired_count: self.config.item_count(),
            })
            .await?;
        if items.is_empty() {
            return Err(SessionError::Empty);
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        if self.config.shuffle_items() {
            items.as_mut_slice().shuffle(&mut rng);
        }

        let engine = SessionEngine::new(context, self.config)
            .with_clock(self.clock)
            .with_rng(rng);
        let mut driver =
            SessionDriver::new(engine, Arc::clone(&self.progress), Arc::clone(&self.audio));
        driver.start(items);

        tracing::info!(
            session_id = %driver.engine().id(),
            user_id = %context.user_id,
            category_id = %context.category_id,
            items = driver.engine().items().len(),
            "session ready"
        );
        Ok(driver)
    }
}
