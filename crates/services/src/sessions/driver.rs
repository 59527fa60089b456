use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use lingo_core::model::{LearningItem, ProgressUpdate, SessionSummary};
use storage::repository::ProgressStore;

use super::engine::{Effect, SessionEngine, TimerToken};
use super::view::SessionView;
use crate::audio::AudioPlayer;

/// Something happened in the background that the presentation layer may want
/// to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    /// The auto-advance countdown fired and moved the session on.
    Advanced { completed: bool },
    /// The progress store acknowledged an answer.
    Progress(ProgressUpdate),
}

enum Signal {
    Expired(TimerToken),
    Progress(ProgressUpdate),
}

/// Runs a `SessionEngine` on tokio: schedules auto-advance countdowns and
/// dispatches audio and progress writes as fire-and-forget tasks.
///
/// State transitions stay synchronous; collaborator failures are logged and
/// never reach the engine. Dropping the driver aborts the pending countdown and
/// any playing clip.
pub struct SessionDriver {
    engine: SessionEngine,
    progress: Arc<dyn ProgressStore>,
    audio: Arc<dyn AudioPlayer>,
    signals_tx: mpsc::UnboundedSender<Signal>,
    signals_rx: mpsc::UnboundedReceiver<Signal>,
    timer: Option<(TimerToken, JoinHandle<()>)>,
    audio_task: Option<JoinHandle<()>>,
    writes: Vec<JoinHandle<()>>,
    experience_gained: u64,
    latest_mastery: Option<u8>,
}

impl SessionDriver {
    /// Must be created inside a tokio runtime.
    #[must_use]
    pub fn new(
        engine: SessionEngine,
        progress: Arc<dyn ProgressStore>,
        audio: Arc<dyn AudioPlayer>,
    ) -> Self {
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        Self {
            engine,
            progress,
            audio,
            signals_tx,
            signals_rx,
            timer: None,
            audio_task: None,
            writes: Vec::new(),
            experience_gained: 0,
            latest_mastery: None,
        }
    }

    pub fn start(&mut self, items: Vec<LearningItem>) {
        let effects = self.engine.start(items);
        self.dispatch(effects);
    }

    /// Returns `true` if the answer was accepted.
    pub fn select_answer(&mut self, candidate: &str) -> bool {
        let effects = self.engine.select_answer(candidate);
        self.dispatch_reporting(effects)
    }

    /// Returns `true` if the answer was newly revealed.
    pub fn reveal_answer(&mut self) -> bool {
        let effects = self.engine.reveal_answer();
        self.dispatch_reporting(effects)
    }

    /// Returns `true` if the session moved on.
    pub fn next(&mut self) -> bool {
        let effects = self.engine.next();
        self.dispatch_reporting(effects)
    }

    /// Wait for the next background event. Cancel-safe, so it can sit in a
    /// `tokio::select!` next to user input.
    pub async fn next_event(&mut self) -> Option<DriverEvent> {
        loop {
            let signal = self.signals_rx.recv().await?;
            if let Some(event) = self.handle_signal(signal) {
                return Some(event);
            }
        }
    }

    /// Apply every background event that is already queued, without waiting.
    pub fn drain_ready(&mut self) -> Vec<DriverEvent> {
        let mut events = Vec::new();
        while let Ok(signal) = self.signals_rx.try_recv() {
            if let Some(event) = self.handle_signal(signal) {
                events.push(event);
            }
        }
        events
    }

    /// Wait until every progress write dispatched so far has finished.
    pub async fn flush(&mut self) {
        for handle in self.writes.drain(..) {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "progress write task did not finish");
            }
        }
    }

    /// Abandon the session and stop all timers and audio.
    pub fn shutdown(&mut self) {
        let effects = self.engine.abandon();
        self.dispatch(effects);
        self.abort_tasks();
    }

    #[must_use]
    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        self.engine.view()
    }

    #[must_use]
    pub fn summary(&self) -> Option<SessionSummary> {
        self.engine.summary()
    }

    /// Experience reported by the progress store during this session.
    #[must_use]
    pub fn experience_gained(&self) -> u64 {
        self.experience_gained
    }

    /// Most recent mastery percentage reported by the progress store.
    #[must_use]
    pub fn latest_mastery(&self) -> Option<u8> {
        self.latest_mastery
    }

    #[must_use]
    pub fn has_pending_timer(&self) -> bool {
        self.timer.is_some()
    }

    fn handle_signal(&mut self, signal: Signal) -> Option<DriverEvent> {
        match signal {
            Signal::Expired(token) => {
                if self.timer.as_ref().is_some_and(|(live, _)| *live == token) {
                    self.timer = None;
                }
                let effects = self.engine.expire_auto_advance(token);
                if effects.is_empty() {
                    return None;
                }
                self.dispatch(effects);
                Some(DriverEvent::Advanced {
                    completed: self.engine.is_complete(),
                })
            }
            Signal::Progress(update) => {
                self.experience_gained += u64::from(update.experience_delta);
                self.latest_mastery = Some(update.mastery_percent);
                Some(DriverEvent::Progress(update))
            }
        }
    }

    fn dispatch_reporting(&mut self, effects: Vec<Effect>) -> bool {
        let changed = !effects.is_empty();
        self.dispatch(effects);
        changed
    }

    fn dispatch(&mut self, effects: Vec<Effect>) {
        self.writes.retain(|handle| !handle.is_finished());
        for effect in effects {
            match effect {
                Effect::PlayAudio { item_id, media } => {
                    if let Some(previous) = self.audio_task.take() {
                        previous.abort();
                    }
                    let audio = Arc::clone(&self.audio);
                    self.audio_task = Some(tokio::spawn(async move {
                        if let Err(err) = audio.play(&media).await {
                            tracing::warn!(item_id = %item_id, %media, error = %err, "audio playback failed");
                        }
                    }));
                }
                Effect::RecordAnswer(record) => {
                    let progress = Arc::clone(&self.progress);
                    let tx = self.signals_tx.clone();
                    self.writes.push(tokio::spawn(async move {
                        match progress.record_answer(&record).await {
                            Ok(update) => {
                                let _ = tx.send(Signal::Progress(update));
                            }
                            Err(err) => {
                                tracing::warn!(
                                    item_id = %record.item_id,
                                    error = %err,
                                    "failed to record answer"
                                );
                            }
                        }
                    }));
                }
                Effect::ScheduleAutoAdvance { token, delay } => {
                    if let Some((_, previous)) = self.timer.take() {
                        previous.abort();
                    }
                    let tx = self.signals_tx.clone();
                    let handle = tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(Signal::Expired(token));
                    });
                    self.timer = Some((token, handle));
                }
                Effect::CancelAutoAdvance { token } => {
                    if self.timer.as_ref().is_some_and(|(live, _)| *live == token) {
                        if let Some((_, handle)) = self.timer.take() {
                            handle.abort();
                        }
                    }
                }
                Effect::Completed(summary) => {
                    if let Some((_, handle)) = self.timer.take() {
                        handle.abort();
                    }
                    tracing::debug!(
                        session_id = %summary.session_id,
                        accuracy = summary.accuracy_percent(),
                        "driver observed completion"
                    );
                }
            }
        }
    }

    fn abort_tasks(&mut self) {
        if let Some((_, handle)) = self.timer.take() {
            handle.abort();
        }
        if let Some(handle) = self.audio_task.take() {
            handle.abort();
        }
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

impl fmt::Debug for SessionDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionDriver")
            .field("engine", &self.engine)
            .field("timer", &self.timer.as_ref().map(|(token, _)| *token))
            .field("pending_writes", &self.writes.len())
            .field("experience_gained", &self.experience_gained)
            .finish_non_exhaustive()
    }
}
