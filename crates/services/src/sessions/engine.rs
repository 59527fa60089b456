use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::Duration;

use lingo_core::model::{
    AnswerRecord, ItemId, LearningItem, MediaRef, QuestionType, SessionContext, SessionId,
    SessionStats, SessionSummary,
};
use lingo_core::time::to_chrono;
use lingo_core::{Clock, SessionConfig};

use super::matching::answers_match;
use super::options::answer_options;
use super::view::SessionView;

//
// ─── EFFECTS ───────────────────────────────────────────────────────────────────
//

/// Identifies one auto-advance countdown. A fresh token is issued for every
/// countdown, so an expiry carrying an old token is recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Side effect requested by a state transition, in the order it must run.
///
/// The engine never performs I/O itself; a driver executes these.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    PlayAudio { item_id: ItemId, media: MediaRef },
    RecordAnswer(AnswerRecord),
    ScheduleAutoAdvance { token: TimerToken, delay: Duration },
    CancelAutoAdvance { token: TimerToken },
    Completed(SessionSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Countdown {
    token: TimerToken,
    deadline: DateTime<Utc>,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Per-session quiz state machine.
///
/// Walks an immutable list of items front to back. For each item it rolls a
/// question type, builds shuffled answer options, accepts exactly one answer
/// or reveal, and then waits for a manual or timed `next`.
///
/// Every operation is total: calls that are not valid in the current state
/// return no effects and change nothing.
pub struct SessionEngine {
    id: SessionId,
    context: SessionContext,
    config: SessionConfig,
    clock: Clock,
    rng: StdRng,
    items: Vec<LearningItem>,
    current: usize,
    question_type: Option<QuestionType>,
    options: Vec<String>,
    selected: Option<String>,
    revealed: bool,
    is_correct: Option<bool>,
    stats: SessionStats,
    countdown: Option<Countdown>,
    next_token: u64,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    abandoned: bool,
}

impl SessionEngine {
    /// Create an idle engine using OS entropy and the system clock.
    ///
    /// Nothing happens until `start` is called.
    #[must_use]
    pub fn new(context: SessionContext, config: SessionConfig) -> Self {
        let clock = Clock::default();
        Self {
            id: SessionId::random(),
            context,
            config,
            clock,
            rng: StdRng::from_os_rng(),
            items: Vec::new(),
            current: 0,
            question_type: None,
            options: Vec::new(),
            selected: None,
            revealed: false,
            is_correct: None,
            stats: SessionStats::default(),
            countdown: None,
            next_token: 0,
            started_at: clock.now(),
            completed_at: None,
            abandoned: false,
        }
    }

    /// Override the random source (usually a seeded `StdRng` in tests).
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Move a fixed clock forward; no effect on the system clock.
    pub fn advance_clock(&mut self, delta: Duration) {
        self.clock.advance(delta);
    }

    //
    // ─── OPERATIONS ────────────────────────────────────────────────────────────
    //

    /// Begin (or restart) the session over `items`.
    ///
    /// Resets the cursor and counters and prepares the first item. An empty
    /// list completes the session immediately.
    pub fn start(&mut self, items: Vec<LearningItem>) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.cancel_countdown(&mut effects);

        self.items = items;
        self.current = 0;
        self.stats = SessionStats::default();
        self.started_at = self.clock.now();
        self.completed_at = None;
        self.abandoned = false;

        tracing::debug!(session_id = %self.id, items = self.items.len(), "session started");

        if self.items.is_empty() {
            self.reset_item_state();
            self.complete(&mut effects);
        } else {
            self.enter_item(&mut effects);
        }
        effects
    }

    /// Pick an answer for the current item.
    ///
    /// Ignored once the item has been answered or revealed, so scoring and the
    /// progress record happen at most once per item.
    pub fn select_answer(&mut self, candidate: &str) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.is_active() || self.selected.is_some() || self.revealed {
            return effects;
        }
        let (Some(item), Some(question_type)) = (self.items.get(self.current), self.question_type)
        else {
            return effects;
        };

        let domain = question_type.answer_domain();
        let correct = answers_match(domain, candidate, item.answer_for(domain));
        let item_id = item.id();
        let audio = item.audio().cloned();

        self.selected = Some(candidate.to_owned());
        self.is_correct = Some(correct);
        if correct {
            self.stats.correct += 1;
        } else {
            self.stats.incorrect += 1;
        }
        self.revealed = true;

        // Listening prompts already played the clip.
        if let Some(media) = audio.filter(|_| !question_type.is_listening()) {
            effects.push(Effect::PlayAudio { item_id, media });
        }

        effects.push(Effect::RecordAnswer(AnswerRecord {
            user_id: self.context.user_id,
            item_id,
            category_id: self.context.category_id,
            correct,
            answered_at: self.clock.now(),
        }));

        let delay = if correct {
            self.config.correct_advance()
        } else {
            self.config.incorrect_advance()
        };
        self.start_countdown(delay, &mut effects);

        tracing::debug!(
            session_id = %self.id,
            item_id = %item_id,
            correct,
            "answer selected"
        );
        effects
    }

    /// Show the answer without picking one. Counts as a skip and is not
    /// reported to the progress store.
    pub fn reveal_answer(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.is_active() || self.revealed {
            return effects;
        }
        let Some(item) = self.items.get(self.current) else {
            return effects;
        };
        let item_id = item.id();
        let audio = item.audio().cloned();

        self.revealed = true;
        self.stats.skipped += 1;

        if let Some(media) = audio {
            effects.push(Effect::PlayAudio { item_id, media });
        }
        self.start_countdown(self.config.incorrect_advance(), &mut effects);

        tracing::debug!(session_id = %self.id, item_id = %item_id, "answer revealed");
        effects
    }

    /// Leave the current item: move to the following one, or complete the
    /// session when this was the last.
    pub fn next(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.is_active() {
            return effects;
        }
        self.cancel_countdown(&mut effects);

        if self.current + 1 < self.items.len() {
            self.current += 1;
            self.enter_item(&mut effects);
        } else {
            self.complete(&mut effects);
        }
        effects
    }

    /// Deliver an expired countdown. Runs `next` only if `token` is still the
    /// live countdown; anything else is stale and ignored.
    pub fn expire_auto_advance(&mut self, token: TimerToken) -> Vec<Effect> {
        match self.countdown {
            Some(countdown) if countdown.token == token => {
                // The timer already fired; no cancel effect needed.
                self.countdown = None;
                tracing::debug!(session_id = %self.id, token = token.value(), "auto-advance");
                self.next()
            }
            _ => {
                tracing::debug!(
                    session_id = %self.id,
                    token = token.value(),
                    "ignoring stale auto-advance"
                );
                Vec::new()
            }
        }
    }

    /// Fire the countdown if its deadline is at or before `now`.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        match self.countdown {
            Some(countdown) if countdown.deadline <= now => {
                self.expire_auto_advance(countdown.token)
            }
            _ => Vec::new(),
        }
    }

    /// Tear the session down. Clears any countdown; later calls are no-ops.
    pub fn abandon(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.cancel_countdown(&mut effects);
        if !self.abandoned {
            self.abandoned = true;
            tracing::debug!(session_id = %self.id, "session abandoned");
        }
        effects
    }

    //
    // ─── STATE ─────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn context(&self) -> SessionContext {
        self.context
    }

    #[must_use]
    pub fn items(&self) -> &[LearningItem] {
        &self.items
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&LearningItem> {
        if self.is_complete() {
            None
        } else {
            self.items.get(self.current)
        }
    }

    #[must_use]
    pub fn question_type(&self) -> Option<QuestionType> {
        self.question_type
    }

    #[must_use]
    pub fn answer_options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn selected_answer(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    #[must_use]
    pub fn is_correct(&self) -> Option<bool> {
        self.is_correct
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    #[must_use]
    pub fn pending_auto_advance(&self) -> Option<TimerToken> {
        self.countdown.map(|c| c.token)
    }

    /// Time left on the auto-advance countdown, if one is running.
    #[must_use]
    pub fn remaining_auto_advance(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.countdown.map(|c| {
            c.deadline
                .signed_duration_since(now)
                .to_std()
                .unwrap_or(Duration::ZERO)
        })
    }

    /// Summary of a completed session.
    #[must_use]
    pub fn summary(&self) -> Option<SessionSummary> {
        self.completed_at.map(|completed_at| self.build_summary(completed_at))
    }

    /// Snapshot for the presentation layer, timed against the engine clock.
    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView::from_engine(self, self.clock.now())
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn is_active(&self) -> bool {
        !self.abandoned && !self.is_complete()
    }

    fn reset_item_state(&mut self) {
        self.question_type = None;
        self.options.clear();
        self.selected = None;
        self.revealed = false;
        self.is_correct = None;
    }

    fn enter_item(&mut self, effects: &mut Vec<Effect>) {
        self.reset_item_state();
        let Some(item) = self.items.get(self.current) else {
            return;
        };
        let has_audio = item.audio().is_some();
        let eligible: Vec<QuestionType> = self
            .context
            .flow
            .question_types()
            .iter()
            .copied()
            .filter(|q| has_audio || !q.is_listening())
            .collect();
        let question_type = if eligible.is_empty() {
            QuestionType::DefinitionToWord
        } else {
            eligible[self.rng.random_range(0..eligible.len())]
        };

        self.question_type = Some(question_type);
        self.options = answer_options(
            &self.items,
            self.current,
            question_type.answer_domain(),
            &mut self.rng,
        );

        let item = &self.items[self.current];
        if question_type.is_listening() {
            if let Some(media) = item.audio() {
                effects.push(Effect::PlayAudio {
                    item_id: item.id(),
                    media: media.clone(),
                });
            }
        }

        tracing::debug!(
            session_id = %self.id,
            index = self.current,
            item_id = %item.id(),
            question_type = question_type.as_str(),
            options = self.options.len(),
            "entered item"
        );
    }

    fn start_countdown(&mut self, delay: Duration, effects: &mut Vec<Effect>) {
        self.cancel_countdown(effects);
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.countdown = Some(Countdown {
            token,
            deadline: self.clock.now() + to_chrono(delay),
        });
        effects.push(Effect::ScheduleAutoAdvance { token, delay });
    }

    fn cancel_countdown(&mut self, effects: &mut Vec<Effect>) {
        if let Some(countdown) = self.countdown.take() {
            effects.push(Effect::CancelAutoAdvance {
                token: countdown.token,
            });
        }
    }

    fn complete(&mut self, effects: &mut Vec<Effect>) {
        let completed_at = self.clock.now();
        self.completed_at = Some(completed_at);
        let summary = self.build_summary(completed_at);
        tracing::info!(
            session_id = %self.id,
            correct = summary.stats.correct,
            incorrect = summary.stats.incorrect,
            skipped = summary.stats.skipped,
            "session completed"
        );
        effects.push(Effect::Completed(summary));
    }

    fn build_summary(&self, completed_at: DateTime<Utc>) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            category_id: self.context.category_id,
            started_at: self.started_at,
            completed_at,
            total_items: u32::try_from(self.items.len()).unwrap_or(u32::MAX),
            stats: self.stats,
        }
    }
}

impl fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEngine")
            .field("id", &self.id)
            .field("items_len", &self.items.len())
            .field("current", &self.current)
            .field("question_type", &self.question_type)
            .field("revealed", &self.revealed)
            .field("stats", &self.stats)
            .field("countdown", &self.countdown)
            .field("completed_at", &self.completed_at)
            .field("abandoned", &self.abandoned)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_core::model::{CategoryId, ItemDraft, QuizFlow, UserId};
    use lingo_core::time::{fixed_clock, fixed_now};

    fn build_item(id: u64, audio: bool) -> LearningItem {
        ItemDraft {
            id,
            category_id: 3,
            term: format!("Wort{id}"),
            definition: format!("Meaning {id}"),
            audio_url: audio.then(|| format!("/media/audio/{id}.mp3")),
            ..ItemDraft::default()
        }
        .validate()
        .unwrap()
    }

    fn build_items(n: u64, audio: bool) -> Vec<LearningItem> {
        (1..=n).map(|id| build_item(id, audio)).collect()
    }

    fn context(flow: QuizFlow) -> SessionContext {
        SessionContext {
            user_id: UserId::new(9),
            category_id: CategoryId::new(3),
            flow,
        }
    }

    fn engine_with(items: Vec<LearningItem>, flow: QuizFlow, seed: u64) -> SessionEngine {
        let mut engine = SessionEngine::new(context(flow), SessionConfig::default())
            .with_clock(fixed_clock())
            .with_rng(StdRng::seed_from_u64(seed));
        engine.start(items);
        engine
    }

    fn canonical(engine: &SessionEngine) -> String {
        let item = engine.current_item().unwrap();
        let domain = engine.question_type().unwrap().answer_domain();
        item.answer_for(domain).to_owned()
    }

    fn records(effects: &[Effect]) -> Vec<&AnswerRecord> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::RecordAnswer(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    fn scheduled(effects: &[Effect]) -> Option<(TimerToken, Duration)> {
        effects.iter().find_map(|e| match e {
            Effect::ScheduleAutoAdvance { token, delay } => Some((*token, *delay)),
            _ => None,
        })
    }

    #[test]
    fn start_prepares_first_item_without_progress_records() {
        let mut engine = SessionEngine::new(context(QuizFlow::Vocabulary), SessionConfig::default())
            .with_clock(fixed_clock())
            .with_rng(StdRng::seed_from_u64(1));
        let effects = engine.start(build_items(5, false));

        assert!(records(&effects).is_empty());
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.stats(), SessionStats::default());
        assert!(engine.question_type().is_some());
        assert_eq!(engine.answer_options().len(), 4);
        assert!(!engine.is_revealed());
        assert!(engine.pending_auto_advance().is_none());
    }

    #[test]
    fn selecting_twice_scores_once() {
        let mut engine = engine_with(build_items(5, false), QuizFlow::Vocabulary, 2);
        let answer = canonical(&engine);

        let first = engine.select_answer(&answer);
        let second = engine.select_answer("something else");

        assert_eq!(records(&first).len(), 1);
        assert!(second.is_empty());
        assert_eq!(engine.stats().correct, 1);
        assert_eq!(engine.stats().incorrect, 0);
        assert_eq!(engine.selected_answer(), Some(answer.as_str()));
        assert_eq!(engine.is_correct(), Some(true));
    }

    #[test]
    fn select_after_reveal_is_ignored() {
        let mut engine = engine_with(build_items(5, false), QuizFlow::Vocabulary, 3);
        engine.reveal_answer();
        let answer = canonical(&engine);
        assert!(engine.select_answer(&answer).is_empty());
        assert!(engine.reveal_answer().is_empty());
        assert_eq!(engine.stats().skipped, 1);
        assert_eq!(engine.stats().answered(), 0);
        assert_eq!(engine.is_correct(), None);
        assert_eq!(engine.selected_answer(), None);
    }

    #[test]
    fn every_answered_item_is_recorded_exactly_once() {
        let n = 6;
        let mut engine = engine_with(build_items(n, true), QuizFlow::Vocabulary, 4);
        let mut recorded = Vec::new();

        for i in 0..n {
            let answer = if i % 2 == 0 {
                canonical(&engine)
            } else {
                "wrong".to_owned()
            };
            let item_id = engine.current_item().unwrap().id();
            let effects = engine.select_answer(&answer);
            let _ = engine.select_answer(&answer);
            let recs = records(&effects);
            assert_eq!(recs.len(), 1);
            assert_eq!(recs[0].item_id, item_id);
            assert_eq!(Some(recs[0].correct), engine.is_correct());
            assert_eq!(recs[0].user_id, UserId::new(9));
            assert_eq!(recs[0].category_id, CategoryId::new(3));
            recorded.push(recs[0].clone());
            engine.next();
        }

        assert_eq!(recorded.len(), 6);
        assert!(engine.is_complete());
        assert_eq!(engine.stats().correct, 3);
        assert_eq!(engine.stats().incorrect, 3);
    }

    #[test]
    fn select_answer_effects_follow_audio_record_schedule_order() {
        let mut engine = engine_with(build_items(5, true), QuizFlow::Grammar, 5);
        let effects = engine.select_answer("wrong");
        assert!(matches!(effects[0], Effect::PlayAudio { .. }));
        assert!(matches!(effects[1], Effect::RecordAnswer(_)));
        assert!(matches!(effects[2], Effect::ScheduleAutoAdvance { .. }));
        assert_eq!(effects.len(), 3);
    }

    #[test]
    fn reveal_plays_audio_then_schedules_long_countdown() {
        let mut engine = engine_with(build_items(5, true), QuizFlow::Grammar, 17);
        let item_id = engine.current_item().unwrap().id();
        let media = engine.current_item().unwrap().audio().cloned().unwrap();

        let effects = engine.reveal_answer();
        let token = engine.pending_auto_advance().unwrap();
        assert_eq!(
            effects,
            vec![
                Effect::PlayAudio { item_id, media },
                Effect::ScheduleAutoAdvance {
                    token,
                    delay: Duration::from_secs(30),
                },
            ]
        );
    }

    #[test]
    fn reveal_without_audio_only_schedules() {
        let mut engine = engine_with(build_items(5, false), QuizFlow::Grammar, 18);
        let effects = engine.reveal_answer();
        assert!(matches!(
            effects.as_slice(),
            [Effect::ScheduleAutoAdvance { .. }]
        ));
    }

    #[test]
    fn listening_questions_do_not_replay_audio_on_answer() {
        // Roll until the first item is a listening question.
        let seed = (0..200)
            .find(|seed| {
                let engine = engine_with(build_items(5, true), QuizFlow::Vocabulary, *seed);
                engine.question_type() == Some(QuestionType::ListenAndChooseWord)
            })
            .expect("some seed rolls a listening question");

        let mut engine = SessionEngine::new(context(QuizFlow::Vocabulary), SessionConfig::default())
            .with_clock(fixed_clock())
            .with_rng(StdRng::seed_from_u64(seed));
        let entry = engine.start(build_items(5, true));
        assert!(matches!(entry.as_slice(), [Effect::PlayAudio { .. }]));

        let answer = canonical(&engine);
        let effects = engine.select_answer(&answer);
        assert!(!effects.iter().any(|e| matches!(e, Effect::PlayAudio { .. })));
    }

    #[test]
    fn items_without_audio_never_roll_listening() {
        for seed in 0..50 {
            let mut engine = engine_with(build_items(5, false), QuizFlow::Vocabulary, seed);
            while !engine.is_complete() {
                assert_ne!(
                    engine.question_type(),
                    Some(QuestionType::ListenAndChooseWord)
                );
                engine.next();
            }
        }
    }

    #[test]
    fn cursor_never_moves_past_last_item() {
        let mut engine = engine_with(build_items(4, false), QuizFlow::Vocabulary, 6);
        let mut last = engine.current_index();
        for _ in 0..3 {
            engine.next();
            assert!(engine.current_index() > last);
            last = engine.current_index();
        }
        assert_eq!(engine.current_index(), 3);

        let effects = engine.next();
        assert!(engine.is_complete());
        assert_eq!(engine.current_index(), 3);
        assert!(engine.current_item().is_none());
        assert!(matches!(effects.last(), Some(Effect::Completed(_))));

        assert!(engine.next().is_empty());
        assert!(engine.select_answer("x").is_empty());
        assert!(engine.reveal_answer().is_empty());
        assert_eq!(engine.current_index(), 3);
    }

    #[test]
    fn options_contain_canonical_exactly_once() {
        for seed in 0..20 {
            let mut engine = engine_with(build_items(7, true), QuizFlow::Vocabulary, seed);
            while !engine.is_complete() {
                let answer = canonical(&engine);
                let options = engine.answer_options();
                assert!(options.len() <= 4);
                assert_eq!(options.iter().filter(|o| **o == answer).count(), 1);
                engine.next();
            }
        }
    }

    #[test]
    fn tiny_sessions_have_no_options_but_still_score() {
        let mut engine = engine_with(build_items(3, false), QuizFlow::Vocabulary, 7);
        assert!(engine.answer_options().is_empty());
        let answer = canonical(&engine);
        let effects = engine.select_answer(&answer);
        assert_eq!(records(&effects).len(), 1);
        assert_eq!(engine.stats().correct, 1);
    }

    #[test]
    fn empty_session_completes_immediately() {
        let mut engine = SessionEngine::new(context(QuizFlow::Review), SessionConfig::default())
            .with_clock(fixed_clock());
        let effects = engine.start(Vec::new());
        assert!(engine.is_complete());
        assert!(matches!(effects.as_slice(), [Effect::Completed(_)]));
        assert!(engine.select_answer("x").is_empty());
        assert_eq!(engine.summary().unwrap().total_items, 0);
    }

    #[test]
    fn correct_answer_advances_after_short_countdown() {
        let mut engine = engine_with(build_items(5, false), QuizFlow::Vocabulary, 8);
        let answer = canonical(&engine);
        let (_, delay) = scheduled(&engine.select_answer(&answer)).unwrap();
        assert_eq!(delay, Duration::from_secs(4));

        assert!(engine.poll(fixed_now() + chrono::Duration::seconds(3)).is_empty());
        assert_eq!(
            engine.remaining_auto_advance(fixed_now() + chrono::Duration::seconds(3)),
            Some(Duration::from_secs(1))
        );
        engine.poll(fixed_now() + chrono::Duration::seconds(4));
        assert_eq!(engine.current_index(), 1);
        assert!(!engine.is_revealed());
        assert!(engine.pending_auto_advance().is_none());
    }

    #[test]
    fn miss_and_reveal_use_long_countdown() {
        let mut engine = engine_with(build_items(5, false), QuizFlow::Vocabulary, 9);
        let (_, delay) = scheduled(&engine.select_answer("wrong")).unwrap();
        assert_eq!(delay, Duration::from_secs(30));
        assert!(engine.poll(fixed_now() + chrono::Duration::seconds(29)).is_empty());
        assert!(!engine.poll(fixed_now() + chrono::Duration::seconds(30)).is_empty());
        assert_eq!(engine.current_index(), 1);

        let (_, delay) = scheduled(&engine.reveal_answer()).unwrap();
        assert_eq!(delay, Duration::from_secs(30));
    }

    #[test]
    fn manual_next_cancels_countdown_and_stale_expiry_is_ignored() {
        let mut engine = engine_with(build_items(5, false), QuizFlow::Vocabulary, 10);
        let answer = canonical(&engine);
        let (token, _) = scheduled(&engine.select_answer(&answer)).unwrap();

        let effects = engine.next();
        assert_eq!(effects[0], Effect::CancelAutoAdvance { token });
        assert_eq!(engine.current_index(), 1);

        assert!(engine.expire_auto_advance(token).is_empty());
        assert_eq!(engine.current_index(), 1);
        assert!(engine.poll(fixed_now() + chrono::Duration::hours(1)).is_empty());
    }

    #[test]
    fn expiry_moves_exactly_one_item() {
        let mut engine = engine_with(build_items(5, false), QuizFlow::Vocabulary, 11);
        engine.reveal_answer();
        let token = engine.pending_auto_advance().unwrap();
        assert!(!engine.expire_auto_advance(token).is_empty());
        assert!(engine.expire_auto_advance(token).is_empty());
        assert_eq!(engine.current_index(), 1);
    }

    #[test]
    fn countdown_deadline_follows_advanced_clock() {
        let mut engine = engine_with(build_items(5, false), QuizFlow::Vocabulary, 12);
        engine.advance_clock(Duration::from_secs(100));
        engine.select_answer("wrong");
        let now = fixed_now() + chrono::Duration::seconds(110);
        assert_eq!(
            engine.remaining_auto_advance(now),
            Some(Duration::from_secs(20))
        );
    }

    #[test]
    fn abandon_clears_countdown_and_freezes_state() {
        let mut engine = engine_with(build_items(5, false), QuizFlow::Vocabulary, 13);
        engine.reveal_answer();
        let token = engine.pending_auto_advance().unwrap();

        let effects = engine.abandon();
        assert_eq!(effects, vec![Effect::CancelAutoAdvance { token }]);
        assert!(engine.is_abandoned());
        assert!(engine.next().is_empty());
        assert!(engine.expire_auto_advance(token).is_empty());
        assert_eq!(engine.current_index(), 0);
    }

    #[test]
    fn mixed_session_tallies_match_operations() {
        let mut engine = engine_with(build_items(5, true), QuizFlow::Vocabulary, 14);
        let mut all = Vec::new();

        // 0: correct
        let answer = canonical(&engine);
        all.extend(engine.select_answer(&answer));
        assert_eq!(engine.stats().correct, 1);
        all.extend(engine.next());

        // 1: reveal only
        let before = records(&all).len();
        all.extend(engine.reveal_answer());
        assert_eq!(engine.stats().skipped, 1);
        assert_eq!(records(&all).len(), before);
        all.extend(engine.next());

        // 2: incorrect
        all.extend(engine.select_answer("definitely wrong"));
        assert_eq!(engine.stats().incorrect, 1);
        assert!(!records(&all).last().unwrap().correct);
        all.extend(engine.next());

        // 3 and 4: reveal then manual next
        for _ in 0..2 {
            all.extend(engine.reveal_answer());
            all.extend(engine.next());
        }

        assert!(engine.is_complete());
        assert_eq!(
            engine.stats(),
            SessionStats {
                correct: 1,
                incorrect: 1,
                skipped: 3
            }
        );
        assert_eq!(records(&all).len(), 2);
        let summary = engine.summary().unwrap();
        assert_eq!(summary.total_items, 5);
        assert_eq!(summary.accuracy_percent(), 50);
        assert_eq!(
            all.iter()
                .filter(|e| matches!(e, Effect::Completed(_)))
                .count(),
            1
        );
    }

    #[test]
    fn restart_resets_cursor_and_stats() {
        let mut engine = engine_with(build_items(5, false), QuizFlow::Vocabulary, 15);
        engine.select_answer("wrong");
        engine.next();
        let token = engine.pending_auto_advance();
        assert!(token.is_none());

        engine.reveal_answer();
        let live = engine.pending_auto_advance().unwrap();
        let effects = engine.start(build_items(6, false));
        assert_eq!(effects[0], Effect::CancelAutoAdvance { token: live });
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.stats(), SessionStats::default());
        assert_eq!(engine.items().len(), 6);
    }

    #[test]
    fn view_exposes_answer_only_after_reveal() {
        let mut engine = engine_with(build_items(5, false), QuizFlow::Grammar, 16);
        let view = engine.view();
        assert!(view.prompt.is_some());
        assert_eq!(view.correct_answer, None);
        assert_eq!(view.total, 5);

        engine.reveal_answer();
        let view = engine.view();
        assert_eq!(view.correct_answer, Some(canonical(&engine)));
        assert_eq!(view.remaining_auto_advance, Some(Duration::from_secs(30)));
    }
}
