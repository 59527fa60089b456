use chrono::{DateTime, Utc};
use std::time::Duration;

use lingo_core::model::{
    LearningItem, MediaRef, QuestionType, SessionId, SessionStats, SessionSummary,
};

use super::engine::SessionEngine;

/// What the learner sees before answering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Play the clip, pick the term.
    Listen(MediaRef),
    /// Read the definition, pick the term.
    Definition(String),
    /// Read the term, pick the definition.
    Term(String),
}

impl Prompt {
    fn for_item(item: &LearningItem, question_type: QuestionType) -> Self {
        match question_type {
            QuestionType::ListenAndChooseWord => match item.audio() {
                Some(media) => Prompt::Listen(media.clone()),
                None => Prompt::Definition(item.definition().to_owned()),
            },
            QuestionType::DefinitionToWord => Prompt::Definition(item.definition().to_owned()),
            QuestionType::WordToDefinition => Prompt::Term(item.term().to_owned()),
        }
    }
}

/// Read-only snapshot of a session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub session_id: SessionId,
    pub position: usize,
    pub total: usize,
    pub current_item: Option<LearningItem>,
    pub question_type: Option<QuestionType>,
    pub prompt: Option<Prompt>,
    pub answer_options: Vec<String>,
    pub selected_answer: Option<String>,
    pub revealed: bool,
    pub is_correct: Option<bool>,
    /// Canonical answer, only once revealed.
    pub correct_answer: Option<String>,
    pub stats: SessionStats,
    pub completed: bool,
    pub remaining_auto_advance: Option<Duration>,
    pub summary: Option<SessionSummary>,
}

impl SessionView {
    #[must_use]
    pub fn from_engine(engine: &SessionEngine, now: DateTime<Utc>) -> Self {
        let current_item = engine.current_item().cloned();
        let question_type = engine.question_type().filter(|_| current_item.is_some());
        let prompt = current_item
            .as_ref()
            .zip(question_type)
            .map(|(item, q)| Prompt::for_item(item, q));
        let correct_answer = current_item
            .as_ref()
            .zip(question_type)
            .filter(|_| engine.is_revealed())
            .map(|(item, q)| item.answer_for(q.answer_domain()).to_owned());

        Self {
            session_id: engine.id(),
            position: engine.current_index(),
            total: engine.items().len(),
            question_type,
            prompt,
            answer_options: engine.answer_options().to_vec(),
            selected_answer: engine.selected_answer().map(str::to_owned),
            revealed: engine.is_revealed(),
            is_correct: engine.is_correct(),
            correct_answer,
            stats: engine.stats(),
            completed: engine.is_complete(),
            remaining_auto_advance: engine.remaining_auto_advance(now),
            summary: engine.summary(),
            current_item,
        }
    }
}
