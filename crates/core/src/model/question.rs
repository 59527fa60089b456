use serde::{Deserialize, Serialize};

/// Which field of an item a question asks the learner to pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerDomain {
    Term,
    Definition,
}

/// How an item is quizzed. Rolled again every time the session moves to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Audio cue is played; pick the term.
    ListenAndChooseWord,
    /// Definition is shown; pick the term.
    DefinitionToWord,
    /// Term is shown; pick the definition.
    WordToDefinition,
}

impl QuestionType {
    #[must_use]
    pub fn answer_domain(self) -> AnswerDomain {
        match self {
            QuestionType::ListenAndChooseWord | QuestionType::DefinitionToWord => {
                AnswerDomain::Term
            }
            QuestionType::WordToDefinition => AnswerDomain::Definition,
        }
    }

    /// The prompt itself plays the item's audio.
    #[must_use]
    pub fn is_listening(self) -> bool {
        matches!(self, QuestionType::ListenAndChooseWord)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::ListenAndChooseWord => "listen_and_choose_word",
            QuestionType::DefinitionToWord => "definition_to_word",
            QuestionType::WordToDefinition => "word_to_definition",
        }
    }
}

/// Kind of course a session belongs to; decides which question types can be rolled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizFlow {
    #[default]
    Vocabulary,
    Grammar,
    Review,
}

impl QuizFlow {
    #[must_use]
    pub fn question_types(self) -> &'static [QuestionType] {
        match self {
            QuizFlow::Vocabulary => &[
                QuestionType::ListenAndChooseWord,
                QuestionType::DefinitionToWord,
                QuestionType::WordToDefinition,
            ],
            QuizFlow::Grammar | QuizFlow::Review => &[
                QuestionType::DefinitionToWord,
                QuestionType::WordToDefinition,
            ],
        }
    }
}
