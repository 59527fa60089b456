use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::{CategoryId, ItemId};
use super::media::MediaRef;
use super::question::AnswerDomain;

/// Token in example sentences replaced by the term when rendered.
pub const EXAMPLE_PLACEHOLDER: &str = "____";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ItemError {
    #[error("term cannot be empty")]
    EmptyTerm,

    #[error("definition cannot be empty")]
    EmptyDefinition,

    #[error("media reference cannot be empty")]
    EmptyMediaRef,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated item as delivered by a content source (JSON seed file, DB row).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub id: u64,
    pub category_id: u64,
    pub term: String,
    pub definition: String,
    #[serde(default)]
    pub pronunciation: Option<String>,
    #[serde(default)]
    pub part_of_speech: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub example_sentence: Option<String>,
}

impl ItemDraft {
    /// Trim text fields, drop blank optionals, and parse media references.
    ///
    /// # Errors
    ///
    /// Returns `ItemError` when the term or definition is blank.
    pub fn validate(self) -> Result<LearningItem, ItemError> {
        let term = self.term.trim().to_owned();
        if term.is_empty() {
            return Err(ItemError::EmptyTerm);
        }
        let definition = self.definition.trim().to_owned();
        if definition.is_empty() {
            return Err(ItemError::EmptyDefinition);
        }

        Ok(LearningItem {
            id: ItemId::new(self.id),
            category_id: CategoryId::new(self.category_id),
            term,
            definition,
            pronunciation: normalize_optional(self.pronunciation),
            part_of_speech: normalize_optional(self.part_of_speech),
            audio: parse_media(self.audio_url)?,
            image: parse_media(self.image_url)?,
            video: parse_media(self.video_url)?,
            example_sentence: normalize_optional(self.example_sentence),
        })
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse_media(value: Option<String>) -> Result<Option<MediaRef>, ItemError> {
    normalize_optional(value).map(MediaRef::parse).transpose()
}

//
// ─── LEARNING ITEM ─────────────────────────────────────────────────────────────
//

/// One word or grammar unit presentable as a quiz question.
///
/// Immutable once fetched; a session owns its items for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearningItem {
    id: ItemId,
    category_id: CategoryId,
    term: String,
    definition: String,
    pronunciation: Option<String>,
    part_of_speech: Option<String>,
    audio: Option<MediaRef>,
    image: Option<MediaRef>,
    video: Option<MediaRef>,
    example_sentence: Option<String>,
}

impl LearningItem {
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[must_use]
    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    #[must_use]
    pub fn definition(&self) -> &str {
        &self.definition
    }

    #[must_use]
    pub fn pronunciation(&self) -> Option<&str> {
        self.pronunciation.as_deref()
    }

    #[must_use]
    pub fn part_of_speech(&self) -> Option<&str> {
        self.part_of_speech.as_deref()
    }

    #[must_use]
    pub fn audio(&self) -> Option<&MediaRef> {
        self.audio.as_ref()
    }

    #[must_use]
    pub fn image(&self) -> Option<&MediaRef> {
        self.image.as_ref()
    }

    #[must_use]
    pub fn video(&self) -> Option<&MediaRef> {
        self.video.as_ref()
    }

    #[must_use]
    pub fn example_sentence(&self) -> Option<&str> {
        self.example_sentence.as_deref()
    }

    /// Example sentence with every placeholder replaced by the term.
    #[must_use]
    pub fn rendered_example(&self) -> Option<String> {
        self.example_sentence
            .as_deref()
            .map(|s| s.replace(EXAMPLE_PLACEHOLDER, &self.term))
    }

    /// The text a question of the given answer domain expects.
    #[must_use]
    pub fn answer_for(&self, domain: AnswerDomain) -> &str {
        match domain {
            AnswerDomain::Term => &self.term,
            AnswerDomain::Definition => &self.definition,
        }
    }

    /// Back to the draft shape, for persistence.
    #[must_use]
    pub fn to_draft(&self) -> ItemDraft {
        ItemDraft {
            id: self.id.value(),
            category_id: self.category_id.value(),
            term: self.term.clone(),
            definition: self.definition.clone(),
            pronunciation: self.pronunciation.clone(),
            part_of_speech: self.part_of_speech.clone(),
            audio_url: self.audio.as_ref().map(ToString::to_string),
            image_url: self.image.as_ref().map(ToString::to_string),
            video_url: self.video.as_ref().map(ToString::to_string),
            example_sentence: self.example_sentence.clone(),
        }
    }
}
