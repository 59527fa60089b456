use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, ItemId, UserId};

/// Experience awarded for one correct answer.
pub const EXPERIENCE_PER_CORRECT: u32 = 10;

/// One answered item, sent to the progress store exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub category_id: CategoryId,
    pub correct: bool,
    pub answered_at: DateTime<Utc>,
}

impl AnswerRecord {
    #[must_use]
    pub fn experience(&self) -> u32 {
        if self.correct { EXPERIENCE_PER_CORRECT } else { 0 }
    }
}

/// What the progress store reports back after recording an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub item_id: ItemId,
    pub mastery_percent: u8,
    pub experience_delta: u32,
    pub total_experience: u64,
}

/// Share of a category's items answered correctly at least once, rounded down.
///
/// An empty category reports 0.
#[must_use]
pub fn mastery_percent(mastered: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = mastered.min(total).saturating_mul(100) / total;
    u8::try_from(pct).unwrap_or(100)
}
