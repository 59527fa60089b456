use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("auto-advance after a correct answer must be between 1 and 600 seconds")]
    InvalidCorrectAdvance,

    #[error("auto-advance after a miss must be between 1 and 600 seconds")]
    InvalidIncorrectAdvance,

    #[error("item count must be > 0")]
    InvalidItemCount,
}

const MAX_ADVANCE_SECS: u32 = 600;

//
// ─── SESSION CONFIG ────────────────────────────────────────────────────────────
//

/// Tunables for one quiz session.
///
/// Defaults match the stock quiz flow:
/// - 4 seconds before moving on after a correct answer
/// - 30 seconds after a wrong answer or an explicit reveal
/// - 10 items per session, in content order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSessionConfig")]
pub struct SessionConfig {
    correct_advance_secs: u32,
    incorrect_advance_secs: u32,
    item_count: u32,
    shuffle_items: bool,
}

/// Unchecked wire shape; deserialization goes through `SessionConfig::new`.
#[derive(Deserialize)]
struct RawSessionConfig {
    correct_advance_secs: u32,
    incorrect_advance_secs: u32,
    item_count: u32,
    #[serde(default)]
    shuffle_items: bool,
}

impl TryFrom<RawSessionConfig> for SessionConfig {
    type Error = ConfigError;

    fn try_from(raw: RawSessionConfig) -> Result<Self, Self::Error> {
        Self::new(
            raw.correct_advance_secs,
            raw.incorrect_advance_secs,
            raw.item_count,
            raw.shuffle_items,
        )
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            correct_advance_secs: 4,
            incorrect_advance_secs: 30,
            item_count: 10,
            shuffle_items: false,
        }
    }
}

impl SessionConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` if a countdown is outside 1..=600 seconds or the
    /// item count is zero.
    pub fn new(
        correct_advance_secs: u32,
        incorrect_advance_secs: u32,
        item_count: u32,
        shuffle_items: bool,
    ) -> Result<Self, ConfigError> {
        if !(1..=MAX_ADVANCE_SECS).contains(&correct_advance_secs) {
            return Err(ConfigError::InvalidCorrectAdvance);
        }
        if !(1..=MAX_ADVANCE_SECS).contains(&incorrect_advance_secs) {
            return Err(ConfigError::InvalidIncorrectAdvance);
        }
        if item_count == 0 {
            return Err(ConfigError::InvalidItemCount);
        }
        Ok(Self {
            correct_advance_secs,
            incorrect_advance_secs,
            item_count,
            shuffle_items,
        })
    }

    /// Countdown started after a correct answer.
    #[must_use]
    pub fn correct_advance(&self) -> Duration {
        Duration::from_secs(u64::from(self.correct_advance_secs))
    }

    /// Countdown started after a wrong answer or an explicit reveal.
    #[must_use]
    pub fn incorrect_advance(&self) -> Duration {
        Duration::from_secs(u64::from(self.incorrect_advance_secs))
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.item_count
    }

    #[must_use]
    pub fn shuffle_items(&self) -> bool {
        self.shuffle_items
    }
}
