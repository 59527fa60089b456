use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{CategoryId, SessionId, UserId};

/// Running counters for one session. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub correct: u32,
    pub incorrect: u32,
    pub skipped: u32,
}

impl SessionStats {
    /// Items answered by picking an option (skips excluded).
    #[must_use]
    pub fn answered(&self) -> u32 {
        self.correct.saturating_add(self.incorrect)
    }

    /// Correct answers over answered items, rounded down. 0 when nothing was answered.
    #[must_use]
    pub fn accuracy_percent(&self) -> u8 {
        let answered = self.answered();
        if answered == 0 {
            return 0;
        }
        let pct = u64::from(self.correct) * 100 / u64::from(answered);
        u8::try_from(pct).unwrap_or(100)
    }
}

/// Who and what a session is for. Passed in explicitly instead of read from
/// ambient auth/session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: UserId,
    pub category_id: CategoryId,
    pub flow: super::QuizFlow,
}

/// Aggregate produced once when a session completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub category_id: CategoryId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub total_items: u32,
    pub stats: SessionStats,
}

impl SessionSummary {
    #[must_use]
    pub fn accuracy_percent(&self) -> u8 {
        self.stats.accuracy_percent()
    }

    /// Items reached but neither answered nor revealed (left via a manual `next`).
    #[must_use]
    pub fn unanswered(&self) -> u32 {
        self.total_items
            .saturating_sub(self.stats.answered())
            .saturating_sub(self.stats.skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn accuracy_ignores_skips() {
        let stats = SessionStats {
            correct: 2,
            incorrect: 1,
            skipped: 5,
        };
        assert_eq!(stats.answered(), 3);
        assert_eq!(stats.accuracy_percent(), 66);
        assert_eq!(SessionStats::default().accuracy_percent(), 0);
    }

    #[test]
    fn summary_counts_unanswered_items() {
        let summary = SessionSummary {
            session_id: SessionId::random(),
            category_id: CategoryId::new(1),
            started_at: fixed_now(),
            completed_at: fixed_now(),
            total_items: 6,
            stats: SessionStats {
                correct: 2,
                incorrect: 1,
                skipped: 1,
            },
        };
        assert_eq!(summary.unanswered(), 2);
    }
}
