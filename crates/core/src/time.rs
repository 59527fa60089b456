use chrono::{DateTime, Utc};

/// Source of "now" for session timers and answer records.
///
/// `Fixed` keeps tests deterministic; `advance` moves a fixed clock forward so
/// countdowns can be exercised without waiting on wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Moves a fixed clock forward, clamping at the latest representable
    /// instant. No effect on the system clock.
    pub fn advance(&mut self, delta: std::time::Duration) {
        if let Clock::Fixed(t) = self {
            *t = t
                .checked_add_signed(to_chrono(delta))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
        }
    }
}

/// Converts a std duration into a chrono duration, saturating on overflow.
#[must_use]
pub fn to_chrono(delta: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(delta).unwrap_or(chrono::Duration::MAX)
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
