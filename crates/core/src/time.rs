use chrono::{DateTime, Duration, Utc};

/// Source of "now" for token expiry checks.
///
/// Services hold a `Clock` instead of calling `Utc::now()` so tests can pin
/// the instant a JWT is compared against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
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
            Clock::Fixed(at) => *at,
        }
    }

    /// Seconds since the Unix epoch, the unit JWT `exp` claims use.
    #[must_use]
    pub fn unix_seconds(&self) -> i64 {
        self.now().timestamp()
    }

    /// Returns a fixed clock moved forward by `delta`; system clocks are unchanged.
    #[must_use]
    pub fn advanced_by(self, delta: Duration) -> Self {
        match self {
            Clock::System => Clock::System,
            Clock::Fixed(at) => Clock::Fixed(at + delta),
        }
    }
}

/// Deterministic timestamp for tests (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns the deterministic test instant.
///
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_epoch_seconds() {
        assert_eq!(fixed_clock().unix_seconds(), FIXED_TEST_TIMESTAMP);
    }

    #[test]
    fn advancing_only_moves_fixed_clocks() {
        let later = fixed_clock().advanced_by(Duration::seconds(30));
        assert_eq!(later.unix_seconds(), FIXED_TEST_TIMESTAMP + 30);
        assert_eq!(Clock::system().advanced_by(Duration::seconds(30)), Clock::System);
    }
}
