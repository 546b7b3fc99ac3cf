use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Source of completion timestamps and of the "today" that streaks are
/// measured against. `Fixed` pins both for tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Wall,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Pin the clock at `at`.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Timestamp stamped on a completion as `lastAttempt`.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Wall => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// UTC calendar day a streak must reach (directly or via yesterday).
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Move a pinned clock forward, e.g. to let a streak lapse in tests.
    /// No-op on the wall clock.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Pinned instant used across test suites: 2023-11-14T22:13:20Z.
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// `FIXED_TEST_TIMESTAMP` as a `DateTime<Utc>`.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Clock pinned at [`fixed_now`].
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_and_reports_day() {
        let mut clock = fixed_clock();
        let start = clock.today();
        clock.advance(Duration::days(2));
        assert_eq!(clock.today(), start + Duration::days(2));
    }

    #[test]
    fn today_rolls_over_at_utc_midnight() {
        // 22:13:20 is 80_000s past midnight; land on 23:59:59 the same day.
        let midnight = FIXED_TEST_TIMESTAMP - 80_000;
        let late = DateTime::<Utc>::from_timestamp(midnight + 86_399, 0).unwrap();
        let mut clock = Clock::fixed(late);
        let day = clock.today();
        clock.advance(Duration::seconds(1));
        assert_eq!(clock.today(), day.succ_opt().unwrap());
    }

    #[test]
    fn wall_clock_ignores_advance() {
        let mut clock = Clock::default();
        clock.advance(Duration::days(365));
        assert!(clock.now() <= Utc::now());
    }
}
