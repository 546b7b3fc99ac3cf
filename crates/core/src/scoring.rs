//! XP awards, completion scores, and the standing (level, streak) derived from them.

use std::collections::BTreeSet;

use chrono::{DateTime, Days, NaiveDate, Utc};

// --- Scoring Constants ---
pub const XP_PENALTY_PER_HINT: u32 = 10;
pub const SCORE_PENALTY_PER_HINT: u32 = 10;
pub const MAX_SCORE: u32 = 100;
pub const MIN_SCORE: u32 = 50;

// --- Standing ---
pub const XP_PER_LEVEL: u64 = 500;

//
// ─── XP ────────────────────────────────────────────────────────────────────────
//

/// XP awarded for a lesson worth `base_xp` after `hints_used` hints.
///
/// Each hint costs a flat 10 XP, but the award never drops below half the
/// base (rounded up, so the floor is never undercut).
///
/// ```
/// use lesson_core::scoring::compute_xp;
/// assert_eq!(compute_xp(100, 2), 80);
/// assert_eq!(compute_xp(50, 4), 25);
/// ```
#[must_use]
pub fn compute_xp(base_xp: u32, hints_used: u32) -> u32 {
    let linear = base_xp.saturating_sub(hints_used.saturating_mul(XP_PENALTY_PER_HINT));
    linear.max(base_xp.div_ceil(2))
}

/// Score stored on a completed record: 100 minus 10 per hint, floored at 50.
#[must_use]
pub fn completion_score(hints_used: u32) -> u32 {
    MAX_SCORE
        .saturating_sub(hints_used.saturating_mul(SCORE_PENALTY_PER_HINT))
        .max(MIN_SCORE)
}

//
// ─── STANDING ──────────────────────────────────────────────────────────────────
//

/// Level 1 covers the first 500 XP; every further 500 XP adds a level.
#[must_use]
pub fn level_for_xp(xp: u64) -> u32 {
    u32::try_from(xp / XP_PER_LEVEL)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

/// Consecutive UTC days with activity, ending `today` or, if today is still
/// empty, yesterday. Anything older breaks the streak.
#[must_use]
pub fn streak_length<I>(activity: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let days: BTreeSet<NaiveDate> = activity.into_iter().map(|at| at.date_naive()).collect();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        match today.checked_sub_days(Days::new(1)) {
            Some(yesterday) => yesterday,
            None => return 0,
        }
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        match cursor.checked_sub_days(Days::new(1)) {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    streak
}
