//! Sequential hint disclosure for a single lesson.

use std::collections::BTreeSet;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HintError {
    #[error("hint {level} is not yet allowed; reveal hint {} first", .level.saturating_sub(1))]
    NotYetAllowed { level: u32 },
    #[error("hint {level} does not exist (lesson has {available})")]
    UnknownLevel { level: u32, available: u32 },
}

/// Result of a reveal request that the gate accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintReveal {
    /// Newly revealed; exactly one hint usage must be recorded.
    Revealed(u32),
    /// Already visible; nothing to record.
    AlreadyRevealed(u32),
}

impl HintReveal {
    #[must_use]
    pub fn is_new(self) -> bool {
        matches!(self, HintReveal::Revealed(_))
    }
}

/// True iff `level` is 1 or its predecessor has been revealed.
#[must_use]
pub fn can_reveal(level: u32, revealed: &BTreeSet<u32>) -> bool {
    level == 1 || (level > 1 && revealed.contains(&(level - 1)))
}

/// Session-local reveal state for one lesson's hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintGate {
    hint_count: u32,
    revealed: BTreeSet<u32>,
}

impl HintGate {
    /// Gate with nothing revealed.
    #[must_use]
    pub fn new(hint_count: u32) -> Self {
        Self {
            hint_count,
            revealed: BTreeSet::new(),
        }
    }

    /// Rebuild the gate after a reload from the persisted usage count.
    ///
    /// Levels `1..=min(hints_used, hint_count)` come back as revealed, so a
    /// learner never pays for a hint they can no longer see.
    #[must_use]
    pub fn resume(hint_count: u32, hints_used: u32) -> Self {
        Self {
            hint_count,
            revealed: (1..=hints_used.min(hint_count)).collect(),
        }
    }

    #[must_use]
    pub fn hint_count(&self) -> u32 {
        self.hint_count
    }

    #[must_use]
    pub fn revealed(&self) -> &BTreeSet<u32> {
        &self.revealed
    }

    #[must_use]
    pub fn is_revealed(&self, level: u32) -> bool {
        self.revealed.contains(&level)
    }

    #[must_use]
    pub fn can_reveal(&self, level: u32) -> bool {
        (1..=self.hint_count).contains(&level) && can_reveal(level, &self.revealed)
    }

    /// Next level that would be accepted, if any remain.
    #[must_use]
    pub fn next_level(&self) -> Option<u32> {
        (1..=self.hint_count).find(|level| !self.revealed.contains(level))
    }

    /// Reveal `level`.
    ///
    /// # Errors
    ///
    /// Returns `HintError::UnknownLevel` for levels outside the lesson's hints and
    /// `HintError::NotYetAllowed` when the previous level is still hidden. The gate
    /// is left untouched on error.
    pub fn reveal(&mut self, level: u32) -> Result<HintReveal, HintError> {
        if !(1..=self.hint_count).contains(&level) {
            return Err(HintError::UnknownLevel {
                level,
                available: self.hint_count,
            });
        }
        if self.revealed.contains(&level) {
            return Ok(HintReveal::AlreadyRevealed(level));
        }
        if !can_reveal(level, &self.revealed) {
            return Err(HintError::NotYetAllowed { level });
        }
        self.revealed.insert(level);
        Ok(HintReveal::Revealed(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_level_is_always_allowed() {
        assert!(can_reveal(1, &BTreeSet::new()));
        assert!(!can_reveal(2, &BTreeSet::new()));
        assert!(!can_reveal(0, &BTreeSet::new()));
        assert!(can_reveal(3, &BTreeSet::from([1, 2])));
    }

    #[test]
    fn levels_unlock_in_order() {
        let mut gate = HintGate::new(3);
        assert!(gate.can_reveal(1));
        assert!(!gate.can_reveal(2));
        assert!(!gate.can_reveal(3));

        assert_eq!(gate.reveal(3), Err(HintError::NotYetAllowed { level: 3 }));
        assert!(gate.revealed().is_empty());

        assert_eq!(gate.reveal(1), Ok(HintReveal::Revealed(1)));
        assert!(gate.can_reveal(2));
        assert!(!gate.can_reveal(3));
        assert_eq!(gate.reveal(2), Ok(HintReveal::Revealed(2)));
        assert_eq!(gate.next_level(), Some(3));
    }

    #[test]
    fn revealing_twice_is_reported_once() {
        let mut gate = HintGate::new(2);
        assert!(gate.reveal(1).unwrap().is_new());
        assert!(!gate.reveal(1).unwrap().is_new());
        assert_eq!(gate.revealed().len(), 1);
    }

    #[test]
    fn levels_outside_lesson_are_rejected() {
        let mut gate = HintGate::new(2);
        assert_eq!(
            gate.reveal(0),
            Err(HintError::UnknownLevel { level: 0, available: 2 })
        );
        gate.reveal(1).unwrap();
        gate.reveal(2).unwrap();
        assert_eq!(
            gate.reveal(3),
            Err(HintError::UnknownLevel { level: 3, available: 2 })
        );
        assert_eq!(gate.next_level(), None);
    }

    #[test]
    fn resume_restores_prefix_of_levels() {
        let gate = HintGate::resume(3, 2);
        assert_eq!(gate.revealed(), &BTreeSet::from([1, 2]));
        assert!(gate.can_reveal(3));

        let overdrawn = HintGate::resume(3, 7);
        assert_eq!(overdrawn.revealed().len(), 3);
        assert_eq!(overdrawn.next_level(), None);
    }
}
