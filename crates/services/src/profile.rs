//! Read-only statistics derived from the catalog and progress records.

use std::collections::BTreeMap;

use serde::Serialize;

use lesson_core::{
    Catalog,
    model::{AppState, User},
    scoring::{level_for_xp, streak_length},
    time::Clock,
};

/// Completion ratio for one skill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkillProgress {
    pub completed: usize,
    pub total: usize,
}

/// Everything the profile screen shows, computed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub user: Option<User>,
    pub total_xp: u64,
    pub level: u32,
    pub streak: u32,
    pub completed: usize,
    pub total_lessons: usize,
    pub skills: BTreeMap<String, SkillProgress>,
}

/// Borrowed view over a consistent snapshot; never mutates.
#[derive(Debug, Clone, Copy)]
pub struct ProfileAggregator<'a> {
    catalog: &'a Catalog,
    state: &'a AppState,
    clock: Clock,
}

impl<'a> ProfileAggregator<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog, state: &'a AppState, clock: Clock) -> Self {
        Self {
            catalog,
            state,
            clock,
        }
    }

    /// Number of catalog lessons marked completed. Records for lessons the
    /// catalog no longer carries are ignored, matching `skill_progress`.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.state
            .progress()
            .values()
            .filter(|p| p.completed && self.catalog.contains(&p.lesson_id))
            .count()
    }

    /// Per-skill completion over the whole catalog. Lessons without a
    /// progress record count toward `total` but not `completed`.
    #[must_use]
    pub fn skill_progress(&self) -> BTreeMap<String, SkillProgress> {
        let mut skills: BTreeMap<String, SkillProgress> = BTreeMap::new();
        for lesson in self.catalog.lessons() {
            let entry = skills.entry(lesson.skill.clone()).or_default();
            entry.total += 1;
            if self.state.is_completed(&lesson.id) {
                entry.completed += 1;
            }
        }
        skills
    }

    /// XP driving the level: the user's own when signed in, else the running total.
    #[must_use]
    pub fn xp(&self) -> u64 {
        self.state
            .current_user()
            .map_or(self.state.total_xp(), |user| user.xp)
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        level_for_xp(self.xp())
    }

    /// Streak as of the clock's today; may have lapsed since the last completion.
    #[must_use]
    pub fn streak(&self) -> u32 {
        streak_length(
            self.state.progress().values().filter_map(|p| p.last_attempt),
            self.clock.today(),
        )
    }

    #[must_use]
    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            user: self.state.current_user().cloned(),
            total_xp: self.state.total_xp(),
            level: self.level(),
            streak: self.streak(),
            completed: self.completed_count(),
            total_lessons: self.catalog.len(),
            skills: self.skill_progress(),
        }
    }
}
