use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{LessonId, SessionToken};
use crate::model::progress::LessonProgress;
use crate::model::user::User;
use crate::scoring::{MAX_SCORE, MIN_SCORE, level_for_xp, streak_length};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Inconsistencies found in a restored snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StateError {
    #[error("progress entry {key} holds record for {lesson_id}")]
    ProgressKeyMismatch { key: LessonId, lesson_id: LessonId },
    #[error("score {score} for {lesson_id} is outside 50..=100")]
    ScoreOutOfRange { lesson_id: LessonId, score: u32 },
    #[error("user level must be at least 1")]
    InvalidLevel,
}

//
// ─── APP STATE ─────────────────────────────────────────────────────────────────
//

/// The whole persisted application state.
///
/// Mutation goes through the methods below, which keep `total_xp` and the
/// signed-in user's `xp` in lockstep and never un-complete a lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(rename = "currentUser", default)]
    current_user: Option<User>,
    #[serde(default)]
    session: Option<SessionToken>,
    #[serde(rename = "currentLesson", default)]
    current_lesson: Option<LessonId>,
    #[serde(default)]
    progress: BTreeMap<LessonId, LessonProgress>,
    #[serde(rename = "totalXP", default)]
    total_xp: u64,
}

impl AppState {
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    #[must_use]
    pub fn session(&self) -> Option<&SessionToken> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn current_lesson(&self) -> Option<&LessonId> {
        self.current_lesson.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> &BTreeMap<LessonId, LessonProgress> {
        &self.progress
    }

    #[must_use]
    pub fn progress_for(&self, lesson_id: &LessonId) -> Option<&LessonProgress> {
        self.progress.get(lesson_id)
    }

    #[must_use]
    pub fn hints_used(&self, lesson_id: &LessonId) -> u32 {
        self.progress_for(lesson_id).map_or(0, |p| p.hints_used)
    }

    #[must_use]
    pub fn is_completed(&self, lesson_id: &LessonId) -> bool {
        self.progress_for(lesson_id).is_some_and(|p| p.completed)
    }

    #[must_use]
    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    /// Install a freshly onboarded user and session.
    pub fn sign_in(&mut self, user: User, session: SessionToken) {
        self.current_user = Some(user);
        self.session = Some(session);
    }

    pub fn set_current_lesson(&mut self, lesson_id: Option<LessonId>) {
        self.current_lesson = lesson_id;
    }

    /// Count one more hint against a lesson, creating its record if needed.
    ///
    /// Returns the updated hint count.
    pub fn record_hint_usage(&mut self, lesson_id: &LessonId) -> u32 {
        let record = self
            .progress
            .entry(lesson_id.clone())
            .or_insert_with(|| LessonProgress::new(lesson_id.clone()));
        record.hints_used = record.hints_used.saturating_add(1);
        record.hints_used
    }

    /// Mark a lesson complete and credit `earned_xp`.
    ///
    /// Overwrites any earlier record for the lesson. The signed-in user's
    /// level and streak are re-derived afterwards.
    pub fn record_completion(
        &mut self,
        lesson_id: &LessonId,
        hints_used: u32,
        earned_xp: u32,
        at: DateTime<Utc>,
    ) -> &LessonProgress {
        self.progress.insert(
            lesson_id.clone(),
            LessonProgress::completed(lesson_id.clone(), hints_used, at),
        );
        self.total_xp = self.total_xp.saturating_add(u64::from(earned_xp));

        let streak = streak_length(
            self.progress.values().filter_map(|p| p.last_attempt),
            at.date_naive(),
        );
        if let Some(user) = self.current_user.as_mut() {
            user.xp = user.xp.saturating_add(u64::from(earned_xp));
            user.level = level_for_xp(user.xp);
            user.streak = streak;
        }

        &self.progress[lesson_id]
    }

    /// Back to the all-empty default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Structural checks applied to a restored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StateError` describing the first inconsistency found.
    pub fn check_consistency(&self) -> Result<(), StateError> {
        for (key, record) in &self.progress {
            if key != &record.lesson_id {
                return Err(StateError::ProgressKeyMismatch {
                    key: key.clone(),
                    lesson_id: record.lesson_id.clone(),
                });
            }
            if let Some(score) = record.score {
                if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
                    return Err(StateError::ScoreOutOfRange {
                        lesson_id: key.clone(),
                        score,
                    });
                }
            }
        }
        if self.current_user.as_ref().is_some_and(|u| u.level == 0) {
            return Err(StateError::InvalidLevel);
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
