use log::{debug, info};

use lesson_core::{
    hints::{HintGate, HintReveal},
    model::{AttemptReport, Hint, Lesson, LessonId, LessonProgress},
    scoring::compute_xp,
};

use crate::error::{LessonFlowError, ProgressError};
use crate::progress_store::ProgressStore;

/// Outcome of finishing a lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub progress: LessonProgress,
    pub earned_xp: u32,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One learner working through one lesson.
///
/// Holds the session-local hint gate and latest test results; all persistent
/// effects go through the `ProgressStore` passed to each call.
pub struct LessonSession {
    lesson: Lesson,
    gate: HintGate,
    hints_used: u32,
    last_attempt: Option<AttemptReport>,
}

impl LessonSession {
    /// Open `lesson_id`, marking it current and restoring hint state from the
    /// persisted usage count.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownLesson` if the catalog lacks the lesson,
    /// or a storage error.
    pub async fn start(
        store: &mut ProgressStore,
        lesson_id: &LessonId,
    ) -> Result<Self, LessonFlowError> {
        let lesson = store
            .catalog()
            .get(lesson_id)
            .cloned()
            .ok_or_else(|| ProgressError::UnknownLesson(lesson_id.clone()))?;
        store.set_current_lesson(Some(lesson_id.clone())).await?;

        let hints_used = store.state().hints_used(lesson_id);
        let gate = HintGate::resume(lesson.hint_count(), hints_used);
        debug!(
            "Opened lesson {lesson_id}: {hints_used} hints used, {} revealed",
            gate.revealed().len()
        );

        Ok(Self {
            lesson,
            gate,
            hints_used,
            last_attempt: None,
        })
    }

    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    #[must_use]
    pub fn gate(&self) -> &HintGate {
        &self.gate
    }

    #[must_use]
    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    /// Hints currently visible, in level order.
    pub fn revealed_hints(&self) -> impl Iterator<Item = &Hint> {
        self.lesson
            .hints
            .iter()
            .filter(|hint| self.gate.is_revealed(hint.level))
    }

    /// XP the learner would earn if they completed now.
    #[must_use]
    pub fn potential_xp(&self) -> u32 {
        compute_xp(self.lesson.xp, self.hints_used)
    }

    #[must_use]
    pub fn last_attempt(&self) -> Option<&AttemptReport> {
        self.last_attempt.as_ref()
    }

    /// Reveal hint `level`, charging one hint usage if it was hidden.
    ///
    /// # Errors
    ///
    /// Returns `LessonFlowError::Hint` for out-of-order or nonexistent levels,
    /// or a progress error if recording the usage fails. Nothing changes on error.
    pub async fn reveal_hint(
        &mut self,
        store: &mut ProgressStore,
        level: u32,
    ) -> Result<HintReveal, LessonFlowError> {
        let mut gate = self.gate.clone();
        let reveal = gate.reveal(level)?;
        if reveal.is_new() {
            self.hints_used = store.add_hint_usage(&self.lesson.id).await?;
            self.gate = gate;
            info!(
                "Revealed hint {level} for {}; potential XP now {}",
                self.lesson.id,
                self.potential_xp()
            );
        }
        Ok(reveal)
    }

    /// Record the external runner's verdicts. Returns whether the attempt passed.
    pub fn record_attempt(&mut self, report: AttemptReport) -> bool {
        let expected = self.lesson.challenge.tests.len();
        if report.outcomes().len() != expected {
            debug!(
                "Attempt for {} reported {} outcomes for {expected} tests",
                self.lesson.id,
                report.outcomes().len()
            );
        }
        self.last_attempt = Some(report);
        self.attempt_passed()
    }

    /// Latest attempt passed. A lesson without tests passes on any recorded attempt.
    fn attempt_passed(&self) -> bool {
        self.last_attempt.as_ref().is_some_and(|report| {
            report.all_passed() || self.lesson.challenge.tests.is_empty()
        })
    }

    /// Whether `complete` would currently be accepted.
    #[must_use]
    pub fn can_complete(&self, store: &ProgressStore) -> bool {
        self.attempt_passed() && !store.state().is_completed(&self.lesson.id)
    }

    /// Finalize the lesson with the XP earned at the current hint count.
    ///
    /// # Errors
    ///
    /// Returns `LessonFlowError::TestsNotPassed` unless the latest attempt passed,
    /// `LessonFlowError::AlreadyCompleted` if the lesson was finished before, or a
    /// progress error from the store.
    pub async fn complete(
        &mut self,
        store: &mut ProgressStore,
    ) -> Result<Completion, LessonFlowError> {
        if !self.attempt_passed() {
            return Err(LessonFlowError::TestsNotPassed);
        }
        if store.state().is_completed(&self.lesson.id) {
            return Err(LessonFlowError::AlreadyCompleted(self.lesson.id.clone()));
        }

        let earned_xp = self.potential_xp();
        let progress = store
            .complete_lesson(&self.lesson.id, self.hints_used, earned_xp)
            .await?;
        Ok(Completion {
            progress,
            earned_xp,
        })
    }
}
