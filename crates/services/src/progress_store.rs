use std::sync::Arc;

use log::{debug, info, warn};

use lesson_core::{
    Catalog,
    model::{AppState, LessonId, LessonProgress, SessionToken, User, UserDraft, UserId},
    time::Clock,
};
use storage::{SlotRepository, StateSnapshotStore, Storage};

use crate::error::{AppServicesError, ProgressError};
use crate::profile::ProfileAggregator;

//
// ─── STORE ─────────────────────────────────────────────────────────────────────
//

/// Sole owner of `AppState`.
///
/// Every mutation is mirrored to the durable slot before it returns. If the
/// write fails the in-memory state is rolled back and the error surfaced, so
/// memory and storage never diverge.
pub struct ProgressStore {
    clock: Clock,
    catalog: Arc<Catalog>,
    snapshots: StateSnapshotStore,
    state: AppState,
}

impl ProgressStore {
    /// Restore state from `slots`, falling back to the empty default.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the slot backend cannot be read.
    /// Corrupt snapshots are not errors.
    pub async fn open(
        clock: Clock,
        catalog: Arc<Catalog>,
        slots: Arc<dyn SlotRepository>,
    ) -> Result<Self, ProgressError> {
        let snapshots = StateSnapshotStore::new(slots);
        let state = snapshots.load().await?;

        let orphans = state
            .progress()
            .keys()
            .filter(|id| !catalog.contains(id))
            .count();
        if orphans > 0 {
            warn!("{orphans} progress records refer to lessons missing from the catalog");
        }

        Ok(Self {
            clock,
            catalog,
            snapshots,
            state,
        })
    }

    /// Open a store backed by `SQLite` at `db_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated,
    /// or if the saved state cannot be read.
    pub async fn open_sqlite(
        db_url: &str,
        clock: Clock,
        catalog: Arc<Catalog>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::open(clock, catalog, storage.slots).await?)
    }

    /// Consistent read-only view of the state.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Derived statistics over the current state.
    #[must_use]
    pub fn profile(&self) -> ProfileAggregator<'_> {
        ProfileAggregator::new(&self.catalog, &self.state, self.clock)
    }

    /// Onboard a new user and issue a fresh session token.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::User` for blank fields, or a storage error.
    pub async fn sign_in(&mut self, draft: UserDraft) -> Result<User, ProgressError> {
        let user = draft.validate(UserId::generate())?;
        let previous = self.state.clone();
        self.state.sign_in(user.clone(), SessionToken::issue());
        self.commit(previous).await?;

        info!("Signed in {} ({})", user.name, user.id);
        Ok(user)
    }

    /// Select (or clear) the lesson currently open.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownLesson` for ids not in the catalog, or a
    /// storage error.
    pub async fn set_current_lesson(
        &mut self,
        lesson_id: Option<LessonId>,
    ) -> Result<(), ProgressError> {
        if let Some(id) = lesson_id.as_ref() {
            self.ensure_known(id)?;
        }
        if self.state.current_lesson() == lesson_id.as_ref() {
            return Ok(());
        }
        let previous = self.state.clone();
        self.state.set_current_lesson(lesson_id);
        self.commit(previous).await
    }

    /// Count one hint against `lesson_id`.
    ///
    /// Unconditional: de-duplicating repeated reveals is the gate's job.
    /// Returns the new hint count.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownLesson` or a storage error.
    pub async fn add_hint_usage(&mut self, lesson_id: &LessonId) -> Result<u32, ProgressError> {
        self.ensure_known(lesson_id)?;
        let previous = self.state.clone();
        let hints_used = self.state.record_hint_usage(lesson_id);
        self.commit(previous).await?;

        debug!("[Hints] Lesson {lesson_id}: {hints_used} used");
        Ok(hints_used)
    }

    /// Mark `lesson_id` completed and credit `earned_xp`.
    ///
    /// Re-completing overwrites the earlier record; XP is credited exactly as
    /// passed in.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownLesson` or a storage error.
    pub async fn complete_lesson(
        &mut self,
        lesson_id: &LessonId,
        hints_used: u32,
        earned_xp: u32,
    ) -> Result<LessonProgress, ProgressError> {
        self.ensure_known(lesson_id)?;
        let previous = self.state.clone();
        let record = self
            .state
            .record_completion(lesson_id, hints_used, earned_xp, self.clock.now())
            .clone();
        self.commit(previous).await?;

        info!(
            "[Completion] Lesson {lesson_id}: score {:?}, +{earned_xp} XP (total {})",
            record.score,
            self.state.total_xp()
        );
        Ok(record)
    }

    /// Reset to the empty default and erase the durable slot.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the slot cannot be erased; the in-memory
    /// state is left as it was.
    pub async fn logout(&mut self) -> Result<(), ProgressError> {
        let previous = std::mem::take(&mut self.state);
        if let Err(err) = self.snapshots.erase().await {
            self.state = previous;
            return Err(err.into());
        }
        info!("Logged out; state reset");
        Ok(())
    }

    fn ensure_known(&self, lesson_id: &LessonId) -> Result<(), ProgressError> {
        if self.catalog.contains(lesson_id) {
            Ok(())
        } else {
            Err(ProgressError::UnknownLesson(lesson_id.clone()))
        }
    }

    async fn commit(&mut self, previous: AppState) -> Result<(), ProgressError> {
        if let Err(err) = self.snapshots.save(&self.state).await {
            warn!("Persisting state failed, rolling back: {err}");
            self.state = previous;
            return Err(err.into());
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::model::{Challenge, Difficulty, Hint, Lesson};
    use lesson_core::time::fixed_now;
    use storage::{InMemorySlotRepository, STATE_SLOT_KEY, StorageError};

    fn lesson(id: &str, xp: u32) -> Lesson {
        Lesson {
            id: LessonId::new(id),
            title: id.to_string(),
            description: String::new(),
            skill: "JavaScript".into(),
            difficulty: Difficulty::Beginner,
            estimated_time: 15,
            xp,
            content: String::new(),
            code_example: String::new(),
            challenge: Challenge {
                description: String::new(),
                starter_code: String::new(),
                tests: Vec::new(),
            },
            hints: vec![Hint {
                level: 1,
                text: "try const".into(),
            }],
        }
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::new(vec![lesson("js-basics-1", 100), lesson("js-functions-1", 150)]).unwrap())
    }

    async fn open(repo: &InMemorySlotRepository) -> ProgressStore {
        ProgressStore::open(Clock::fixed(fixed_now()), catalog(), Arc::new(repo.clone()))
            .await
            .unwrap()
    }

    /// Slot backend whose writes always fail.
    struct ReadOnlySlots;

    #[async_trait::async_trait]
    impl SlotRepository for ReadOnlySlots {
        async fn read_slot(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }
        async fn write_slot(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("read-only".into()))
        }
        async fn delete_slot(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("read-only".into()))
        }
    }

    #[tokio::test]
    async fn every_mutation_is_persisted() {
        let repo = InMemorySlotRepository::new();
        let mut store = open(&repo).await;
        let id = LessonId::new("js-basics-1");

        store.add_hint_usage(&id).await.unwrap();
        let reopened = open(&repo).await;
        assert_eq!(reopened.state().hints_used(&id), 1);

        store.complete_lesson(&id, 1, 90).await.unwrap();
        let reopened = open(&repo).await;
        assert_eq!(reopened.state(), store.state());
        assert_eq!(reopened.state().total_xp(), 90);
    }

    #[tokio::test]
    async fn unknown_lessons_fail_fast() {
        let repo = InMemorySlotRepository::new();
        let mut store = open(&repo).await;
        let ghost = LessonId::new("ghost");

        assert!(matches!(
            store.add_hint_usage(&ghost).await,
            Err(ProgressError::UnknownLesson(_))
        ));
        assert!(matches!(
            store.complete_lesson(&ghost, 0, 100).await,
            Err(ProgressError::UnknownLesson(_))
        ));
        assert!(matches!(
            store.set_current_lesson(Some(ghost)).await,
            Err(ProgressError::UnknownLesson(_))
        ));
        assert!(store.state().progress().is_empty());
        assert_eq!(repo.read_slot(STATE_SLOT_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn sign_in_issues_session_and_fresh_user() {
        let repo = InMemorySlotRepository::new();
        let mut store = open(&repo).await;

        let user = store
            .sign_in(UserDraft::new("Ada", "ada@example.com"))
            .await
            .unwrap();
        assert_eq!(user.xp, 0);
        assert_eq!(store.state().current_user(), Some(&user));
        assert!(store.state().session().is_some());

        assert!(matches!(
            store.sign_in(UserDraft::new("", "x@y.z")).await,
            Err(ProgressError::User(_))
        ));
    }

    #[tokio::test]
    async fn failed_write_rolls_back() {
        let mut store =
            ProgressStore::open(Clock::fixed(fixed_now()), catalog(), Arc::new(ReadOnlySlots))
                .await
                .unwrap();
        let id = LessonId::new("js-basics-1");

        assert!(matches!(
            store.complete_lesson(&id, 0, 100).await,
            Err(ProgressError::Storage(_))
        ));
        assert_eq!(store.state(), &AppState::default());

        assert!(store.logout().await.is_err());
    }

    #[tokio::test]
    async fn logout_clears_state_and_slot() {
        let repo = InMemorySlotRepository::new();
        let mut store = open(&repo).await;
        store
            .sign_in(UserDraft::new("Ada", "ada@example.com"))
            .await
            .unwrap();
        store
            .complete_lesson(&LessonId::new("js-functions-1"), 0, 150)
            .await
            .unwrap();

        store.logout().await.unwrap();
        assert_eq!(store.state(), &AppState::default());
        assert_eq!(repo.read_slot(STATE_SLOT_KEY).await.unwrap(), None);
        assert_eq!(open(&repo).await.state(), &AppState::default());
    }

    #[tokio::test]
    async fn current_lesson_round_trips() {
        let repo = InMemorySlotRepository::new();
        let mut store = open(&repo).await;
        let id = LessonId::new("js-functions-1");

        store.set_current_lesson(Some(id.clone())).await.unwrap();
        assert_eq!(open(&repo).await.state().current_lesson(), Some(&id));

        store.set_current_lesson(None).await.unwrap();
        assert_eq!(open(&repo).await.state().current_lesson(), None);
    }
}
