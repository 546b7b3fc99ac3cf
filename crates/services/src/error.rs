//! Shared error types for the services crate.

use thiserror::Error;

use lesson_core::hints::HintError;
use lesson_core::model::{LessonId, UserError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("unknown lesson id: {0}")]
    UnknownLesson(LessonId),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LessonSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonFlowError {
    #[error(transparent)]
    Hint(#[from] HintError),
    #[error("latest attempt has not passed every test")]
    TestsNotPassed,
    #[error("lesson {0} is already completed")]
    AlreadyCompleted(LessonId),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
