#![forbid(unsafe_code)]

pub mod error;
pub mod lesson_flow;
pub mod profile;
pub mod progress_store;

pub use lesson_core::Clock;

pub use error::{AppServicesError, LessonFlowError, ProgressError};
pub use lesson_flow::{Completion, LessonSession};
pub use profile::{ProfileAggregator, ProfileSummary, SkillProgress};
pub use progress_store::ProgressStore;
