mod attempt;
mod ids;
mod lesson;
mod progress;
mod state;
mod user;

pub use attempt::{AttemptReport, TestOutcome};
pub use ids::{LessonId, SessionToken, UserId};
pub use lesson::{Challenge, ChallengeTest, Difficulty, Hint, Lesson};
pub use progress::LessonProgress;
pub use state::{AppState, StateError};
pub use user::{User, UserDraft, UserError};
