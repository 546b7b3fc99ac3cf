use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::LessonId;
use crate::scoring::completion_score;

/// Persisted per-lesson outcome for the current user.
///
/// `completed` only ever moves from `false` to `true`, and `hints_used`
/// never decreases except when a re-completion overwrites the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub lesson_id: LessonId,
    pub completed: bool,
    pub hints_used: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl LessonProgress {
    /// Fresh, untouched record.
    #[must_use]
    pub fn new(lesson_id: LessonId) -> Self {
        Self {
            lesson_id,
            completed: false,
            hints_used: 0,
            last_attempt: None,
            score: None,
        }
    }

    /// Completed record, scored from the hint count.
    #[must_use]
    pub fn completed(lesson_id: LessonId, hints_used: u32, at: DateTime<Utc>) -> Self {
        Self {
            lesson_id,
            completed: true,
            hints_used,
            last_attempt: Some(at),
            score: Some(completion_score(hints_used)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn completed_record_is_scored() {
        let record = LessonProgress::completed(LessonId::new("a"), 2, fixed_now());
        assert!(record.completed);
        assert_eq!(record.score, Some(80));
        assert_eq!(record.last_attempt, Some(fixed_now()));
    }

    #[test]
    fn untouched_record_omits_optional_fields() {
        let json = serde_json::to_value(LessonProgress::new(LessonId::new("a"))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "lessonId": "a", "completed": false, "hintsUsed": 0 })
        );
    }
}
