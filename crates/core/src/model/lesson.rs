use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::LessonId;

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Lesson difficulty, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    /// Parses the lowercase catalog spelling.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// One check the external test runner evaluates against submitted code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeTest {
    pub input: String,
    pub expected: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub description: String,
    pub starter_code: String,
    pub tests: Vec<ChallengeTest>,
}

/// A progressively more revealing tip. Levels start at 1 and are contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub level: u32,
    pub text: String,
}

/// Read-only lesson record supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub description: String,
    pub skill: String,
    pub difficulty: Difficulty,
    /// Minutes.
    pub estimated_time: u32,
    /// Base XP reward before hint deductions.
    pub xp: u32,
    pub content: String,
    pub code_example: String,
    pub challenge: Challenge,
    pub hints: Vec<Hint>,
}

impl Lesson {
    /// Number of hint levels this lesson offers.
    #[must_use]
    pub fn hint_count(&self) -> u32 {
        u32::try_from(self.hints.len()).unwrap_or(u32::MAX)
    }

    /// Hint text for a level, if the lesson has one.
    #[must_use]
    pub fn hint(&self, level: u32) -> Option<&Hint> {
        self.hints.iter().find(|hint| hint.level == level)
    }
}
