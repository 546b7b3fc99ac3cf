//! Read-only lesson catalog, validated once at load time.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use thiserror::Error;

use crate::model::{Difficulty, Lesson, LessonId};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("invalid catalog json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate lesson id: {0}")]
    DuplicateId(LessonId),
    #[error("lesson {0} has no XP reward")]
    ZeroXp(LessonId),
    #[error("lesson {0} has an empty skill")]
    EmptySkill(LessonId),
    #[error("lesson {lesson_id}: expected hint level {expected}, found {found}")]
    HintLevels {
        lesson_id: LessonId,
        expected: u32,
        found: u32,
    },
}

/// Immutable set of lessons, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    lessons: Vec<Lesson>,
    index: HashMap<LessonId, usize>,
}

impl Catalog {
    /// Build a catalog, checking the invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` for duplicate ids, zero XP, blank skills, or
    /// hint levels that do not run 1, 2, 3, ... in order.
    pub fn new(lessons: Vec<Lesson>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(lessons.len());
        for (pos, lesson) in lessons.iter().enumerate() {
            if lesson.xp == 0 {
                return Err(CatalogError::ZeroXp(lesson.id.clone()));
            }
            if lesson.skill.trim().is_empty() {
                return Err(CatalogError::EmptySkill(lesson.id.clone()));
            }
            for (expected, hint) in (1_u32..).zip(&lesson.hints) {
                if hint.level != expected {
                    return Err(CatalogError::HintLevels {
                        lesson_id: lesson.id.clone(),
                        expected,
                        found: hint.level,
                    });
                }
            }
            if index.insert(lesson.id.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateId(lesson.id.clone()));
            }
        }
        Ok(Self { lessons, index })
    }

    /// Parse a JSON array of lessons.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` on malformed JSON, or any validation error
    /// from [`Catalog::new`].
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let lessons: Vec<Lesson> = serde_json::from_str(raw)?;
        Self::new(lessons)
    }

    #[must_use]
    pub fn get(&self, id: &LessonId) -> Option<&Lesson> {
        self.index.get(id).map(|&pos| &self.lessons[pos])
    }

    #[must_use]
    pub fn contains(&self, id: &LessonId) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    /// Distinct skills in first-seen order.
    #[must_use]
    pub fn skills(&self) -> Vec<&str> {
        let mut skills: Vec<&str> = Vec::new();
        for lesson in &self.lessons {
            if !skills.contains(&lesson.skill.as_str()) {
                skills.push(&lesson.skill);
            }
        }
        skills
    }

    /// Lessons matching every criterion of `filter`, in catalog order.
    #[must_use]
    pub fn filter<'a>(&'a self, filter: &'a LessonFilter) -> impl Iterator<Item = &'a Lesson> + 'a {
        self.lessons.iter().filter(move |lesson| filter.matches(lesson))
    }
}

//
// ─── FILTER ────────────────────────────────────────────────────────────────────
//

/// Browse criteria. The default matches everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonFilter {
    /// Case-insensitive substring of title or description; blank matches all.
    pub query: String,
    /// Empty means every skill.
    pub skills: Vec<String>,
    pub difficulty: RangeInclusive<Difficulty>,
}

impl Default for LessonFilter {
    fn default() -> Self {
        Self {
            query: String::new(),
            skills: Vec::new(),
            difficulty: Difficulty::Beginner..=Difficulty::Advanced,
        }
    }
}

impl LessonFilter {
    #[must_use]
    pub fn matches(&self, lesson: &Lesson) -> bool {
        let query = self.query.trim().to_lowercase();
        let matches_query = query.is_empty()
            || lesson.title.to_lowercase().contains(&query)
            || lesson.description.to_lowercase().contains(&query);
        let matches_skill = self.skills.is_empty() || self.skills.iter().any(|s| s == &lesson.skill);

        matches_query && matches_skill && self.difficulty.contains(&lesson.difficulty)
    }
}
