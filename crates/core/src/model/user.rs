use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("email must not be empty")]
    EmptyEmail,
}

/// Onboarded learner. `level` and `streak` are derived from progress and
/// refreshed whenever a lesson is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub xp: u64,
    pub level: u32,
    pub streak: u32,
}

/// Unvalidated onboarding input.
#[derive(Clone, Debug, Default)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
}

impl UserDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Validate the draft and mint a fresh user with zeroed progress.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the name or email is blank.
    pub fn validate(self, id: UserId) -> Result<User, UserError> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        if name.is_empty() {
            return Err(UserError::EmptyName);
        }
        if email.is_empty() {
            return Err(UserError::EmptyEmail);
        }

        Ok(User {
            id,
            name,
            email,
            avatar: None,
            xp: 0,
            level: 1,
            streak: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_trims_and_starts_at_level_one() {
        let user = UserDraft::new("  Ada ", "ada@example.com ")
            .validate(UserId::new("user_1"))
            .unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!((user.xp, user.level, user.streak), (0, 1, 0));
    }

    #[test]
    fn blank_fields_are_rejected() {
        let err = UserDraft::new("   ", "a@b.c")
            .validate(UserId::new("u"))
            .unwrap_err();
        assert_eq!(err, UserError::EmptyName);

        let err = UserDraft::new("Ada", "")
            .validate(UserId::new("u"))
            .unwrap_err();
        assert_eq!(err, UserError::EmptyEmail);
    }
}
