//! Domain service for user management.
//!
//! A validating façade over the credential store: input shape and length
//! checks, the protected-admin rule, and credential verification.

use serde::Serialize;
use thiserror::Error;

use crate::db::UserRecord;
use crate::services::auth_session::SessionProfile;

/// Infrastructure errors from user operations. Business failures (bad input,
/// duplicate username, protected admin) are not errors; they surface as an
/// unsuccessful [`ActionResult`].
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        if err.downcast_ref::<sea_orm::DbErr>().is_some() {
            Self::Database(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

/// Structured outcome of a user mutation, surfaced directly to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_admin: bool,
}

/// Domain service trait for user management.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Validates and creates a user. Validation failures and duplicate
    /// usernames come back as an unsuccessful result, never an error.
    async fn create_user(&self, request: CreateUser) -> Result<ActionResult, UserError>;

    /// Deletes a user. The admin account is always refused.
    async fn delete_user(&self, username: &str) -> Result<ActionResult, UserError>;

    /// Lists all users, newest first.
    async fn list_users(&self) -> Result<Vec<UserRecord>, UserError>;

    /// Verifies credentials and returns the user record, or `None` for any
    /// failure. Unknown user and wrong password are indistinguishable.
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, UserError>;
}

/// Pure admin predicate over an optional session profile.
#[must_use]
pub fn is_admin(profile: Option<&SessionProfile>) -> bool {
    profile.is_some_and(|p| p.is_admin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin_tolerates_missing_profile() {
        assert!(!is_admin(None));
    }

    #[test]
    fn test_is_admin_reads_flag() {
        let mut profile = SessionProfile::default();
        assert!(!is_admin(Some(&profile)));
        profile.is_admin = true;
        assert!(is_admin(Some(&profile)));
    }
}
