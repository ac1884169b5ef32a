use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};
use tokio::task;

use crate::entities::users;

/// Username of the protected administrator account.
pub const ADMIN_USERNAME: &str = "admin";

/// User data returned from the repository (without the password hash).
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl From<users::Model> for UserRecord {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            full_name: model.full_name,
            is_admin: model.is_admin,
            is_active: model.is_active,
            created_at: model.created_at,
            last_login: model.last_login,
        }
    }
}

/// Input for creating a user row. The plaintext password is hashed here and
/// never persisted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    DuplicateUsername,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// The protected admin account cannot be removed.
    Forbidden,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new user row. Username uniqueness is enforced by the unique
    /// index; a conflicting insert fails atomically and is reported as
    /// [`InsertOutcome::DuplicateUsername`].
    pub async fn insert(&self, new_user: NewUser) -> Result<InsertOutcome> {
        let password = new_user.password;
        let password_hash = task::spawn_blocking(move || hash_password(&password))
            .await
            .context("Password hashing task panicked")??;

        let active = users::ActiveModel {
            username: Set(new_user.username),
            password_hash: Set(password_hash),
            email: Set(new_user.email),
            full_name: Set(new_user.full_name),
            is_admin: Set(new_user.is_admin),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            last_login: Set(None),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(_) => Ok(InsertOutcome::Created),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Ok(InsertOutcome::DuplicateUsername),
                _ => Err(err).context("Failed to insert user"),
            },
        }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(UserRecord::from))
    }

    /// List all users, newest first.
    pub async fn list_all(&self) -> Result<Vec<UserRecord>> {
        let users = users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(users.into_iter().map(UserRecord::from).collect())
    }

    /// Delete a user row. The admin account is protected and can never be
    /// removed, regardless of the caller.
    pub async fn delete(&self, username: &str) -> Result<DeleteOutcome> {
        if username == ADMIN_USERNAME {
            return Ok(DeleteOutcome::Forbidden);
        }

        let result = users::Entity::delete_many()
            .filter(users::Column::Username.eq(username))
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;

        if result.rows_affected > 0 {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }

    /// Verify a username/password pair against the stored hash and return the
    /// user record on success. Only active users can authenticate; the caller
    /// cannot distinguish "no such user" from "wrong password".
    ///
    /// Note: Argon2 verification is CPU-intensive, so it runs inside
    /// `spawn_blocking` to avoid stalling the async runtime.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRecord>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .filter(users::Column::IsActive.eq(true))
            .one(&self.conn)
            .await
            .context("Failed to query user for credential verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .context("Password verification task panicked")??;

        if !is_valid {
            return Ok(None);
        }

        self.record_login(user.id).await?;

        Ok(Some(UserRecord::from(user)))
    }

    /// Set `last_login` to the current time. Advisory only; concurrent logins
    /// by the same user are last-write-wins.
    pub async fn record_login(&self, user_id: i32) -> Result<()> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for login recording")?
            .ok_or_else(|| anyhow::anyhow!("User not found: id {user_id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.last_login = Set(Some(chrono::Utc::now().to_rfc3339()));
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Idempotently ensure the protected admin account exists and carries the
    /// admin flag. Safe to call on every process start.
    pub async fn ensure_admin(&self) -> Result<()> {
        let existing = users::Entity::find()
            .filter(users::Column::Username.eq(ADMIN_USERNAME))
            .one(&self.conn)
            .await
            .context("Failed to query admin user")?;

        match existing {
            None => {
                let outcome = self
                    .insert(NewUser {
                        username: ADMIN_USERNAME.to_string(),
                        password: "admin".to_string(),
                        email: Some("admin@localhost".to_string()),
                        full_name: Some("Administrator".to_string()),
                        is_admin: true,
                    })
                    .await?;
                if outcome == InsertOutcome::Created {
                    tracing::info!("Default admin user created (username: admin)");
                }
                Ok(())
            }
            Some(user) if !user.is_admin => {
                let mut active: users::ActiveModel = user.into();
                active.is_admin = Set(true);
                active.update(&self.conn).await?;
                tracing::info!("Restored admin flag on the admin user");
                Ok(())
            }
            Some(_) => Ok(()),
        }
    }
}

/// Hash a password using Argon2id with a per-user random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a plaintext password against an Argon2id hash string.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
