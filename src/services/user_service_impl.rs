//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;

use crate::db::{ADMIN_USERNAME, DeleteOutcome, InsertOutcome, NewUser, Store, UserRecord};
use crate::services::user_service::{ActionResult, CreateUser, UserError, UserService};

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

pub struct SeaOrmUserService {
    store: Store,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn create_user(&self, request: CreateUser) -> Result<ActionResult, UserError> {
        let username = request.username.trim().to_string();
        let password = request.password.trim().to_string();

        if username.is_empty() {
            return Ok(ActionResult::fail("Username is required"));
        }
        if password.is_empty() {
            return Ok(ActionResult::fail("Password is required"));
        }
        if username.len() < MIN_USERNAME_LEN {
            return Ok(ActionResult::fail(format!(
                "Username must be at least {MIN_USERNAME_LEN} characters"
            )));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Ok(ActionResult::fail(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let email = request
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        let full_name = request
            .full_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let outcome = self
            .store
            .create_user(NewUser {
                username: username.clone(),
                password,
                email,
                full_name,
                is_admin: request.is_admin,
            })
            .await?;

        match outcome {
            InsertOutcome::Created => {
                tracing::info!("User '{username}' created");
                Ok(ActionResult::ok(format!(
                    "User '{username}' created successfully"
                )))
            }
            InsertOutcome::DuplicateUsername => Ok(ActionResult::fail(format!(
                "Username '{username}' already exists"
            ))),
        }
    }

    async fn delete_user(&self, username: &str) -> Result<ActionResult, UserError> {
        let username = username.trim();

        if username.is_empty() {
            return Ok(ActionResult::fail("Username is required"));
        }
        if username == ADMIN_USERNAME {
            return Ok(ActionResult::fail("Cannot delete the admin user"));
        }

        match self.store.delete_user(username).await? {
            DeleteOutcome::Deleted => {
                tracing::info!("User '{username}' deleted");
                Ok(ActionResult::ok(format!(
                    "User '{username}' deleted successfully"
                )))
            }
            DeleteOutcome::NotFound | DeleteOutcome::Forbidden => Ok(ActionResult::fail(format!(
                "Failed to delete user '{username}' or user not found"
            ))),
        }
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, UserError> {
        Ok(self.store.list_users().await?)
    }

    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, UserError> {
        if username.trim().is_empty() || password.is_empty() {
            return Ok(None);
        }

        Ok(self
            .store
            .verify_credentials(username.trim(), password)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> SeaOrmUserService {
        let store = Store::new("sqlite::memory:").await.unwrap();
        SeaOrmUserService::new(store)
    }

    fn request(username: &str, password: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            password: password.to_string(),
            email: None,
            full_name: None,
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_create_then_duplicate() {
        let service = service().await;

        let first = service.create_user(request("bob", "secret1")).await.unwrap();
        assert!(first.success);

        let second = service.create_user(request("bob", "secret1")).await.unwrap();
        assert!(!second.success);
        assert!(second.message.contains("already exists"));
    }

    #[tokio::test]
    async fn test_username_too_short() {
        let service = service().await;

        let result = service.create_user(request("ab", "secret1")).await.unwrap();
        assert!(!result.success);
        assert!(result.message.contains("3 characters"));
    }

    #[tokio::test]
    async fn test_password_too_short() {
        let service = service().await;

        let result = service.create_user(request("bob", "12345")).await.unwrap();
        assert!(!result.success);
        assert!(result.message.contains("6 characters"));
    }

    #[tokio::test]
    async fn test_inputs_are_trimmed() {
        let service = service().await;

        let result = service
            .create_user(request("  bob  ", " secret1 "))
            .await
            .unwrap();
        assert!(result.success);

        let user = service
            .authenticate("bob", "secret1")
            .await
            .unwrap()
            .expect("trimmed credentials should authenticate");
        assert_eq!(user.username, "bob");
    }

    #[tokio::test]
    async fn test_admin_delete_always_refused() {
        let service = service().await;

        let result = service.delete_user("admin").await.unwrap();
        assert!(!result.success);
        assert!(result.message.contains("Cannot delete the admin user"));
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let service = service().await;

        let result = service.delete_user("ghost").await.unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_fresh_store_admin_login() {
        let service = service().await;

        let user = service
            .authenticate("admin", "admin")
            .await
            .unwrap()
            .expect("default admin should authenticate");
        assert!(user.is_admin);
    }

    #[tokio::test]
    async fn test_blank_credentials_never_authenticate() {
        let service = service().await;

        assert!(service.authenticate("", "admin").await.unwrap().is_none());
        assert!(service.authenticate("admin", "").await.unwrap().is_none());
    }
}
