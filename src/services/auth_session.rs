//! Per-request session context for authentication state.
//!
//! Wraps the framework session in a typed interface: a session is either
//! anonymous or authenticated, login/logout are the only transitions, and the
//! remembered pre-login path is consumed exactly once.

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::clients::google::GoogleProfile;
use crate::db::UserRecord;
use crate::services::user_service;

const AUTHENTICATED_KEY: &str = "authenticated";
const USERDATA_KEY: &str = "userdata";
const REFERRER_KEY: &str = "referrer_path";
const ACCESS_TOKEN_KEY: &str = "access_token";
const ID_TOKEN_KEY: &str = "id_token";

type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// The authenticated visitor's profile, held in session state. Populated from
/// a local user record or from the external identity provider's profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionProfile {
    pub id: Option<i32>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub login_type: String,
}

impl From<&UserRecord> for SessionProfile {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: Some(user.id),
            username: Some(user.username.clone()),
            email: Some(
                user.email
                    .clone()
                    .unwrap_or_else(|| format!("{}@localhost", user.username)),
            ),
            name: Some(
                user.full_name
                    .clone()
                    .unwrap_or_else(|| user.username.clone()),
            ),
            is_admin: user.is_admin,
            login_type: "local".to_string(),
        }
    }
}

impl From<GoogleProfile> for SessionProfile {
    fn from(profile: GoogleProfile) -> Self {
        Self {
            id: None,
            username: None,
            email: profile.email,
            name: profile.name,
            is_admin: false,
            login_type: "google".to_string(),
        }
    }
}

/// Typed view over a visitor's session.
#[derive(Clone)]
pub struct AuthSession {
    session: Session,
}

impl AuthSession {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Marks the session authenticated and stores the profile. Atomic from
    /// the session's perspective: there is no intermediate state.
    pub async fn login(&self, profile: &SessionProfile) -> SessionResult<()> {
        self.session.insert(USERDATA_KEY, profile).await?;
        self.session.insert(AUTHENTICATED_KEY, true).await?;
        Ok(())
    }

    /// Clears all session state unconditionally.
    pub async fn logout(&self) -> SessionResult<()> {
        self.session.flush().await
    }

    pub async fn current_user(&self) -> SessionResult<Option<SessionProfile>> {
        self.session.get::<SessionProfile>(USERDATA_KEY).await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session
            .get::<bool>(AUTHENTICATED_KEY)
            .await
            .ok()
            .flatten()
            .unwrap_or(false)
    }

    pub async fn is_current_user_admin(&self) -> bool {
        let profile = self.current_user().await.ok().flatten();
        user_service::is_admin(profile.as_ref())
    }

    /// Remembers the path requested before redirect-to-login.
    pub async fn remember_referrer(&self, path: &str) -> SessionResult<()> {
        self.session.insert(REFERRER_KEY, path).await
    }

    /// Consumes the remembered path, clearing it from the session.
    pub async fn take_referrer(&self) -> SessionResult<Option<String>> {
        self.session.remove::<String>(REFERRER_KEY).await
    }

    /// Stores raw tokens from the external identity exchange.
    pub async fn store_tokens(
        &self,
        access_token: &str,
        id_token: Option<&str>,
    ) -> SessionResult<()> {
        self.session.insert(ACCESS_TOKEN_KEY, access_token).await?;
        if let Some(id_token) = id_token {
            self.session.insert(ID_TOKEN_KEY, id_token).await?;
        }
        Ok(())
    }
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Session::from_request_parts(parts, state).await.map(Self::new)
    }
}
