use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod error;
pub mod gate;
mod pages;
mod trends;
mod types;
mod users;

pub use error::{ApiError, ApiResult};
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub routes: gate::RouteClassifier,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn users(&self) -> &Arc<dyn crate::services::UserService> {
        &self.shared.user_service
    }

    #[must_use]
    pub fn google(&self) -> &Arc<crate::clients::google::GoogleOAuthClient> {
        &self.shared.google
    }

    #[must_use]
    pub fn naver(&self) -> &Arc<crate::clients::naver::NaverClient> {
        &self.shared.naver
    }
}

#[must_use]
pub fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        routes: gate::RouteClassifier::new(),
    })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (secure_cookies, session_timeout_minutes) = {
        let config = state.config().read().await;
        (
            config.server.secure_cookies,
            config.server.session_timeout_minutes,
        )
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_timeout_minutes,
        )));

    // The gate layer is registered before the session layer so the session
    // middleware runs first on every inbound request.
    Router::new()
        .route("/", get(auth::root))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/auth", get(auth::oauth_callback))
        .route("/unauthorized", get(pages::unauthorized))
        .route("/dashboard", get(pages::dashboard))
        .route("/settings", get(pages::settings))
        .route("/shipping", get(pages::section))
        .route("/production", get(pages::section))
        .route("/orders", get(pages::section))
        .route("/pallets", get(pages::section))
        .route("/packing", get(pages::section))
        .route("/trends/blog", get(pages::section))
        .route("/trends/local", get(pages::section))
        .route("/trends/datalab", get(pages::section))
        .route("/print/{data}", get(pages::print))
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/{username}", delete(users::delete_user))
        .route("/api/trends/blog", get(trends::search_blog))
        .route("/api/trends/local", get(trends::search_local))
        .route("/api/trends/datalab", post(trends::search_datalab))
        .fallback(pages::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_auth,
        ))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
