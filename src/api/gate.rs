//! Request gate: authentication enforcement ahead of every page handler.
//!
//! Paths are classified against a declarative rule table built once at
//! startup. Unauthenticated requests to protected paths are redirected to the
//! login route with the original path remembered in the session; the gate
//! itself never fails a request.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use super::AppState;
use crate::services::AuthSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
}

#[derive(Debug, Clone, Copy)]
enum Rule {
    Exact(&'static str),
    Prefix(&'static str),
    Suffix(&'static str),
}

impl Rule {
    fn matches(self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Prefix(prefix) => path.starts_with(prefix),
            Self::Suffix(suffix) => path.ends_with(suffix),
        }
    }
}

/// Unauthenticated routes: login flow, OAuth callback, logout, the public
/// print sub-tree, static assets, and the root path.
const PUBLIC_RULES: &[Rule] = &[
    Rule::Exact("/"),
    Rule::Exact("/login"),
    Rule::Exact("/auth"),
    Rule::Exact("/logout"),
    Rule::Exact("/unauthorized"),
    Rule::Exact("/favicon.ico"),
    Rule::Prefix("/print/"),
    Rule::Prefix("/assets/"),
    Rule::Suffix(".ico"),
    Rule::Suffix(".png"),
    Rule::Suffix(".css"),
    Rule::Suffix(".js"),
];

/// Route-classification table, evaluated once per request.
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    rules: &'static [Rule],
}

impl Default for RouteClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteClassifier {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rules: PUBLIC_RULES,
        }
    }

    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.rules.iter().any(|rule| rule.matches(path)) {
            RouteClass::Public
        } else {
            RouteClass::Protected
        }
    }
}

/// Middleware run ahead of every inbound request. Classification happens
/// before any protected handler executes; the downstream handler is never
/// invoked for a rejected request.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if state.routes.classify(&path) == RouteClass::Public {
        return next.run(request).await;
    }

    if session.is_authenticated().await {
        return next.run(request).await;
    }

    // Remember where the visitor wanted to go, then send them to login.
    if let Err(e) = session.remember_referrer(&path).await {
        tracing::warn!("Failed to remember referrer path {path}: {e}");
    }

    Redirect::to("/login").into_response()
}
