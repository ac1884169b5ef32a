//! Login, logout, and OAuth callback handlers.
//!
//! Authentication failures never surface as errors here: every failing path
//! degrades to a redirect back to the login page, and no session state is
//! mutated until the whole exchange has succeeded.

use axum::{
    Form,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::AppState;
use crate::services::{AuthSession, SessionProfile};

pub const DEFAULT_LANDING: &str = "/dashboard";

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginPageQuery {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
}

/// Where to send a visitor after a successful login. Problematic referrers
/// (the root path, icon requests) fall back to the main landing route.
fn post_login_target(referrer: Option<String>) -> String {
    match referrer {
        Some(path) if path != "/" && !path.ends_with(".ico") => path,
        _ => DEFAULT_LANDING.to_string(),
    }
}

/// GET /
/// Root path: authenticated visitors continue to their remembered page,
/// everyone else goes to login.
pub async fn root(session: AuthSession) -> Redirect {
    if session.is_authenticated().await {
        let referrer = session.take_referrer().await.ok().flatten();
        Redirect::to(&post_login_target(referrer))
    } else {
        Redirect::to("/login")
    }
}

/// GET /login
/// Renders the local-login form and, when configured, the Google OAuth link.
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Query(query): Query<LoginPageQuery>,
) -> Response {
    if session.is_authenticated().await {
        return Redirect::to(DEFAULT_LANDING).into_response();
    }

    let config = state.config().read().await.clone();

    let error_banner = if query.error.is_some() {
        "<p class=\"error\">Invalid username or password</p>"
    } else {
        ""
    };

    let google_section = if config.google_login_enabled() {
        format!(
            "<p><a href=\"{}\">Sign in with Google</a></p>",
            state.google().authorization_url()
        )
    } else {
        String::new()
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>{app} - Login</title></head>
<body>
<h1>{app}</h1>
<p>You are not logged in.</p>
{error_banner}
<form method="post" action="/login">
  <input name="username" placeholder="Username" autofocus>
  <input name="password" type="password" placeholder="Password">
  <button type="submit">Sign In</button>
</form>
{google_section}
</body>
</html>"#,
        app = config.general.app_name,
    ))
    .into_response()
}

/// POST /login
/// Local username/password login. On success the session becomes
/// authenticated and the visitor returns to the path they originally asked
/// for. Every failure redirects back to the login page with a generic
/// message; "unknown user" and "wrong password" are indistinguishable.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Form(form): Form<LoginForm>,
) -> Redirect {
    let username = form.username.trim();

    if username.is_empty() || form.password.is_empty() {
        return Redirect::to("/login?error=1");
    }

    let user = match state.users().authenticate(username, &form.password).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::info!("Failed login attempt for '{username}'");
            return Redirect::to("/login?error=1");
        }
        Err(e) => {
            tracing::error!("Login error for '{username}': {e}");
            return Redirect::to("/login?error=1");
        }
    };

    let profile = SessionProfile::from(&user);
    if let Err(e) = session.login(&profile).await {
        tracing::error!("Failed to create session for '{username}': {e}");
        return Redirect::to("/login?error=1");
    }

    tracing::info!("Local user logged in: {username}");

    let referrer = session.take_referrer().await.ok().flatten();
    Redirect::to(&post_login_target(referrer))
}

/// GET /auth?code=<code>
/// OAuth callback: exchange the authorization code for tokens, fetch the
/// external profile, then log the session in. Any step failing aborts with a
/// redirect to login and leaves the session untouched.
pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        tracing::error!("OAuth callback without an authorization code");
        return Redirect::to("/login");
    };

    let tokens = match state.google().exchange_code(&code).await {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::error!("OAuth token exchange failed: {e}");
            return Redirect::to("/login");
        }
    };

    let profile = match state.google().fetch_profile(&tokens.access_token).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!("OAuth userinfo fetch failed: {e}");
            return Redirect::to("/login");
        }
    };

    let email = profile.email.clone().unwrap_or_else(|| "unknown".to_string());

    if let Err(e) = session
        .store_tokens(&tokens.access_token, tokens.id_token.as_deref())
        .await
    {
        tracing::error!("Failed to store OAuth tokens: {e}");
        return Redirect::to("/login");
    }

    if let Err(e) = session.login(&SessionProfile::from(profile)).await {
        tracing::error!("Failed to create session for '{email}': {e}");
        return Redirect::to("/login");
    }

    tracing::info!("User logged in via Google: {email}");

    let referrer = session.take_referrer().await.ok().flatten();
    Redirect::to(&post_login_target(referrer))
}

/// GET /logout
/// Clears all session state, then returns to the login page.
pub async fn logout(session: AuthSession) -> Redirect {
    let email = session
        .current_user()
        .await
        .ok()
        .flatten()
        .and_then(|p| p.email)
        .unwrap_or_else(|| "unknown".to_string());

    if let Err(e) = session.logout().await {
        tracing::error!("Logout error for '{email}': {e}");
    } else {
        tracing::info!("User logged out: {email}");
    }

    Redirect::to("/login")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_login_target_uses_referrer() {
        assert_eq!(
            post_login_target(Some("/orders".to_string())),
            "/orders"
        );
    }

    #[test]
    fn test_post_login_target_skips_problematic_referrers() {
        assert_eq!(post_login_target(None), DEFAULT_LANDING);
        assert_eq!(post_login_target(Some("/".to_string())), DEFAULT_LANDING);
        assert_eq!(
            post_login_target(Some("/favicon.ico".to_string())),
            DEFAULT_LANDING
        );
    }
}
