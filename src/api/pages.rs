//! Server-rendered pages behind the request gate.

use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use super::AppState;
use crate::services::AuthSession;

/// Minimal shared page shell. The dashboard pages are deliberately plain;
/// the interesting data lives behind the JSON API.
fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>{title}</title></head>
<body>
<nav>
  <a href="/dashboard">Dashboard</a>
  <a href="/trends/blog">Blog Trends</a>
  <a href="/trends/local">Local Trends</a>
  <a href="/trends/datalab">Datalab</a>
  <a href="/orders">Orders</a>
  <a href="/settings">Settings</a>
  <a href="/logout">Logout</a>
</nav>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>"#
    ))
}

/// GET /dashboard
pub async fn dashboard(session: AuthSession) -> Html<String> {
    let name = session
        .current_user()
        .await
        .ok()
        .flatten()
        .and_then(|p| p.name)
        .unwrap_or_else(|| "there".to_string());

    page("Dashboard", &format!("<p>Welcome back, {name}.</p>"))
}

/// GET /settings
pub async fn settings(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Html<String> {
    let config = state.config().read().await.clone();

    let user_admin_section = if session.is_current_user_admin().await {
        "<h2>User Management</h2>\
         <p>Manage accounts through the <code>/api/users</code> endpoints.</p>"
    } else {
        ""
    };

    page(
        "Settings",
        &format!(
            "<p>Google login: {}</p><p>Session timeout: {} minutes</p>{}",
            if config.google_login_enabled() {
                "enabled"
            } else {
                "disabled"
            },
            config.server.session_timeout_minutes,
            user_admin_section,
        ),
    )
}

/// GET /trends/{blog,local,datalab} and the remaining dashboard sections.
/// Each simply renders the shell; data loads through the API.
pub async fn section(uri: Uri) -> Response {
    let title = match uri.path() {
        "/trends/blog" => "Blog Trends",
        "/trends/local" => "Local Trends",
        "/trends/datalab" => "Datalab Trends",
        "/shipping" => "Shipping",
        "/production" => "Production",
        "/orders" => "Orders",
        "/pallets" => "Pallets",
        "/packing" => "Packing",
        _ => return not_found().await.into_response(),
    };
    page(title, "<p>Loading…</p>").into_response()
}

/// GET /print/{data}
/// Public: printable labels are opened from machines without a session.
pub async fn print(Path(data): Path<String>) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Print</title></head>
<body onload="window.print()">
<pre>{data}</pre>
</body>
</html>"#
    ))
}

/// GET /unauthorized
pub async fn unauthorized() -> Response {
    (
        StatusCode::FORBIDDEN,
        page(
            "Unauthorized",
            r#"<p>You do not have access to this page.</p><p><a href="/login">Back to login</a></p>"#,
        ),
    )
        .into_response()
}

/// Fallback for unknown paths. Runs behind the gate, so anonymous visitors
/// are redirected to login before ever seeing a 404.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, page("Not Found", "<p>No such page.</p>")).into_response()
}
