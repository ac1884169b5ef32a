use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use trendis::config::Config;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let state = trendis::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    trendis::api::router(state).await
}

/// Extracts the session cookie from a response, if one was set.
fn session_cookie(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).to_string())
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Logs in with the given credentials and returns (session cookie, redirect
/// target). Panics if no session cookie comes back.
async fn login(app: &Router, username: &str, password: &str) -> (String, String) {
    let response = app
        .clone()
        .oneshot(post_form(
            "/login",
            None,
            &format!("username={username}&password={password}"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&response).expect("login should establish a session");
    let target = location(&response).to_string();
    (cookie, target)
}

#[tokio::test]
async fn test_public_paths_reachable_without_session() {
    let app = spawn_app().await;

    let response = app.clone().oneshot(get("/login", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/print/12345", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/unauthorized", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_asset_paths_bypass_the_gate() {
    let app = spawn_app().await;

    // No asset routes exist, but asset-like paths must reach the 404
    // fallback instead of bouncing to login.
    for uri in ["/assets/logo.png", "/styles/site.css", "/app.js"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_protected_paths_redirect_anonymous_visitors() {
    let app = spawn_app().await;

    for uri in ["/dashboard", "/orders", "/trends/blog", "/api/users", "/no-such-page"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/login", "{uri}");
    }
}

#[tokio::test]
async fn test_root_redirects_by_authentication_state() {
    let app = spawn_app().await;

    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let (cookie, _) = login(&app, "admin", "admin").await;
    let response = app
        .clone()
        .oneshot(get("/", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_bad_credentials_redirect_with_error() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_form("/login", None, "username=admin&password=wrong"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?error=1");

    let response = app
        .clone()
        .oneshot(post_form("/login", None, "username=ghost&password=whatever"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?error=1");
}

#[tokio::test]
async fn test_login_without_referrer_lands_on_dashboard() {
    let app = spawn_app().await;

    let (cookie, target) = login(&app, "admin", "admin").await;
    assert_eq!(target, "/dashboard");

    let response = app
        .clone()
        .oneshot(get("/dashboard", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_restores_requested_path() {
    let app = spawn_app().await;

    // Visiting a protected page remembers it in the (anonymous) session.
    let response = app.clone().oneshot(get("/orders", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let cookie = session_cookie(&response).expect("gate should establish a session");

    // Logging in with that session resumes the original request.
    let response = app
        .clone()
        .oneshot(post_form(
            "/login",
            Some(&cookie),
            "username=admin&password=admin",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/orders");

    let cookie = session_cookie(&response).unwrap_or(cookie);
    let response = app
        .clone()
        .oneshot(get("/orders", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The remembered path is consumed: a second login cycle starts fresh.
    let response = app
        .clone()
        .oneshot(get("/", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_logout_invalidates_the_session() {
    let app = spawn_app().await;

    let (cookie, _) = login(&app, "admin", "admin").await;

    let response = app
        .clone()
        .oneshot(get("/logout", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = app
        .clone()
        .oneshot(get("/dashboard", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_oauth_callback_without_code_redirects_to_login() {
    let app = spawn_app().await;

    let response = app.clone().oneshot(get("/auth", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    // The failed callback must not leave an authenticated session behind.
    if let Some(cookie) = session_cookie(&response) {
        let response = app
            .clone()
            .oneshot(get("/dashboard", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}

#[tokio::test]
async fn test_admin_user_management_flow() {
    let app = spawn_app().await;
    let (cookie, _) = login(&app, "admin", "admin").await;

    // Create.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            Some(&cookie),
            r#"{"username": "bob", "password": "secret123"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let result: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(result["success"], true);

    // Duplicate username is a business failure, not an HTTP error.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            Some(&cookie),
            r#"{"username": "bob", "password": "secret123"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let result: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(result["success"], false);
    assert!(result["message"].as_str().unwrap().contains("already exists"));

    // Validation failures carry the field constraint in the message.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            Some(&cookie),
            r#"{"username": "ab", "password": "secret123"}"#,
        ))
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let result: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(result["success"], false);
    assert!(result["message"].as_str().unwrap().contains("3 characters"));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            Some(&cookie),
            r#"{"username": "carol", "password": "short"}"#,
        ))
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let result: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(result["success"], false);
    assert!(result["message"].as_str().unwrap().contains("6 characters"));

    // List includes the new user and never exposes password hashes.
    let response = app
        .clone()
        .oneshot(get("/api/users", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let listing: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(listing["success"], true);
    let usernames: Vec<&str> = listing["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|u| u["username"].as_str())
        .collect();
    assert!(usernames.contains(&"admin"));
    assert!(usernames.contains(&"bob"));
    assert!(!body_contains_hash(&body));

    // The admin account cannot be deleted.
    let response = app
        .clone()
        .oneshot(json_request("DELETE", "/api/users/admin", Some(&cookie), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let result: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(result["success"], false);

    // Other users can.
    let response = app
        .clone()
        .oneshot(json_request("DELETE", "/api/users/bob", Some(&cookie), ""))
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let result: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(result["success"], true);
}

fn body_contains_hash(body: &[u8]) -> bool {
    let text = String::from_utf8_lossy(body);
    text.contains("password_hash") || text.contains("$argon2")
}

#[tokio::test]
async fn test_user_management_requires_admin() {
    let app = spawn_app().await;
    let (admin_cookie, _) = login(&app, "admin", "admin").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            Some(&admin_cookie),
            r#"{"username": "dave", "password": "secret123"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (cookie, _) = login(&app, "dave", "secret123").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            Some(&cookie),
            r#"{"username": "eve", "password": "secret123"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(get("/api/users", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_trend_search_validation() {
    let app = spawn_app().await;
    let (cookie, _) = login(&app, "admin", "admin").await;

    // Blank query is rejected before any upstream call is made.
    let response = app
        .clone()
        .oneshot(get("/api/trends/blog?query=", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get(
            "/api/trends/local?query=coffee&display=50",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/trends/datalab",
            Some(&cookie),
            r#"{"startDate": "2026-01-01", "endDate": "2026-02-01", "timeUnit": "week", "keywordGroups": []}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
