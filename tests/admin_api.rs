//! Admin API authentication and payloads.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use auth_routes::admin::setup_admin_router;
use auth_routes::config::AuthConfig;

mod common;
use common::{body_text, TestApp};

fn admin_config() -> AuthConfig {
    let mut config = AuthConfig::default();
    config.admin.enabled = true;
    config.admin.api_key = "test-admin-key".into();
    config
}

async fn get(app: &TestApp, path: &str, key: Option<&str>) -> axum::http::Response<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(key) = key {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {key}"));
    }
    setup_admin_router(app.server.state().clone())
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_admin_requires_bearer_key() {
    let app = TestApp::new(admin_config());

    assert_eq!(get(&app, "/admin/status", None).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(get(&app, "/admin/status", Some("wrong")).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(get(&app, "/admin/status", Some("test-admin-key")).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_status_reports_sessions_and_routes() {
    let app = TestApp::new(admin_config());
    app.sign_in(1, "ada@example.com");

    let response = get(&app, "/admin/status", Some("test-admin-key")).await;
    let status: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(status["status"], "operational");
    assert_eq!(status["registration_enabled"], true);
    assert_eq!(status["active_sessions"], 1);
    assert_eq!(status["routes"], 8);
}

#[tokio::test]
async fn test_routes_lists_guards() {
    let app = TestApp::new(admin_config());

    let response = get(&app, "/admin/routes", Some("test-admin-key")).await;
    let routes: Value = serde_json::from_str(&body_text(response).await).unwrap();
    let verify = routes
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "verification.verify")
        .unwrap();
    assert_eq!(verify["guards"], serde_json::json!(["auth", "signed", "throttle:6,1"]));
}
