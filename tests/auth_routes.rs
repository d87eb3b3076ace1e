//! End-to-end behavior of the auth routes through the full middleware stack.

use std::time::Duration;

use axum::http::StatusCode;
use tokio::sync::mpsc;

use auth_routes::config::AuthConfig;
use auth_routes::lifecycle::Shutdown;
use auth_routes::session::Principal;

mod common;
use common::{body_text, location, send, TestApp, APP_URL};

fn path_and_query(url: &url::Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

#[tokio::test]
async fn test_login_and_register_hand_off_to_provider() {
    let app = TestApp::new(AuthConfig::default());

    let response = send(app.router(), "GET", "/login", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("{APP_URL}/usersau/login"));

    let response = send(app.router(), "GET", "/register", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("{APP_URL}/usersau/register"));
}

#[tokio::test]
async fn test_register_absent_when_disabled() {
    let mut config = AuthConfig::default();
    config.registration.enabled = false;
    let app = TestApp::new(config);

    let response = send(app.router(), "GET", "/register", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(app.router(), "GET", "/login", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_guest_routes_send_signed_in_users_home() {
    let app = TestApp::new(AuthConfig::default());
    let cookie = app.sign_in(1, "ada@example.com");

    for path in ["/login", "/register", "/forgot-password", "/reset-password/abc"] {
        let response = send(app.router(), "GET", path, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FOUND, "{path}");
        assert_eq!(location(&response), format!("{APP_URL}/dashboard"), "{path}");
    }
}

#[tokio::test]
async fn test_password_pages_render_for_guests() {
    let app = TestApp::new(AuthConfig::default());

    let response = send(app.router(), "GET", "/forgot-password", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("auth.forgot-password"));

    let response = send(app.router(), "GET", "/reset-password/tok123?email=a%40b.c", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("value=\"tok123\""));
    assert!(body.contains("value=\"a@b.c\""));
}

#[tokio::test]
async fn test_auth_routes_require_session() {
    let app = TestApp::new(AuthConfig::default());

    for path in ["/verify-email", "/confirm-password", "/verify-email/1/abc"] {
        let response = send(app.router(), "GET", path, None).await;
        assert_eq!(response.status(), StatusCode::FOUND, "{path}");
        assert_eq!(location(&response), format!("{APP_URL}/login"), "{path}");
    }

    let cookie = app.sign_in(2, "bob@example.com");
    let response = send(app.router(), "GET", "/verify-email", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("bob@example.com"));

    let response = send(app.router(), "GET", "/confirm-password", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_accepts_get_and_post() {
    let app = TestApp::new(AuthConfig::default());
    let cookie = app.sign_in(3, "cy@example.com");

    for (method, cookie) in [("GET", None), ("POST", None), ("POST", Some(cookie.as_str()))] {
        let response = send(app.router(), method, "/logout", cookie).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), format!("{APP_URL}/usersau/logout"));
    }

    let response = send(app.router(), "DELETE", "/logout", None).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = response.headers()["allow"].to_str().unwrap();
    assert!(allow.contains("GET") && allow.contains("POST"), "{allow}");
}

#[tokio::test]
async fn test_verification_link_confirms_email() {
    let app = TestApp::new(AuthConfig::default());
    let cookie = app.sign_in(4, "dee@example.com");
    let url = app
        .server
        .state()
        .verification_url(&Principal::new(4, "dee@example.com"))
        .unwrap();

    let response = send(app.router(), "GET", &path_and_query(&url), Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("{APP_URL}/dashboard?verified=1"));
    assert_eq!(response.headers()["x-ratelimit-remaining"], "5");
    assert!(app.accounts.is_verified(4));
}

#[tokio::test]
async fn test_verification_rejects_bad_signature_and_foreign_link() {
    let app = TestApp::new(AuthConfig::default());
    let cookie = app.sign_in(5, "eve@example.com");
    let url = app
        .server
        .state()
        .verification_url(&Principal::new(5, "eve@example.com"))
        .unwrap();

    let tampered = path_and_query(&url).replace("/verify-email/5/", "/verify-email/6/");
    let response = send(app.router(), "GET", &tampered, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let unsigned = url.path().to_string();
    let response = send(app.router(), "GET", &unsigned, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.verifier.calls(), 0);

    // Correctly signed, but for a different user than the session.
    let other = app.sign_in(6, "fay@example.com");
    let response = send(app.router(), "GET", &path_and_query(&url), Some(&other)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.verifier.calls(), 1);
    assert!(!app.accounts.is_verified(5));
}

#[tokio::test]
async fn test_verification_throttled_after_six_attempts() {
    let app = TestApp::new(AuthConfig::default());
    let cookie = app.sign_in(7, "gus@example.com");
    let url = app
        .server
        .state()
        .verification_url(&Principal::new(7, "gus@example.com"))
        .unwrap();
    let target = path_and_query(&url);

    for attempt in 1..=6 {
        let response = send(app.router(), "GET", &target, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FOUND, "attempt {attempt}");
        assert_eq!(app.verifier.calls(), attempt);
    }

    let response = send(app.router(), "GET", &target, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
    assert_eq!(response.headers()["x-ratelimit-limit"], "6");
    assert_eq!(app.verifier.calls(), 6);
}

#[tokio::test]
async fn test_bad_signatures_do_not_consume_throttle() {
    let app = TestApp::new(AuthConfig::default());
    let cookie = app.sign_in(8, "hal@example.com");
    let url = app
        .server
        .state()
        .verification_url(&Principal::new(8, "hal@example.com"))
        .unwrap();
    let forged = format!("{}?signature=00", url.path());

    for attempt in 1..=10 {
        let response = send(app.router(), "GET", &forged, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "attempt {attempt}");
    }

    let response = send(app.router(), "GET", &path_and_query(&url), Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "5");
    assert_eq!(app.verifier.calls(), 1);
}

#[tokio::test]
async fn test_links_signed_with_another_key_are_refused() {
    let mut config = AuthConfig::default();
    config.app.key = "a-real-deployment-key-0123456789abcdef".into();
    let app = TestApp::new(config);
    let cookie = app.sign_in(9, "ivy@example.com");

    // Same routes, but signed with the built-in default key.
    let other = TestApp::new(AuthConfig::default());
    let url = other
        .server
        .state()
        .verification_url(&Principal::new(9, "ivy@example.com"))
        .unwrap();

    let response = send(app.router(), "GET", &path_and_query(&url), Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(!app.accounts.is_verified(9));
}

#[tokio::test]
async fn test_unknown_path_and_request_id() {
    let app = TestApp::new(AuthConfig::default());

    let response = send(app.router(), "GET", "/nope", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_reload_applies_registration_flag() {
    let app = TestApp::new(AuthConfig::default());
    let response = send(app.router(), "GET", "/register", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let mut config = AuthConfig::default();
    config.registration.enabled = false;
    app.server.state().reload(config).unwrap();

    let response = send(app.router(), "GET", "/register", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_served_over_loopback() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = TestApp::new(AuthConfig::default());
    let shutdown = Shutdown::new();
    let (_tx, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(app.server.run(listener, config_updates, server_shutdown));

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let response = client.post(format!("http://{addr}/logout")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::FOUND);
    assert_eq!(
        response.headers()[reqwest::header::LOCATION],
        format!("{APP_URL}/usersau/logout").as_str()
    );

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap();
    assert!(result.unwrap().is_ok());
}
