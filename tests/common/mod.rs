//! Shared utilities for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use tower::ServiceExt;

use auth_routes::config::AuthConfig;
use auth_routes::error::RouteError;
use auth_routes::http::{HttpServer, Services};
use auth_routes::session::{Principal, SessionStore};
use auth_routes::verification::{EmailVerifier, InMemoryAccounts, VerifyOutcome};

pub const APP_URL: &str = "http://localhost:8080";

/// Verifier that counts how often it is reached.
#[derive(Clone)]
pub struct CountingVerifier {
    pub inner: InMemoryAccounts,
    pub calls: Arc<AtomicUsize>,
}

impl CountingVerifier {
    #[allow(dead_code)]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailVerifier for CountingVerifier {
    async fn verify(&self, principal: &Principal, id: &str, hash: &str) -> Result<VerifyOutcome, RouteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(principal, id, hash).await
    }
}

/// A server plus handles on its in-process stores.
pub struct TestApp {
    pub server: HttpServer,
    pub sessions: SessionStore,
    pub accounts: InMemoryAccounts,
    pub verifier: CountingVerifier,
}

impl TestApp {
    pub fn new(config: AuthConfig) -> Self {
        let (mut services, accounts) = Services::in_memory();
        let verifier = CountingVerifier {
            inner: accounts.clone(),
            calls: Arc::new(AtomicUsize::new(0)),
        };
        services.verifier = Arc::new(verifier.clone());
        let sessions = services.sessions.clone();
        let server = HttpServer::with_services(config, services).unwrap();
        Self {
            server,
            sessions,
            accounts,
            verifier,
        }
    }

    /// Register account `id` and return a session cookie for it.
    #[allow(dead_code)]
    pub fn sign_in(&self, id: u64, email: &str) -> String {
        self.accounts.insert(id, email);
        let token = self.sessions.issue(Principal::new(id, email));
        format!("auth_session={token}")
    }

    pub fn router(&self) -> Router {
        self.server.router()
    }
}

/// Drive one request through `router`.
pub async fn send(router: Router, method: &str, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    router.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
}

#[allow(dead_code)]
pub fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

#[allow(dead_code)]
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
