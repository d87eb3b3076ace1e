//! Request handling.
//!
//! # Responsibilities
//! - Name the request ID header shared by the middleware stack
//! - Turn an incoming axum request into a [`RequestContext`]
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The request URL is rebuilt on the configured public origin, never from
//!   the Host header, so signed links verify behind proxies

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderName, Request};
use url::Url;

use crate::routing::RequestContext;
use crate::session::SessionStore;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Build the routing context for `request`, resolving its session.
pub fn context_from_request(
    request: &Request<Body>,
    base: &Url,
    sessions: &SessionStore,
    cookie_name: &str,
) -> RequestContext {
    let principal = sessions.principal_from_headers(request.headers(), cookie_name);
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    RequestContext::new(
        request.method().clone(),
        base,
        request.uri(),
        request.headers().clone(),
    )
    .with_principal(principal)
    .with_client_ip(client_ip)
}
