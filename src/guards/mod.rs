//! Route guards.
//!
//! # Data Flow
//! ```text
//! Matched route
//!     → guards in declaration order
//!         session.rs  (guest / auth)
//!         signed.rs   (signed link)
//!         throttle.rs (per-client rate limit)
//!     → first non-allow outcome ends the request
//!     → otherwise the route handler runs
//! ```
//!
//! # Design Decisions
//! - Guards are synchronous and side-effect free except for the throttle counter
//! - A guard never renders a page; it allows, redirects or rejects

pub mod session;
pub mod signed;
pub mod throttle;

use std::fmt;

use axum::http::HeaderMap;

use crate::error::RouteError;
use crate::routing::RequestContext;

pub use session::{Authenticate, RedirectIfAuthenticated};
pub use signed::ValidateSignature;
pub use throttle::Throttle;

/// Decision of a single guard.
#[derive(Debug)]
pub enum GuardOutcome {
    Allow,
    /// Allow, and add these headers to the eventual response.
    AllowWithHeaders(HeaderMap),
    /// Stop and send the client to this absolute URL.
    Redirect(String),
    Reject(RouteError),
}

/// Middleware that inspects a request and its session before the handler runs.
pub trait Guard: Send + Sync + fmt::Debug {
    /// Label used in route listings, logs and metrics.
    fn name(&self) -> String;

    fn check(&self, ctx: &RequestContext) -> GuardOutcome;
}
