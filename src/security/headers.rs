//! Security response headers.
//!
//! # Design Decisions
//! - Applied only when absent so a handler can still override them
//! - Auth pages must never be framed or cached by shared caches

use axum::http::{header, HeaderName, HeaderValue};

/// Headers added to every response when `security.enable_headers` is set.
pub fn security_headers() -> Vec<(HeaderName, HeaderValue)> {
    vec![
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::REFERRER_POLICY, HeaderValue::from_static("same-origin")),
        (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
    ]
}
