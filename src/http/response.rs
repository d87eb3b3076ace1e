//! Response helpers.
//!
//! # Responsibilities
//! - Build redirects the way every route issues them (302 + Location)
//! - Merge guard-supplied headers into handler responses

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::RouteError;

/// `302 Found` to `location`.
pub fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => RouteError::Internal(format!("unrepresentable redirect target '{location}'")).into_response(),
    }
}

/// Add `extra` to `response` without overwriting headers the handler set.
pub fn merge_headers(mut response: Response, extra: HeaderMap) -> Response {
    let headers = response.headers_mut();
    for (name, value) in extra.iter() {
        if !headers.contains_key(name) {
            headers.insert(name.clone(), value.clone());
        }
    }
    response
}
