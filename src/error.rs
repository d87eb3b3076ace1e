//! Request-level error type and its HTTP mapping.

use std::time::Duration;

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::security::SignatureError;

/// Terminal failure of a request. Rendered by [`RouteError::into_response_for`].
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Not Found")]
    NotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed { allowed: Vec<Method> },

    #[error("Unauthenticated.")]
    Unauthenticated,

    #[error("Invalid signature.")]
    InvalidSignature(#[source] SignatureError),

    #[error("Too Many Attempts.")]
    TooManyRequests { limit: u32, retry_after: Duration },

    #[error("{0}")]
    Forbidden(String),

    #[error("Route [{0}] not defined.")]
    UnknownRoute(String),

    #[error("Missing required parameter [{parameter}] for route [{route}].")]
    MissingParameter { route: String, parameter: String },

    #[error("Internal Server Error")]
    Internal(String),
}

impl RouteError {
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::NotFound => StatusCode::NOT_FOUND,
            RouteError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            RouteError::Unauthenticated => StatusCode::UNAUTHORIZED,
            RouteError::InvalidSignature(_) | RouteError::Forbidden(_) => StatusCode::FORBIDDEN,
            RouteError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            RouteError::UnknownRoute(_)
            | RouteError::MissingParameter { .. }
            | RouteError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render as JSON (`{"message": ...}`) for JSON clients, plain text otherwise.
    pub fn into_response_for(self, wants_json: bool) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, detail = ?self, "Request failed");
        }

        // Server errors never leak their detail to the client.
        let message = if status.is_server_error() {
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        let mut response = if wants_json {
            (status, Json(serde_json::json!({ "message": message }))).into_response()
        } else {
            (status, message).into_response()
        };

        let headers = response.headers_mut();
        match &self {
            RouteError::MethodNotAllowed { allowed } => {
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    headers.insert(header::ALLOW, value);
                }
            }
            RouteError::TooManyRequests { limit, retry_after } => {
                // Round up so clients never retry inside the window.
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));
                headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(*limit));
                headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(0u32));
            }
            _ => {}
        }
        response
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        self.into_response_for(false)
    }
}

pub const RATE_LIMIT_LIMIT: header::HeaderName = header::HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: header::HeaderName =
    header::HeaderName::from_static("x-ratelimit-remaining");
