use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use subtle::ConstantTimeEq;

use crate::http::server::AppState;

/// Require `Authorization: Bearer <admin.api_key>` of the active configuration.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let snapshot = state.snapshot();

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if token_matches(token, &snapshot.config.admin.api_key) => Ok(next.run(request).await),
        _ => {
            tracing::warn!(path = %request.uri().path(), "Admin request rejected");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Constant-time for equal-length inputs; only the length can leak.
fn token_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_matches() {
        assert!(token_matches("s3cret-key", "s3cret-key"));
        assert!(!token_matches("s3cret-kez", "s3cret-key"));
        assert!(!token_matches("s3cret", "s3cret-key"));
        assert!(!token_matches("", "s3cret-key"));
    }
}
