//! In-memory session store.

use std::sync::Arc;

use axum::http::{header, HeaderMap};
use dashmap::DashMap;
use rand::RngCore;

use super::Principal;

/// Thread-safe map of session token → principal.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<DashMap<String, Principal>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `principal` and return its token.
    pub fn issue(&self, principal: Principal) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        tracing::debug!(user_id = principal.id, "Session issued");
        self.inner.insert(token.clone(), principal);
        token
    }

    pub fn resolve(&self, token: &str) -> Option<Principal> {
        self.inner.get(token).map(|entry| entry.value().clone())
    }

    pub fn revoke(&self, token: &str) -> Option<Principal> {
        self.inner.remove(token).map(|(_, p)| p)
    }

    /// Mark every session of `user_id` as having a verified email.
    pub fn mark_email_verified(&self, user_id: u64) {
        for mut entry in self.inner.iter_mut() {
            if entry.id == user_id {
                entry.email_verified = true;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Resolve the principal carried by the request's session cookie, if any.
    pub fn principal_from_headers(&self, headers: &HeaderMap, cookie_name: &str) -> Option<Principal> {
        session_token(headers, cookie_name).and_then(|token| self.resolve(token))
    }
}

/// Extract the session token from the `Cookie` headers.
pub fn session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
