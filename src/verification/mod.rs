//! Email verification.
//!
//! # Data Flow
//! ```text
//! Issuing:  Principal → verification_url() → signed /verify-email/{id}/{hash}?expires=..&signature=..
//! Confirm:  auth → signed → throttle guards pass
//!           → VerifyEmailAction → EmailVerifier::verify → redirect home?verified=1
//! ```
//!
//! # Design Decisions
//! - `{hash}` is the hex SHA-256 of the account email, so a link dies when the email changes
//! - The link must belong to the signed-in user; anything else is 403
//! - Verifying twice is not an error

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::RouteError;
use crate::http::response::redirect;
use crate::routing::{names, ActionHandler, RequestContext, RouteParams, RouteTable};
use crate::security::signer::unix_now;
use crate::security::UrlSigner;
use crate::session::{Principal, SessionStore};

/// Result of a successful verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    AlreadyVerified,
}

/// Collaborator that owns account state.
#[async_trait]
pub trait EmailVerifier: Send + Sync {
    /// Mark the email of account `id` verified for `principal`, if `hash` matches it.
    async fn verify(&self, principal: &Principal, id: &str, hash: &str) -> Result<VerifyOutcome, RouteError>;
}

/// Hex SHA-256 of an email, as carried in verification links.
pub fn email_hash(email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hex::encode(hasher.finalize())
}

/// Signed verification link for `principal`, valid for `ttl`.
pub fn verification_url(
    table: &RouteTable,
    signer: &UrlSigner,
    principal: &Principal,
    ttl: Duration,
) -> Result<Url, RouteError> {
    let params = RouteParams::new()
        .with("id", principal.id.to_string())
        .with("hash", email_hash(&principal.email));
    table.signed_url_for(signer, names::VERIFICATION_VERIFY, &params, Some(ttl))
}

#[derive(Debug, Clone)]
struct Account {
    email: String,
    verified_at: Option<u64>,
}

/// In-process account store.
#[derive(Clone, Default)]
pub struct InMemoryAccounts {
    accounts: Arc<DashMap<u64, Account>>,
    sessions: Option<SessionStore>,
}

impl InMemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also flip `email_verified` on live sessions when an account is verified.
    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn insert(&self, id: u64, email: impl Into<String>) {
        self.accounts.insert(
            id,
            Account {
                email: email.into(),
                verified_at: None,
            },
        );
    }

    pub fn is_verified(&self, id: u64) -> bool {
        self.accounts
            .get(&id)
            .map(|a| a.verified_at.is_some())
            .unwrap_or(false)
    }
}

#[async_trait]
impl EmailVerifier for InMemoryAccounts {
    async fn verify(&self, principal: &Principal, id: &str, hash: &str) -> Result<VerifyOutcome, RouteError> {
        let unauthorized = || RouteError::Forbidden("This action is unauthorized.".to_string());

        if id != principal.id.to_string() {
            return Err(unauthorized());
        }
        let mut account = self.accounts.get_mut(&principal.id).ok_or_else(unauthorized)?;
        if email_hash(&account.email) != hash {
            return Err(unauthorized());
        }

        if account.verified_at.is_some() {
            return Ok(VerifyOutcome::AlreadyVerified);
        }
        account.verified_at = Some(unix_now());
        drop(account);

        if let Some(sessions) = &self.sessions {
            sessions.mark_email_verified(principal.id);
        }
        tracing::info!(user_id = principal.id, "Email verified");
        Ok(VerifyOutcome::Verified)
    }
}

/// Handler bound to the verification confirmation route.
pub struct VerifyEmailAction {
    verifier: Arc<dyn EmailVerifier>,
    redirect_to: String,
}

impl VerifyEmailAction {
    /// `home` is the absolute URL users land on afterwards; `?verified=1` is appended.
    pub fn new(verifier: Arc<dyn EmailVerifier>, home: &Url) -> Self {
        let mut target = home.clone();
        target.query_pairs_mut().append_pair("verified", "1");
        Self {
            verifier,
            redirect_to: target.into(),
        }
    }
}

#[async_trait]
impl ActionHandler for VerifyEmailAction {
    fn name(&self) -> &str {
        "verify-email"
    }

    async fn handle(&self, ctx: &RequestContext) -> Result<Response, RouteError> {
        let principal = ctx.principal.as_ref().ok_or(RouteError::Unauthenticated)?;
        let (Some(id), Some(hash)) = (ctx.param("id"), ctx.param("hash")) else {
            return Err(RouteError::Internal("verification route without id/hash".into()));
        };

        let outcome = self.verifier.verify(principal, id, hash).await?;
        tracing::debug!(user_id = principal.id, outcome = ?outcome, "Verification handled");
        Ok(redirect(&self.redirect_to))
    }
}
