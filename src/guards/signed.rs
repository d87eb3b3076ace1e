//! Signed-link guard.

use std::sync::Arc;

use crate::error::RouteError;
use crate::guards::{Guard, GuardOutcome};
use crate::routing::RequestContext;
use crate::security::UrlSigner;

/// Rejects requests whose absolute URL does not carry a valid signature.
#[derive(Debug, Clone)]
pub struct ValidateSignature {
    signer: Arc<UrlSigner>,
}

impl ValidateSignature {
    pub fn new(signer: Arc<UrlSigner>) -> Self {
        Self { signer }
    }
}

impl Guard for ValidateSignature {
    fn name(&self) -> String {
        "signed".to_string()
    }

    fn check(&self, ctx: &RequestContext) -> GuardOutcome {
        match self.signer.verify(&ctx.url) {
            Ok(()) => GuardOutcome::Allow,
            Err(reason) => {
                tracing::warn!(path = %ctx.path(), reason = %reason, "Signed link rejected");
                GuardOutcome::Reject(RouteError::InvalidSignature(reason))
            }
        }
    }
}
