//! Session state.
//!
//! # Data Flow
//! ```text
//! Cookie header
//!     → store.rs (token → Principal lookup)
//!     → Option<Principal> handed to guards and handlers
//! ```
//!
//! # Design Decisions
//! - Sessions are established by the identity provider's callback, not here
//! - The store is in-process; a missing or unknown token means "guest"

pub mod store;

use serde::{Deserialize, Serialize};

pub use store::{session_token, SessionStore};

/// The authenticated user attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
}

impl Principal {
    pub fn new(id: u64, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            email_verified: false,
        }
    }
}
