//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Verification link issued:
//!     → signer.rs (append expires + HMAC signature)
//!
//! Incoming request on a protected route:
//!     → signer.rs (recompute and compare signature)
//!     → rate_limit.rs (per-client sliding window)
//!     → headers.rs (hardening headers on the way out)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input
//! - Primitives here are policy-free; guards decide how to apply them

pub mod headers;
pub mod rate_limit;
pub mod signer;

pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use signer::{SignatureError, UrlSigner};
