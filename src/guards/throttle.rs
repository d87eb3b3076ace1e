//! Throttle guard.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue};

use crate::error::{RouteError, RATE_LIMIT_LIMIT, RATE_LIMIT_REMAINING};
use crate::guards::{Guard, GuardOutcome};
use crate::observability::metrics;
use crate::routing::RequestContext;
use crate::security::{RateLimitDecision, RateLimiter};

/// Admits at most `max_attempts` requests per `window` for each client on one route.
#[derive(Debug, Clone)]
pub struct Throttle {
    route: String,
    max_attempts: u32,
    window: Duration,
    limiter: Arc<RateLimiter>,
}

impl Throttle {
    pub fn new(route: impl Into<String>, max_attempts: u32, window: Duration, limiter: Arc<RateLimiter>) -> Self {
        Self {
            route: route.into(),
            max_attempts,
            window,
            limiter,
        }
    }

    fn key(&self, ctx: &RequestContext) -> String {
        format!("{}|{}", self.route, ctx.client_key())
    }
}

impl Guard for Throttle {
    fn name(&self) -> String {
        let secs = self.window.as_secs();
        if secs % 60 == 0 {
            format!("throttle:{},{}", self.max_attempts, secs / 60)
        } else {
            format!("throttle:{},{}s", self.max_attempts, secs)
        }
    }

    fn check(&self, ctx: &RequestContext) -> GuardOutcome {
        let key = self.key(ctx);
        match self.limiter.check(&key, self.max_attempts, self.window) {
            RateLimitDecision::Allowed { remaining } => {
                let mut headers = HeaderMap::new();
                headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(self.max_attempts));
                headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
                GuardOutcome::AllowWithHeaders(headers)
            }
            RateLimitDecision::Limited { retry_after } => {
                tracing::warn!(client = %key, retry_after = ?retry_after, "Rate limit exceeded");
                metrics::record_rate_limited(&self.route);
                GuardOutcome::Reject(RouteError::TooManyRequests {
                    limit: self.max_attempts,
                    retry_after,
                })
            }
        }
    }
}
