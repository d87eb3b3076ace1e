//! Session-state gates.

use crate::error::RouteError;
use crate::guards::{Guard, GuardOutcome};
use crate::routing::RequestContext;

/// Only lets unauthenticated sessions through; others are sent home.
#[derive(Debug, Clone)]
pub struct RedirectIfAuthenticated {
    home: String,
}

impl RedirectIfAuthenticated {
    pub fn new(home: impl Into<String>) -> Self {
        Self { home: home.into() }
    }
}

impl Guard for RedirectIfAuthenticated {
    fn name(&self) -> String {
        "guest".to_string()
    }

    fn check(&self, ctx: &RequestContext) -> GuardOutcome {
        if ctx.is_authenticated() {
            GuardOutcome::Redirect(self.home.clone())
        } else {
            GuardOutcome::Allow
        }
    }
}

/// Only lets authenticated sessions through.
///
/// Browsers are sent to the login route; JSON clients get 401.
#[derive(Debug, Clone)]
pub struct Authenticate {
    login: String,
}

impl Authenticate {
    pub fn new(login: impl Into<String>) -> Self {
        Self { login: login.into() }
    }
}

impl Guard for Authenticate {
    fn name(&self) -> String {
        "auth".to_string()
    }

    fn check(&self, ctx: &RequestContext) -> GuardOutcome {
        match (&ctx.principal, ctx.wants_json()) {
            (Some(_), _) => GuardOutcome::Allow,
            (None, true) => GuardOutcome::Reject(RouteError::Unauthenticated),
            (None, false) => GuardOutcome::Redirect(self.login.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Principal;
    use axum::http::{header, HeaderMap, HeaderValue, Method};
    use url::Url;

    fn context(principal: Option<Principal>, json: bool) -> RequestContext {
        let mut headers = HeaderMap::new();
        if json {
            headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        }
        let base = Url::parse("https://app.test").unwrap();
        RequestContext::new(Method::GET, &base, &"/x".parse().unwrap(), headers).with_principal(principal)
    }

    #[test]
    fn test_guest_gate() {
        let guard = RedirectIfAuthenticated::new("https://app.test/dashboard");
        assert!(matches!(guard.check(&context(None, false)), GuardOutcome::Allow));

        match guard.check(&context(Some(Principal::new(1, "a@b.c")), false)) {
            GuardOutcome::Redirect(to) => assert_eq!(to, "https://app.test/dashboard"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_auth_gate() {
        let guard = Authenticate::new("https://app.test/login");
        assert!(matches!(
            guard.check(&context(Some(Principal::new(1, "a@b.c")), false)),
            GuardOutcome::Allow
        ));
        assert!(matches!(
            guard.check(&context(None, false)),
            GuardOutcome::Redirect(to) if to == "https://app.test/login"
        ));
        assert!(matches!(
            guard.check(&context(None, true)),
            GuardOutcome::Reject(RouteError::Unauthenticated)
        ));
    }
}
