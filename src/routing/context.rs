//! Per-request view handed to guards and handlers.

use std::net::IpAddr;

use axum::http::{header, HeaderMap, Method, Uri};
use url::Url;

use crate::routing::matcher::RouteParams;
use crate::session::Principal;

/// Everything a guard or handler may inspect about a request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Absolute URL of the request, on the application's public origin.
    pub url: Url,
    pub headers: HeaderMap,
    /// Parameters captured by the matched route.
    pub params: RouteParams,
    pub principal: Option<Principal>,
    pub client_ip: Option<IpAddr>,
}

impl RequestContext {
    /// Build a context for `uri` as seen on `base`'s origin.
    pub fn new(method: Method, base: &Url, uri: &Uri, headers: HeaderMap) -> Self {
        let mut url = base.clone();
        url.set_path(uri.path());
        url.set_query(uri.query());
        url.set_fragment(None);

        Self {
            method,
            url,
            headers,
            params: RouteParams::new(),
            principal: None,
            client_ip: None,
        }
    }

    pub fn with_principal(mut self, principal: Option<Principal>) -> Self {
        self.principal = principal;
        self
    }

    pub fn with_client_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.client_ip = ip;
        self
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// First value of query parameter `name`.
    pub fn query(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.into_owned())
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// Whether the client asked for a JSON response.
    pub fn wants_json(&self) -> bool {
        self.headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(|accept| accept.contains("json"))
            .unwrap_or(false)
    }

    /// Identity used for per-client limits: the user when known, else the peer address.
    pub fn client_key(&self) -> String {
        match (&self.principal, self.client_ip) {
            (Some(principal), _) => format!("user:{}", principal.id),
            (None, Some(ip)) => format!("ip:{ip}"),
            (None, None) => "ip:unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn context(uri: &str) -> RequestContext {
        let base = Url::parse("https://app.example.com").unwrap();
        RequestContext::new(Method::GET, &base, &uri.parse().unwrap(), HeaderMap::new())
    }

    #[test]
    fn test_url_uses_public_origin() {
        let ctx = context("/reset-password/abc?email=a%40b.c");
        assert_eq!(ctx.url.as_str(), "https://app.example.com/reset-password/abc?email=a%40b.c");
        assert_eq!(ctx.query("email").as_deref(), Some("a@b.c"));
        assert_eq!(ctx.query("missing"), None);
    }

    #[test]
    fn test_client_key() {
        let ctx = context("/").with_client_ip(Some("10.0.0.1".parse().unwrap()));
        assert_eq!(ctx.client_key(), "ip:10.0.0.1");

        let ctx = ctx.with_principal(Some(Principal::new(9, "x@example.com")));
        assert_eq!(ctx.client_key(), "user:9");

        assert_eq!(context("/").client_key(), "ip:unknown");
    }

    #[test]
    fn test_wants_json() {
        let mut ctx = context("/");
        assert!(!ctx.wants_json());
        ctx.headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(ctx.wants_json());
    }
}
