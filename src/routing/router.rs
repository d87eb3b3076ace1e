//! Route table: registration, lookup and URL generation.
//!
//! # Responsibilities
//! - Store routes in registration order
//! - Enforce globally unique route names (local and external)
//! - Look up the route for a method + path
//! - Resolve route names to absolute URLs, optionally signed
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan over routes (the table is small)
//! - First match wins
//! - Explicit NotFound / MethodNotAllowed rather than silent default

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::Method;
use axum::response::Response;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::error::RouteError;
use crate::guards::Guard;
use crate::routing::context::RequestContext;
use crate::routing::matcher::{MethodSet, PathPattern, PatternError, RouteParams};
use crate::security::signer::{unix_now, UrlSigner};

/// Error type for route table construction.
#[derive(Debug, Error)]
pub enum RouteTableError {
    #[error("route name '{0}' is already registered")]
    DuplicateName(String),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("invalid application URL: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("invalid signing key")]
    SigningKey,
    #[error("cannot resolve '{name}': {source}")]
    Resolve {
        name: String,
        #[source]
        source: Box<RouteError>,
    },
}

/// A handler that performs work and produces its own response.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Label used in route listings.
    fn name(&self) -> &str;

    async fn handle(&self, ctx: &RequestContext) -> Result<Response, RouteError>;
}

/// What a route does once its guards allow the request.
#[derive(Clone)]
pub enum RouteHandler {
    /// Redirect to the URL of another named route, resolved per request.
    Redirect { target: String },
    /// Render a view component.
    View { component: String },
    Action(Arc<dyn ActionHandler>),
}

impl RouteHandler {
    pub fn redirect(target: impl Into<String>) -> Self {
        RouteHandler::Redirect { target: target.into() }
    }

    pub fn view(component: impl Into<String>) -> Self {
        RouteHandler::View {
            component: component.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RouteHandler::Redirect { .. } => "redirect",
            RouteHandler::View { .. } => "view",
            RouteHandler::Action(_) => "action",
        }
    }

    fn describe(&self) -> String {
        match self {
            RouteHandler::Redirect { target } => target.clone(),
            RouteHandler::View { component } => component.clone(),
            RouteHandler::Action(action) => action.name().to_string(),
        }
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.describe())
    }
}

/// A single route descriptor.
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    pub pattern: PathPattern,
    pub methods: MethodSet,
    pub handler: RouteHandler,
    pub guards: Vec<Arc<dyn Guard>>,
}

impl Route {
    pub fn new(
        methods: MethodSet,
        path: &str,
        name: impl Into<String>,
        handler: RouteHandler,
    ) -> Result<Self, RouteTableError> {
        Ok(Self {
            name: name.into(),
            pattern: PathPattern::parse(path)?,
            methods,
            handler,
            guards: Vec::new(),
        })
    }

    pub fn get(path: &str, name: impl Into<String>, handler: RouteHandler) -> Result<Self, RouteTableError> {
        Self::new(MethodSet::get(), path, name, handler)
    }

    /// Append a guard; guards run in the order they are added.
    pub fn guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn guards(mut self, guards: impl IntoIterator<Item = Arc<dyn Guard>>) -> Self {
        self.guards.extend(guards);
        self
    }
}

/// Outcome of a route lookup.
#[derive(Debug)]
pub enum RouteMatch<'a> {
    Matched { route: &'a Route, params: RouteParams },
    MethodNotAllowed { allowed: Vec<Method> },
    NotFound,
}

/// Serializable listing entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RouteSummary {
    pub name: String,
    pub methods: Vec<String>,
    pub path: String,
    pub kind: String,
    pub target: String,
    pub guards: Vec<String>,
}

/// Ordered, immutable set of named routes.
#[derive(Debug, Clone)]
pub struct RouteTable {
    base: Url,
    routes: Vec<Route>,
    external: BTreeMap<String, String>,
}

impl RouteTable {
    /// Create an empty table whose URLs are generated on `base`'s origin.
    pub fn new(base: Url) -> Self {
        Self {
            base,
            routes: Vec::new(),
            external: BTreeMap::new(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn name_taken(&self, name: &str) -> bool {
        self.external.contains_key(name) || self.routes.iter().any(|r| r.name == name)
    }

    /// Register a route served elsewhere. `target` is an absolute URL or a path on `base`.
    pub fn add_external(&mut self, name: impl Into<String>, target: impl Into<String>) -> Result<(), RouteTableError> {
        let name = name.into();
        if self.name_taken(&name) {
            return Err(RouteTableError::DuplicateName(name));
        }
        let target = target.into();
        self.base.join(&target)?;
        self.external.insert(name, target);
        Ok(())
    }

    pub fn add(&mut self, route: Route) -> Result<(), RouteTableError> {
        if self.name_taken(&route.name) {
            return Err(RouteTableError::DuplicateName(route.name));
        }
        tracing::debug!(
            name = %route.name,
            path = %route.pattern,
            kind = route.handler.kind(),
            guards = route.guards.len(),
            "Route registered"
        );
        self.routes.push(route);
        Ok(())
    }

    pub fn route(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == name)
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.name_taken(name)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn match_request(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        let mut allowed: Vec<Method> = Vec::new();

        for route in &self.routes {
            let Some(params) = route.pattern.matches(path) else {
                continue;
            };
            if route.methods.matches(method) {
                return RouteMatch::Matched { route, params };
            }
            for m in route.methods.allowed() {
                if !allowed.contains(&m) {
                    allowed.push(m);
                }
            }
        }

        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodNotAllowed { allowed }
        }
    }

    /// Absolute URL for a named route.
    pub fn url_for(&self, name: &str, params: &RouteParams) -> Result<Url, RouteError> {
        if let Some(target) = self.external.get(name) {
            return self
                .base
                .join(target)
                .map_err(|e| RouteError::Internal(format!("route [{name}]: {e}")));
        }

        let route = self
            .route(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?;
        let path = route
            .pattern
            .render(params)
            .map_err(|parameter| RouteError::MissingParameter {
                route: name.to_string(),
                parameter,
            })?;

        let mut url = self.base.clone();
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);

        // Parameters not consumed by the path travel as query string.
        let extra: Vec<(&str, &str)> = params
            .iter()
            .filter(|(n, _)| !route.pattern.params().any(|p| p == *n))
            .collect();
        if !extra.is_empty() {
            url.query_pairs_mut().extend_pairs(extra);
        }
        Ok(url)
    }

    /// Absolute signed URL for a named route, expiring after `ttl` when given.
    pub fn signed_url_for(
        &self,
        signer: &UrlSigner,
        name: &str,
        params: &RouteParams,
        ttl: Option<Duration>,
    ) -> Result<Url, RouteError> {
        let url = self.url_for(name, params)?;
        let expires = ttl.map(|ttl| unix_now().saturating_add(ttl.as_secs()));
        Ok(signer.sign(&url, expires))
    }

    /// Listing of the table in registration order, externals last.
    pub fn describe(&self) -> Vec<RouteSummary> {
        let local = self.routes.iter().map(|route| RouteSummary {
            name: route.name.clone(),
            methods: route.methods.iter().map(|m| m.to_string()).collect(),
            path: route.pattern.to_string(),
            kind: route.handler.kind().to_string(),
            target: route.handler.describe(),
            guards: route.guards.iter().map(|g| g.name()).collect(),
        });
        let external = self.external.iter().map(|(name, target)| RouteSummary {
            name: name.clone(),
            methods: Vec::new(),
            path: target.clone(),
            kind: "external".to_string(),
            target: target.clone(),
            guards: Vec::new(),
        });
        local.chain(external).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        let mut table = RouteTable::new(Url::parse("https://app.test").unwrap());
        table.add_external("provider.login", "/provider/login").unwrap();
        table.add_external("provider.home", "https://id.example.com/").unwrap();
        table
            .add(Route::get("/login", "login", RouteHandler::redirect("provider.login")).unwrap())
            .unwrap();
        table
            .add(Route::get("/reset-password/{token}", "password.reset", RouteHandler::view("auth.reset-password")).unwrap())
            .unwrap();
        table
            .add(
                Route::new(
                    MethodSet::new([Method::GET, Method::POST]),
                    "/logout",
                    "logout",
                    RouteHandler::redirect("provider.home"),
                )
                .unwrap(),
            )
            .unwrap();
        table
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut table = table();
        let dup = Route::get("/other", "login", RouteHandler::redirect("provider.login")).unwrap();
        assert!(matches!(table.add(dup), Err(RouteTableError::DuplicateName(n)) if n == "login"));
        assert!(matches!(
            table.add_external("logout", "/x"),
            Err(RouteTableError::DuplicateName(_))
        ));
        assert!(matches!(
            table.add(Route::get("/x", "provider.login", RouteHandler::view("v")).unwrap()),
            Err(RouteTableError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_match_request() {
        let table = table();
        match table.match_request(&Method::GET, "/reset-password/tok") {
            RouteMatch::Matched { route, params } => {
                assert_eq!(route.name, "password.reset");
                assert_eq!(params.get("token"), Some("tok"));
            }
            other => panic!("unexpected match: {other:?}"),
        }
        assert!(matches!(
            table.match_request(&Method::POST, "/logout"),
            RouteMatch::Matched { route, .. } if route.name == "logout"
        ));
        assert!(matches!(
            table.match_request(&Method::POST, "/login"),
            RouteMatch::MethodNotAllowed { allowed } if allowed == vec![Method::GET, Method::HEAD]
        ));
        assert!(matches!(table.match_request(&Method::GET, "/register"), RouteMatch::NotFound));
    }

    #[test]
    fn test_url_for() {
        let table = table();
        assert_eq!(table.url_for("login", &RouteParams::new()).unwrap().as_str(), "https://app.test/login");
        assert_eq!(
            table.url_for("provider.login", &RouteParams::new()).unwrap().as_str(),
            "https://app.test/provider/login"
        );
        assert_eq!(
            table.url_for("provider.home", &RouteParams::new()).unwrap().as_str(),
            "https://id.example.com/"
        );
        assert_eq!(
            table
                .url_for("password.reset", &RouteParams::new().with("token", "t1").with("email", "a@b.c"))
                .unwrap()
                .as_str(),
            "https://app.test/reset-password/t1?email=a%40b.c"
        );
    }

    #[test]
    fn test_url_for_errors() {
        let table = table();
        assert!(matches!(
            table.url_for("nope", &RouteParams::new()),
            Err(RouteError::UnknownRoute(n)) if n == "nope"
        ));
        assert!(matches!(
            table.url_for("password.reset", &RouteParams::new()),
            Err(RouteError::MissingParameter { parameter, .. }) if parameter == "token"
        ));
    }

    #[test]
    fn test_signed_url_for_verifies() {
        let table = table();
        let signer = UrlSigner::new(b"0123456789abcdef0123456789abcdef").unwrap();
        let url = table
            .signed_url_for(&signer, "password.reset", &RouteParams::new().with("token", "t"), Some(Duration::from_secs(60)))
            .unwrap();
        assert!(url.query().unwrap().contains("expires="));
        assert_eq!(signer.verify(&url), Ok(()));
    }

    #[test]
    fn test_describe() {
        let listing = table().describe();
        let names: Vec<_> = listing.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["login", "password.reset", "logout", "provider.home", "provider.login"]);
        assert_eq!(listing[2].methods, vec!["GET", "POST"]);
        assert_eq!(listing[0].kind, "redirect");
        assert_eq!(listing[0].target, "provider.login");
    }
}
