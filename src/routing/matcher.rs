//! Route matching logic.
//!
//! # Responsibilities
//! - Parse path patterns (`/reset-password/{token}`)
//! - Match request paths segment by segment, capturing parameters
//! - Match HTTP methods (GET also answers HEAD)
//! - Render patterns back into paths for URL generation
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Empty segments are ignored, so a trailing slash matches the bare path
//! - A `{param}` segment matches exactly one non-empty segment
//! - Captured values are kept as they appear in the request (no decoding)
//! - No regex to guarantee O(n) matching

use std::fmt;

use axum::http::Method;
use thiserror::Error;

/// Problem with a path pattern at route registration time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid path pattern '{pattern}': {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let error = |reason| PatternError {
            pattern: raw.to_string(),
            reason,
        };

        if !raw.starts_with('/') {
            return Err(error("must start with '/'"));
        }

        let mut segments = Vec::new();
        for part in raw.split('/').filter(|s| !s.is_empty()) {
            match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(name) => {
                    if name.is_empty() || name.contains(['{', '}']) {
                        return Err(error("malformed parameter"));
                    }
                    if segments.iter().any(|s| matches!(s, Segment::Param(n) if n == name)) {
                        return Err(error("duplicate parameter"));
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None if part.contains(['{', '}']) => return Err(error("malformed parameter")),
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of the parameters in declaration order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match `path`, returning the captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let mut parts = path.split('/').filter(|s| !s.is_empty());
        let mut params = RouteParams::default();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => params.push(name, part),
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }

    /// Substitute parameters into the pattern. Returns the name of the first
    /// parameter without a value on failure.
    pub fn render(&self, params: &RouteParams) -> Result<String, String> {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(literal) => path.push_str(literal),
                Segment::Param(name) => {
                    let value = params
                        .get(name)
                        .filter(|v| !v.is_empty())
                        .ok_or_else(|| name.clone())?;
                    path.push_str(value);
                }
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        Ok(path)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Ordered parameters captured from a path or supplied for URL generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(Vec<(String, String)>);

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// The HTTP methods a route answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSet(Vec<Method>);

impl MethodSet {
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        let mut set: Vec<Method> = Vec::new();
        for method in methods {
            if !set.contains(&method) {
                set.push(method);
            }
        }
        Self(set)
    }

    pub fn get() -> Self {
        Self::new([Method::GET])
    }

    pub fn matches(&self, method: &Method) -> bool {
        self.0.contains(method) || (*method == Method::HEAD && self.0.contains(&Method::GET))
    }

    /// Methods to advertise in an `Allow` header.
    pub fn allowed(&self) -> Vec<Method> {
        let mut allowed = self.0.clone();
        if allowed.contains(&Method::GET) && !allowed.contains(&Method::HEAD) {
            allowed.push(Method::HEAD);
        }
        allowed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Method> {
        self.0.iter()
    }
}
