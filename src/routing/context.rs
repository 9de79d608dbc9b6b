//! Request data visible to constraint derivation.
//!
//! # Responsibilities
//! - Carry the host and headers a strategy may derive a value from
//! - Carry explicitly supplied runtime constraint values
//!
//! # Design Decisions
//! - Decoupled from any HTTP type; built from `http::Request` by conversion
//! - Header names are stored lowercased (lookup is case-insensitive)
//! - Headers that are not valid UTF-8 are skipped

use std::collections::{BTreeMap, HashMap};

use axum::http::{header, Request};

/// A route's declared constraints, or explicit runtime values at lookup.
/// Keyed by dimension name.
pub type Constraints = BTreeMap<String, String>;

/// Builds a [`Constraints`] map from `(name, value)` pairs.
pub fn constraints<I, K, V>(pairs: I) -> Constraints
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// The request-like input handed to strategy derivation.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    host: Option<String>,
    headers: HashMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// The request host, without normalization.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

impl<B> From<&Request<B>> for RequestContext {
    fn from(req: &Request<B>) -> Self {
        let mut headers = HashMap::new();
        for (name, value) in req.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }

        let host = req
            .headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| req.uri().authority().map(|a| a.as_str().to_string()));

        Self { host, headers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_request() {
        let req = Request::builder()
            .uri("/api")
            .header("Host", "fastify.io")
            .header("Accept-Version", "1.x")
            .body(())
            .unwrap();

        let ctx = RequestContext::from(&req);
        assert_eq!(ctx.host(), Some("fastify.io"));
        assert_eq!(ctx.header("accept-version"), Some("1.x"));
        assert_eq!(ctx.header("ACCEPT-VERSION"), Some("1.x"));
        assert_eq!(ctx.header("user-agent"), None);
    }

    #[test]
    fn test_host_falls_back_to_authority() {
        let req = Request::builder()
            .uri("http://example.io:8080/")
            .body(())
            .unwrap();

        let ctx = RequestContext::from(&req);
        assert_eq!(ctx.host(), Some("example.io:8080"));
    }

    #[test]
    fn test_builders() {
        let ctx = RequestContext::new()
            .with_host("example.io")
            .with_header("User-Agent", "curl/8.0");
        assert_eq!(ctx.host(), Some("example.io"));
        assert_eq!(ctx.header("user-agent"), Some("curl/8.0"));
    }

    #[test]
    fn test_constraints_helper() {
        let c = constraints([("version", "1.0.0"), ("host", "fastify.io")]);
        assert_eq!(c.len(), 2);
        assert_eq!(c["version"], "1.0.0");
    }
}
