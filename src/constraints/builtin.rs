//! Built-in constraint strategies.

use crate::constraints::store::{ExactStore, Store};
use crate::constraints::version::{Version, VersionStore};
use crate::routing::context::RequestContext;

/// Name of the built-in host dimension.
pub const HOST: &str = "host";

/// Name of the built-in version dimension.
pub const VERSION: &str = "version";

/// Header the version dimension is derived from unless configured otherwise.
pub const DEFAULT_VERSION_HEADER: &str = "accept-version";

/// Exact match on the request host.
#[derive(Debug, Clone, Default)]
pub struct HostStrategy;

impl HostStrategy {
    pub fn derive(&self, ctx: &RequestContext) -> Option<String> {
        ctx.host().map(str::to_string)
    }

    pub fn storage(&self) -> Store {
        Store::Exact(ExactStore::new())
    }
}

/// Semantic-version range match, derived from a request header.
#[derive(Debug, Clone)]
pub struct VersionStrategy {
    header: String,
}

impl VersionStrategy {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn derive(&self, ctx: &RequestContext) -> Option<String> {
        ctx.header(&self.header).map(str::to_string)
    }

    pub fn storage(&self) -> Store {
        Store::Version(VersionStore::new())
    }

    /// Registered versions must be exact; they are stored canonically.
    pub fn normalize(&self, value: &str) -> Result<String, String> {
        value
            .parse::<Version>()
            .map(|v| v.to_string())
            .map_err(|e| e.to_string())
    }
}

impl Default for VersionStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION_HEADER)
    }
}

/// Exact match under a custom name, derived from a request header.
#[derive(Debug, Clone)]
pub struct HeaderStrategy {
    name: String,
    header: String,
}

impl HeaderStrategy {
    pub fn new(name: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            header: header.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn derive(&self, ctx: &RequestContext) -> Option<String> {
        ctx.header(&self.header).map(str::to_string)
    }

    pub fn storage(&self) -> Store {
        Store::Exact(ExactStore::new())
    }
}
