//! Constraint-aware route selection library.
//!
//! Several handlers may share one method and path; each declares the
//! constraint values (host, version, or a custom dimension) it serves,
//! and a lookup picks the handler whose constraints the request satisfies.

pub mod config;
pub mod constraints;
pub mod error;
pub mod http;
pub mod observability;
pub mod routing;

pub use config::schema::AppConfig;
pub use constraints::{ConstraintStore, ConstraintStrategy, MatchType, Registry, Strategy};
pub use error::{RouterError, RouterResult};
pub use http::HttpServer;
pub use routing::{constraints, Constraints, RequestContext, RouteDefinition, Router, SharedRouter};
