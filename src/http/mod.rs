//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all dispatch)
//!     → RequestContext::from(&request)
//!     → SharedRouter snapshot → find_request(method, path, ctx)
//!     → response.rs (matched RouteTarget, 404, or 400)
//!     → Send to client
//! ```

pub mod response;
pub mod server;

pub use response::{RouteTarget, X_ROUTE};
pub use server::HttpServer;
