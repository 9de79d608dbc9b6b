//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration:
//!     RouteDefinition (method, path, constraints, handler)
//!     → router.rs (locate or create the path node)
//!     → set.rs (ConstraintSet: normalize, detect duplicates,
//!               insert into one store per dimension)
//!
//! Incoming request (method, path, RequestContext)
//!     → router.rs (path node lookup)
//!     → set.rs (derive values, keep routes matching every dimension
//!               they declare, rank the survivors)
//!     → Return: matched handler or None
//! ```
//!
//! # Design Decisions
//! - Route tables are immutable snapshots for readers (shared.rs)
//! - "No match" is a value, not an error
//! - Deterministic: same table and input always select the same route

pub mod context;
pub mod mask;
pub mod router;
pub mod set;
pub mod shared;

pub use context::{constraints, Constraints, RequestContext};
pub use mask::RouteMask;
pub use router::{parse_method, RouteDefinition, Router, RouterOptions};
pub use set::{ConstraintSet, FallbackPolicy};
pub use shared::SharedRouter;
