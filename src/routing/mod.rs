//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, session)
//!     → context.rs (RequestContext on the public origin)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate path pattern + method set)
//!     → dispatch.rs (guards, then handler)
//!
//! Route Compilation (at startup and on config reload):
//!     AuthConfig + Collaborators
//!     → routes.rs (the auth route list, registration flag applied)
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod context;
pub mod dispatch;
pub mod matcher;
pub mod router;
pub mod routes;

pub use context::RequestContext;
pub use dispatch::dispatch;
pub use matcher::{MethodSet, PathPattern, RouteParams};
pub use router::{ActionHandler, Route, RouteHandler, RouteMatch, RouteSummary, RouteTable, RouteTableError};
pub use routes::{build_route_table, names, Collaborators};
