//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, RequestContext on the public origin)
//!     → routing::dispatch (guards, handler)
//!     → response.rs (redirects, header merging)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod tls;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, Services};
