//! Authentication route surface backed by the Users.au identity provider.
//!
//! Login, registration and logout are delegated to the provider's routes.
//! Password pages are rendered locally, and email verification is confirmed
//! through signed, throttled links.

pub mod admin;
pub mod config;
pub mod error;
pub mod guards;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod session;
pub mod verification;
pub mod views;

pub use config::schema::AuthConfig;
pub use error::RouteError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
