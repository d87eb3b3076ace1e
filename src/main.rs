//! Auth routes service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (request id, trace, limits, timeout)
//!                         │
//!                         ▼
//!                     routing::dispatch ──▶ RouteTable::match_request
//!                         │                      404 / 405
//!                         ▼
//!                     guards (guest, auth, signed, throttle)
//!                         │                      redirect / 401 / 403 / 429
//!                         ▼
//!                     handler
//!                       ├─ Redirect  → usersau.login / register / logout
//!                       ├─ View      → auth.* pages
//!                       └─ Action    → verify-email
//!
//!     Cross-cutting: config (+ hot reload), observability, admin API, lifecycle
//! ```

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "auth-routes")]
#[command(about = "Authentication routes delegating to the Users.au provider", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Watched for changes.
    #[arg(short, long, env = "AUTH_ROUTES_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    auth_routes::lifecycle::startup::run(args.config).await
}
