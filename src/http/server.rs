//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a single dispatching handler
//! - Wire up middleware (request ID, tracing, limits, timeouts, headers)
//! - Bind server to listener (plain or TLS)
//! - Swap in a rebuilt route table when the configuration changes
//! - Periodically sweep idle rate limiter keys

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::config::AuthConfig;
use crate::http::request::{context_from_request, X_REQUEST_ID};
use crate::observability::spans::make_request_span;
use crate::routing::{build_route_table, dispatch, Collaborators, RouteTable, RouteTableError};
use crate::security::headers::security_headers;
use crate::security::RateLimiter;
use crate::session::{Principal, SessionStore};
use crate::verification::{verification_url, EmailVerifier, InMemoryAccounts};
use crate::views::{PageRenderer, ViewRenderer};

/// Collaborators that live for the whole process, across config reloads.
#[derive(Clone)]
pub struct Services {
    pub sessions: SessionStore,
    pub limiter: Arc<RateLimiter>,
    pub verifier: Arc<dyn EmailVerifier>,
    pub views: Arc<dyn ViewRenderer>,
}

impl Services {
    /// Services backed by in-process stores.
    pub fn in_memory() -> (Self, InMemoryAccounts) {
        let sessions = SessionStore::new();
        let accounts = InMemoryAccounts::new().with_sessions(sessions.clone());
        let services = Self {
            sessions,
            limiter: Arc::new(RateLimiter::new()),
            verifier: Arc::new(accounts.clone()),
            views: Arc::new(PageRenderer),
        };
        (services, accounts)
    }
}

/// Everything derived from one configuration.
pub struct Snapshot {
    pub config: AuthConfig,
    pub base: Url,
    pub table: RouteTable,
    pub deps: Collaborators,
}

impl Snapshot {
    fn build(config: AuthConfig, services: &Services) -> Result<Self, RouteTableError> {
        let deps = Collaborators::new(&config, services.limiter.clone(), services.verifier.clone())?;
        let table = build_route_table(&config, &deps)?;
        Ok(Self {
            base: table.base_url().clone(),
            config,
            table,
            deps,
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<Snapshot>>,
    pub services: Services,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AuthConfig, services: Services) -> Result<Self, RouteTableError> {
        let snapshot = Snapshot::build(config, &services)?;
        Ok(Self {
            inner: Arc::new(ArcSwap::from_pointee(snapshot)),
            services,
            started_at: Instant::now(),
        })
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.load_full()
    }

    /// Rebuild the route table from `config` and swap it in.
    ///
    /// On error the current table stays active.
    pub fn reload(&self, config: AuthConfig) -> Result<(), RouteTableError> {
        let current = self.inner.load();
        if current.config.listener.bind_address != config.listener.bind_address {
            tracing::warn!("listener.bind_address changed; takes effect after restart");
        }
        let snapshot = Snapshot::build(config, &self.services)?;
        tracing::info!(
            routes = snapshot.table.len(),
            registration = snapshot.config.registration.enabled,
            "Route table reloaded"
        );
        self.inner.store(Arc::new(snapshot));
        Ok(())
    }

    /// Signed verification link for `principal` under the active configuration.
    pub fn verification_url(&self, principal: &Principal) -> Result<Url, crate::error::RouteError> {
        let snapshot = self.snapshot();
        verification_url(
            &snapshot.table,
            &snapshot.deps.signer,
            principal,
            Duration::from_secs(snapshot.config.verification.link_ttl_secs),
        )
    }
}

/// HTTP server for the auth routes.
pub struct HttpServer {
    router: Router,
    config: AuthConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a server backed by empty in-process stores.
    ///
    /// The account store is not reachable from here, so verification links can
    /// only be refused with 403. Supply a real [`EmailVerifier`] and session store
    /// through [`HttpServer::with_services`] to confirm emails.
    pub fn new(config: AuthConfig) -> Result<Self, RouteTableError> {
        let (services, _accounts) = Services::in_memory();
        Self::with_services(config, services)
    }

    pub fn with_services(config: AuthConfig, services: Services) -> Result<Self, RouteTableError> {
        let state = AppState::new(config.clone(), services)?;
        let router = Self::build_router(&config, state.clone());
        Ok(Self { router, config, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AuthConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .fallback(handle_request)
            .with_state(state);

        if config.security.enable_headers {
            for (name, value) in security_headers() {
                router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
            }
        }

        router
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// The fully layered router, for serving or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get a reference to the config the server was started with.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<AuthConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        self.spawn_background(config_updates);

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: axum_server::tls_rustls::RustlsConfig,
        config_updates: mpsc::UnboundedReceiver<AuthConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        self.spawn_background(config_updates);

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service_with_connect_info::<SocketAddr>())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    fn spawn_background(&self, mut config_updates: mpsc::UnboundedReceiver<AuthConfig>) {
        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = state.reload(config) {
                    tracing::error!(error = %e, "Rejected configuration update, keeping current routes");
                }
            }
        });

        let state = self.state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                let window = Duration::from_secs(state.snapshot().config.verification.decay_secs);
                state.services.limiter.sweep(window);
            }
        });
    }
}

/// Single entry point: every request is dispatched through the route table.
async fn handle_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    let snapshot = state.snapshot();
    let ctx = context_from_request(
        &request,
        &snapshot.base,
        &state.services.sessions,
        &snapshot.config.session.cookie_name,
    );
    dispatch(&snapshot.table, state.services.views.as_ref(), ctx).await
}
