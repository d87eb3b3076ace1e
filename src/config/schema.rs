//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Placeholder secrets shipped in the defaults. Startup warns when they are still in use.
pub const PLACEHOLDER_APP_KEY: &str = "CHANGE_ME_IN_PRODUCTION_0123456789abcdef";
pub const PLACEHOLDER_ADMIN_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Root configuration for the auth route service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Application identity: public URL, signing key, home path.
    pub app: AppConfig,

    /// Registration feature flag.
    pub registration: RegistrationConfig,

    /// Targets of the identity provider's named routes.
    pub provider: ProviderConfig,

    /// Session cookie settings.
    pub session: SessionConfig,

    /// Email verification link and throttle settings.
    pub verification: VerificationConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Application settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Public base URL. Generated and verified URLs are absolute against it.
    pub url: String,

    /// Secret used to sign and verify links.
    pub key: String,

    /// Path authenticated users are sent to (guest redirects, post-verification).
    pub home: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            key: PLACEHOLDER_APP_KEY.to_string(),
            home: "/dashboard".to_string(),
        }
    }
}

/// Registration feature flag. Read once per route table build.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrationConfig {
    pub enabled: bool,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Where the provider routes (`usersau.*`) live.
///
/// Values are absolute URLs or paths relative to `app.url`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub login: String,
    pub register: String,
    pub logout: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            login: "/usersau/login".to_string(),
            register: "/usersau/register".to_string(),
            logout: "/usersau/logout".to_string(),
        }
    }
}

/// Session cookie settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session token.
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "auth_session".to_string(),
        }
    }
}

/// Email verification settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Requests admitted per window on the confirmation route.
    pub max_attempts: u32,

    /// Throttle window length in seconds.
    pub decay_secs: u64,

    /// Lifetime of issued verification links in seconds.
    pub link_ttl_secs: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            decay_secs: 60,
            link_ttl_secs: 3600,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: PLACEHOLDER_ADMIN_KEY.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 64 * 1024,
        }
    }
}
