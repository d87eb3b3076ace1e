//! TLS configuration and certificate loading.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsConfig;

/// Load the listener's certificate and key (PEM).
pub async fn load_tls_config(config: &TlsConfig) -> Result<RustlsConfig, std::io::Error> {
    for (what, path) in [("Certificate", &config.cert_path), ("Private key", &config.key_path)] {
        if !Path::new(path).exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{what} file not found: {path}"),
            ));
        }
    }

    RustlsConfig::from_pem_file(&config.cert_path, &config.key_path).await
}
