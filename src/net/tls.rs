//! Certificate pair loading for servers configured with TLS.

use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

/// Error type for TLS material.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("{role} file not found: {}", path.display())]
    Missing { role: &'static str, path: PathBuf },
    #[error("failed to load certificate pair: {0}")]
    Load(#[source] std::io::Error),
}

/// Load a rustls config from a PEM certificate chain and private key.
///
/// Both files are checked up front so the error names the one that is absent.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    for (role, path) in [("certificate", cert_path), ("private key", key_path)] {
        if !path.exists() {
            return Err(TlsError::Missing {
                role,
                path: path.to_path_buf(),
            });
        }
    }

    let config = RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(TlsError::Load)?;
    tracing::debug!(cert = %cert_path.display(), "TLS material loaded");
    Ok(config)
}
