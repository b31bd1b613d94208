//! TLS configuration and certificate loading.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsSettings;

/// Build the transport configuration for one server configuration.
///
/// `None` settings mean plaintext and yield `Ok(None)`.
pub async fn new_tls_config(settings: Option<&TlsSettings>) -> Result<Option<RustlsConfig>, std::io::Error> {
    match settings {
        Some(settings) => {
            let config = load_tls_config(Path::new(&settings.cert_path), Path::new(&settings.key_path)).await?;
            Ok(Some(config))
        }
        None => Ok(None),
    }
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, std::io::Error> {
    if !cert_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Certificate file not found: {:?}", cert_path),
        ));
    }
    if !key_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Private key file not found: {:?}", key_path),
        ));
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}
