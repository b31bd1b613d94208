//! Shared utilities for integration testing.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use http_supervisor::config::{AuthenticationPolicy, ServerConfiguration, TlsSettings};

/// Upper bound for anything that should happen "promptly".
#[allow(dead_code)]
pub const PROMPTLY: Duration = Duration::from_secs(5);

/// A server configuration listening on `count` ephemeral loopback ports.
pub fn loopback_server(count: usize) -> ServerConfiguration {
    ServerConfiguration {
        listen_addresses: vec!["127.0.0.1:0".to_string(); count],
        ..Default::default()
    }
}

/// Bearer token policy mapping each token to a subject.
#[allow(dead_code)]
pub fn bearer_policy(pairs: &[(&str, &str)]) -> AuthenticationPolicy {
    AuthenticationPolicy::BearerToken {
        tokens: pairs
            .iter()
            .map(|(t, s)| (t.to_string(), s.to_string()))
            .collect::<BTreeMap<_, _>>(),
    }
}

/// HTTP client that never reuses connections and ignores proxy settings.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(PROMPTLY)
        .build()
        .unwrap()
}

/// Write a self-signed certificate for "localhost" into `dir`.
#[allow(dead_code)]
pub fn self_signed_tls(dir: &Path) -> TlsSettings {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_path = dir.join("cert.pem");
    let key_path = dir.join("key.pem");
    std::fs::write(&cert_path, cert.pem()).unwrap();
    std::fs::write(&key_path, key_pair.serialize_pem()).unwrap();

    TlsSettings {
        cert_path: cert_path.to_string_lossy().into_owned(),
        key_path: key_path.to_string_lossy().into_owned(),
    }
}
