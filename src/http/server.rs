//! Default request handler served by the binary.
//!
//! # Responsibilities
//! - Provide a health endpoint for load balancers and probes
//! - Echo the authenticated identity for debugging credentials
//! - Wire up request tracing
//!
//! Library users pass their own `Router` to `lifecycle::launch` instead.

use axum::{
    extract::Request,
    http::{Method, Uri},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::auth::AuthenticationMetadata;

/// Build the base router. Authentication is layered on per server
/// configuration by the launcher.
pub fn base_router() -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/whoami", get(whoami))
        .fallback(echo)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn whoami(request: Request) -> String {
    request
        .extensions()
        .get::<AuthenticationMetadata>()
        .and_then(|m| m.subject.clone())
        .unwrap_or_else(|| "anonymous".to_string())
}

async fn echo(method: Method, uri: Uri) -> String {
    format!("{} {}\n", method, uri.path())
}
