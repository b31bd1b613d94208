//! Authentication middleware.
//!
//! Wraps an inner service so that every request is first checked by an
//! [`Authenticator`]. Denied requests get `401 Unauthorized` and never reach
//! the inner service; permitted requests carry [`AuthenticationMetadata`] in
//! their extensions.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::future::{self, Either, Ready};
use tower::{Layer, Service};

use super::authenticator::{AuthenticationMetadata, Authenticator};

/// Layer producing [`AuthenticatingHandler`]s.
#[derive(Clone)]
pub struct AuthenticatingLayer {
    authenticator: Arc<dyn Authenticator>,
}

impl AuthenticatingLayer {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }
}

impl<S> Layer<S> for AuthenticatingLayer {
    type Service = AuthenticatingHandler<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthenticatingHandler::new(inner, Arc::clone(&self.authenticator))
    }
}

/// Handler that consults an authenticator before forwarding to `inner`.
#[derive(Clone)]
pub struct AuthenticatingHandler<S> {
    inner: S,
    authenticator: Arc<dyn Authenticator>,
}

impl<S> AuthenticatingHandler<S> {
    pub fn new(inner: S, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            inner,
            authenticator,
        }
    }
}

impl<S, B> Service<Request<B>> for AuthenticatingHandler<S>
where
    S: Service<Request<B>, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        match self.authenticator.authenticate(request.headers()) {
            Ok(metadata) => {
                request.extensions_mut().insert::<AuthenticationMetadata>(metadata);
                Either::Right(self.inner.call(request))
            }
            Err(e) => {
                tracing::debug!(
                    method = %request.method(),
                    path = %request.uri().path(),
                    error = %e,
                    "Request rejected by authenticator"
                );
                let response = (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
                Either::Left(future::ready(Ok(response)))
            }
        }
    }
}
