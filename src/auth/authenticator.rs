//! Authenticators and their construction from policies.
//!
//! # Responsibilities
//! - Decide whether a request's credentials are permitted
//! - Build authenticators from declarative `AuthenticationPolicy` values
//! - Reject unusable policies at construction time, before any listener exists
//!
//! # Design Decisions
//! - Decisions only look at request headers; the body is never read
//! - Authenticators are immutable and shared via `Arc` across requests
//! - Absent policy means permit everything

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap};
use thiserror::Error;

use crate::config::AuthenticationPolicy;

/// Identity attached to a permitted request.
///
/// Inserted into the request extensions before the inner handler runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticationMetadata {
    /// Authenticated subject, if the authenticator established one.
    pub subject: Option<String>,
}

/// Reason a request was not permitted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthenticationError {
    /// Rejected by an explicit deny policy.
    #[error("{0}")]
    Denied(String),

    /// No usable `Authorization: Bearer` header.
    #[error("Missing or malformed bearer token")]
    MissingCredentials,

    /// Bearer token present but unknown.
    #[error("Invalid bearer token")]
    InvalidToken,

    /// No member of an `any` policy permitted the request.
    #[error("No authentication policy permitted the request: {}", join(.0))]
    NoneMatched(Vec<AuthenticationError>),
}

fn join(errors: &[AuthenticationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A policy that cannot be turned into an authenticator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("bearer_token policy requires at least one token")]
    NoTokens,

    #[error("bearer_token policy contains an empty token")]
    EmptyToken,

    #[error("{0} policy requires at least one nested policy")]
    EmptyCombinator(&'static str),
}

/// Decides whether a request is permitted.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticationMetadata, AuthenticationError>;
}

/// Permits every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAuthenticator;

impl Authenticator for AllowAuthenticator {
    fn authenticate(&self, _headers: &HeaderMap) -> Result<AuthenticationMetadata, AuthenticationError> {
        Ok(AuthenticationMetadata::default())
    }
}

/// Rejects every request with a fixed message.
#[derive(Debug, Clone)]
pub struct DenyAuthenticator {
    message: String,
}

impl DenyAuthenticator {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Authenticator for DenyAuthenticator {
    fn authenticate(&self, _headers: &HeaderMap) -> Result<AuthenticationMetadata, AuthenticationError> {
        Err(AuthenticationError::Denied(self.message.clone()))
    }
}

/// Permits requests carrying a known `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct BearerTokenAuthenticator {
    /// Token → subject.
    tokens: BTreeMap<String, String>,
}

impl BearerTokenAuthenticator {
    pub fn new(tokens: BTreeMap<String, String>) -> Result<Self, PolicyError> {
        if tokens.is_empty() {
            return Err(PolicyError::NoTokens);
        }
        if tokens.keys().any(|t| t.is_empty()) {
            return Err(PolicyError::EmptyToken);
        }
        Ok(Self { tokens })
    }
}

impl Authenticator for BearerTokenAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticationMetadata, AuthenticationError> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthenticationError::MissingCredentials)?;

        match self.tokens.get(token) {
            Some(subject) => Ok(AuthenticationMetadata {
                subject: Some(subject.clone()),
            }),
            None => Err(AuthenticationError::InvalidToken),
        }
    }
}

/// Permits if any member permits. Members are tried in order.
pub struct AnyAuthenticator {
    members: Vec<Arc<dyn Authenticator>>,
}

impl AnyAuthenticator {
    pub fn new(members: Vec<Arc<dyn Authenticator>>) -> Self {
        Self { members }
    }
}

impl Authenticator for AnyAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticationMetadata, AuthenticationError> {
        let mut errors = Vec::with_capacity(self.members.len());
        for member in &self.members {
            match member.authenticate(headers) {
                Ok(metadata) => return Ok(metadata),
                Err(e) => errors.push(e),
            }
        }
        Err(AuthenticationError::NoneMatched(errors))
    }
}

/// Permits only if every member permits.
///
/// The first subject established by a member is kept.
pub struct AllAuthenticator {
    members: Vec<Arc<dyn Authenticator>>,
}

impl AllAuthenticator {
    pub fn new(members: Vec<Arc<dyn Authenticator>>) -> Self {
        Self { members }
    }
}

impl Authenticator for AllAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticationMetadata, AuthenticationError> {
        let mut metadata = AuthenticationMetadata::default();
        for member in &self.members {
            let m = member.authenticate(headers)?;
            if metadata.subject.is_none() {
                metadata.subject = m.subject;
            }
        }
        Ok(metadata)
    }
}

/// Build an authenticator from a policy.
pub fn new_authenticator_from_policy(
    policy: &AuthenticationPolicy,
) -> Result<Arc<dyn Authenticator>, PolicyError> {
    let authenticator: Arc<dyn Authenticator> = match policy {
        AuthenticationPolicy::Allow => Arc::new(AllowAuthenticator),
        AuthenticationPolicy::Deny { message } => Arc::new(DenyAuthenticator::new(message.clone())),
        AuthenticationPolicy::BearerToken { tokens } => {
            Arc::new(BearerTokenAuthenticator::new(tokens.clone())?)
        }
        AuthenticationPolicy::Any(policies) => {
            Arc::new(AnyAuthenticator::new(build_members(policies, "any")?))
        }
        AuthenticationPolicy::All(policies) => {
            Arc::new(AllAuthenticator::new(build_members(policies, "all")?))
        }
    };
    Ok(authenticator)
}

fn build_members(
    policies: &[AuthenticationPolicy],
    kind: &'static str,
) -> Result<Vec<Arc<dyn Authenticator>>, PolicyError> {
    if policies.is_empty() {
        return Err(PolicyError::EmptyCombinator(kind));
    }
    policies.iter().map(new_authenticator_from_policy).collect()
}

/// Turns an optional policy into an authenticator for one server configuration.
pub trait AuthenticatorFactory {
    fn new_authenticator(
        &self,
        policy: Option<&AuthenticationPolicy>,
    ) -> Result<Arc<dyn Authenticator>, PolicyError>;
}

impl<F> AuthenticatorFactory for F
where
    F: Fn(Option<&AuthenticationPolicy>) -> Result<Arc<dyn Authenticator>, PolicyError>,
{
    fn new_authenticator(
        &self,
        policy: Option<&AuthenticationPolicy>,
    ) -> Result<Arc<dyn Authenticator>, PolicyError> {
        self(policy)
    }
}

/// Factory backed by [`new_authenticator_from_policy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAuthenticatorFactory;

impl AuthenticatorFactory for DefaultAuthenticatorFactory {
    fn new_authenticator(
        &self,
        policy: Option<&AuthenticationPolicy>,
    ) -> Result<Arc<dyn Authenticator>, PolicyError> {
        match policy {
            Some(policy) => new_authenticator_from_policy(policy),
            None => Ok(Arc::new(AllowAuthenticator)),
        }
    }
}
