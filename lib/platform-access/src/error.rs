//! Error types for the platform-access crate.
//!
//! - `AuthenticationError`: the caller's credentials could not be verified
//! - `AuthorizationError`: a verified caller is missing something a handler needs
//!
//! Provider allow-list failures have their own structured type,
//! [`ProviderValidationError`](crate::ProviderValidationError).

use std::fmt;

/// Errors from verifying who the caller is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The auth service reported the session as invalid.
    SessionRejected,
    /// The auth service could not be reached or returned an unreadable body.
    SessionCheckFailed { status: u16, reason: String },
    /// No API key header was supplied on a service route.
    MissingApiKey,
    /// The supplied API key matched no configured service.
    InvalidApiKey,
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionRejected => write!(f, "session is not valid"),
            Self::SessionCheckFailed { status, reason } => {
                write!(f, "session validation failed (status {status}): {reason}")
            }
            Self::MissingApiKey => write!(f, "API key required"),
            Self::InvalidApiKey => write!(f, "invalid API key"),
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from reading the principal attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// No session principal was attached to the request.
    NoSession,
    /// A session principal was attached but carries no user ID.
    MissingUserId,
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSession => write!(f, "no session data in request"),
            Self::MissingUserId => write!(f, "no user ID in session"),
        }
    }
}

impl std::error::Error for AuthorizationError {}
