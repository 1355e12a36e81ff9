//! Request principals.
//!
//! Security middleware attaches a [`RequestAuth`] to each request it admits.
//! Handlers read it back as a typed value instead of probing a loosely-typed
//! key/value bag. Principals live for one request and are never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AuthorizationError;

/// A user session verified by the remote auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPrincipal {
    user_id: String,
    provider: String,
}

impl SessionPrincipal {
    /// Creates a principal. Empty strings mean "unknown".
    #[must_use]
    pub fn new(user_id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            provider: provider.into(),
        }
    }

    /// Returns the opaque user ID (may be empty).
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns the identity provider that authenticated the session (may be empty).
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }
}

/// A calling service identified by its API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePrincipal {
    service_name: String,
}

impl ServicePrincipal {
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

/// Which credential admitted the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    Session,
    Service,
}

impl AuthType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Service => "service",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication state attached to a single request.
///
/// At most one of the session or service principal is set; the constructors
/// keep `auth_type` consistent with whichever one is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestAuth {
    session: Option<SessionPrincipal>,
    service: Option<ServicePrincipal>,
    auth_type: Option<AuthType>,
}

impl RequestAuth {
    /// No credentials (public routes).
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_session(principal: SessionPrincipal) -> Self {
        Self {
            session: Some(principal),
            service: None,
            auth_type: Some(AuthType::Session),
        }
    }

    #[must_use]
    pub fn from_service(principal: ServicePrincipal) -> Self {
        Self {
            session: None,
            service: Some(principal),
            auth_type: Some(AuthType::Service),
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&SessionPrincipal> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn service(&self) -> Option<&ServicePrincipal> {
        self.service.as_ref()
    }

    #[must_use]
    pub fn auth_type(&self) -> Option<AuthType> {
        self.auth_type
    }

    /// Returns "session", "service", or "unknown".
    #[must_use]
    pub fn auth_type_str(&self) -> &'static str {
        self.auth_type.map_or("unknown", |t| t.as_str())
    }

    /// Returns the calling service's name, if a service key admitted the request.
    #[must_use]
    pub fn service_name(&self) -> Option<&str> {
        self.service.as_ref().map(ServicePrincipal::service_name)
    }

    /// Returns the session's provider, or "" if there is no session.
    #[must_use]
    pub fn provider(&self) -> &str {
        self.session.as_ref().map_or("", SessionPrincipal::provider)
    }

    /// Returns the session's user ID.
    ///
    /// # Errors
    ///
    /// Fails if there is no session, or the session carries no user ID.
    pub fn require_user(&self) -> Result<&str, AuthorizationError> {
        let session = self.session.as_ref().ok_or(AuthorizationError::NoSession)?;
        if session.user_id.is_empty() {
            return Err(AuthorizationError::MissingUserId);
        }
        Ok(&session.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_has_unknown_auth_type() {
        let auth = RequestAuth::anonymous();
        assert_eq!(auth.auth_type_str(), "unknown");
        assert_eq!(auth.provider(), "");
        assert!(auth.service_name().is_none());
        assert_eq!(auth.require_user(), Err(AuthorizationError::NoSession));
    }

    #[test]
    fn session_auth_exposes_user_and_provider() {
        let auth = RequestAuth::from_session(SessionPrincipal::new("u_123", "google"));
        assert_eq!(auth.auth_type(), Some(AuthType::Session));
        assert_eq!(auth.auth_type_str(), "session");
        assert_eq!(auth.require_user(), Ok("u_123"));
        assert_eq!(auth.provider(), "google");
        assert!(auth.service().is_none());
    }

    #[test]
    fn session_without_user_id_is_rejected() {
        let auth = RequestAuth::from_session(SessionPrincipal::new("", "github"));
        assert_eq!(auth.require_user(), Err(AuthorizationError::MissingUserId));
    }

    #[test]
    fn service_auth_exposes_service_name() {
        let auth = RequestAuth::from_service(ServicePrincipal::new("notify"));
        assert_eq!(auth.auth_type_str(), "service");
        assert_eq!(auth.service_name(), Some("notify"));
        assert!(auth.session().is_none());
    }

    #[test]
    fn auth_type_serializes_lowercase() {
        let json = serde_json::to_string(&AuthType::Service).expect("serialize");
        assert_eq!(json, "\"service\"");
    }
}
