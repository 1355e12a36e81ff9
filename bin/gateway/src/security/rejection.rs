//! Responses for requests the security layer refuses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hstles_platform_access::{AuthenticationError, AuthorizationError, ProviderValidationError};

/// Why a request was stopped before reaching its handler.
///
/// Credential failures (401) carry a generic message only. Provider
/// failures (403) spell out which providers would have been accepted, since
/// the caller is already authenticated at that point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    Authentication(AuthenticationError),
    Authorization(AuthorizationError),
    Provider(ProviderValidationError),
}

impl AuthRejection {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Authentication(AuthenticationError::SessionCheckFailed { status, .. }) => {
                match StatusCode::from_u16(*status) {
                    Ok(status) if status.is_client_error() || status.is_server_error() => status,
                    Ok(_) => StatusCode::BAD_GATEWAY,
                    Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
                }
            }
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization(AuthorizationError::NoSession) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Authorization(AuthorizationError::MissingUserId) => StatusCode::UNAUTHORIZED,
            Self::Provider(ProviderValidationError::EmptyProvider { .. }) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Provider(_) => StatusCode::FORBIDDEN,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Authentication(AuthenticationError::SessionRejected) => {
                "Unauthorized".to_string()
            }
            Self::Authentication(AuthenticationError::SessionCheckFailed { .. }) => {
                "Session validation failed".to_string()
            }
            Self::Authentication(AuthenticationError::MissingApiKey) => {
                "API key required".to_string()
            }
            Self::Authentication(AuthenticationError::InvalidApiKey) => {
                "Invalid API key".to_string()
            }
            Self::Authorization(AuthorizationError::NoSession) => {
                "Session data not found in context".to_string()
            }
            Self::Authorization(AuthorizationError::MissingUserId) => "Unauthorized".to_string(),
            Self::Provider(ProviderValidationError::EmptyProvider { .. }) => {
                "Provider information not available".to_string()
            }
            Self::Provider(err) => err.to_string(),
        }
    }
}

impl From<AuthenticationError> for AuthRejection {
    fn from(err: AuthenticationError) -> Self {
        Self::Authentication(err)
    }
}

impl From<AuthorizationError> for AuthRejection {
    fn from(err: AuthorizationError) -> Self {
        Self::Authorization(err)
    }
}

impl From<ProviderValidationError> for AuthRejection {
    fn from(err: ProviderValidationError) -> Self {
        Self::Provider(err)
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (self.status(), self.message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_are_unauthorized() {
        for err in [
            AuthenticationError::SessionRejected,
            AuthenticationError::MissingApiKey,
            AuthenticationError::InvalidApiKey,
        ] {
            assert_eq!(AuthRejection::from(err).status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn failed_session_check_relays_upstream_status() {
        let rejection = AuthRejection::from(AuthenticationError::SessionCheckFailed {
            status: 502,
            reason: "bad gateway".to_string(),
        });
        assert_eq!(rejection.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(rejection.message(), "Session validation failed");
    }

    #[test]
    fn failed_session_check_never_reports_success() {
        for status in [200, 204, 302] {
            let rejection = AuthRejection::from(AuthenticationError::SessionCheckFailed {
                status,
                reason: "expected value at line 1 column 1".to_string(),
            });
            assert_eq!(rejection.status(), StatusCode::BAD_GATEWAY);
        }
    }

    #[test]
    fn missing_upstream_status_becomes_internal_error() {
        let rejection = AuthRejection::from(AuthenticationError::SessionCheckFailed {
            status: 0,
            reason: "connection refused".to_string(),
        });
        assert_eq!(rejection.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn provider_denial_is_forbidden_with_details() {
        let rejection = AuthRejection::from(ProviderValidationError::ProviderNotAllowed {
            session_provider: "github".to_string(),
            app_name: "support".to_string(),
            display_name: "Support".to_string(),
            allowed_providers: vec!["google".to_string(), "microsoftonline".to_string()],
        });
        assert_eq!(rejection.status(), StatusCode::FORBIDDEN);
        assert!(rejection.message().contains("Allowed providers: google, microsoftonline"));
    }

    #[test]
    fn unresolved_app_is_forbidden() {
        let rejection = AuthRejection::from(ProviderValidationError::AppNotFound {
            session_provider: "google".to_string(),
            app_name: "portal".to_string(),
        });
        assert_eq!(rejection.status(), StatusCode::FORBIDDEN);
    }
}
