//! Gateway error types.
//!
//! `GatewayError` covers startup and serving failures. Request-level failures
//! are turned into responses by [`UpstreamFailure`] and by the security
//! layer's `AuthRejection`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hstles_clients::ClientError;
use rootcause::prelude::Report;
use std::fmt;
use tracing::warn;

/// Errors that stop the gateway from starting or serving.
#[derive(Debug)]
pub enum GatewayError {
    /// Configuration could not be loaded.
    Config { details: String },
    /// The application registry is inconsistent.
    Registry { details: String },
    /// A platform-service client could not be built.
    Client { service: &'static str, details: String },
    /// The listen address could not be bound.
    Bind { addr: String, details: String },
    /// The server stopped with an I/O error.
    Serve { details: String },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {details}"),
            Self::Registry { details } => write!(f, "invalid app registry: {details}"),
            Self::Client { service, details } => {
                write!(f, "failed to build {service} client: {details}")
            }
            Self::Bind { addr, details } => write!(f, "failed to bind '{addr}': {details}"),
            Self::Serve { details } => write!(f, "server error: {details}"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// A failed call to a platform service, relayed to the caller with the
/// upstream status code when one is known and 500 otherwise. A failure
/// reported under a 2xx status becomes 502.
#[derive(Debug)]
pub struct UpstreamFailure(pub Report<ClientError>);

impl From<Report<ClientError>> for UpstreamFailure {
    fn from(report: Report<ClientError>) -> Self {
        Self(report)
    }
}

impl IntoResponse for UpstreamFailure {
    fn into_response(self) -> Response {
        let error = self.0.current_context();
        let status = match error.status_or_internal() {
            status if status.is_success() => StatusCode::BAD_GATEWAY,
            status => status,
        };
        warn!(%status, error = %error, "upstream call failed");

        let message = match error {
            ClientError::Backend { message, .. } if !message.is_empty() => message.clone(),
            _ => error.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// A request body that could not be read as the expected JSON.
pub fn invalid_json() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": "invalid JSON" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failure_maps_to_internal_error() {
        let failure = UpstreamFailure(Report::new(ClientError::Transport {
            endpoint: "/api/plans".to_string(),
            details: "connection refused".to_string(),
        }));
        let response = failure.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn decode_failure_keeps_upstream_status() {
        let failure = UpstreamFailure(Report::new(ClientError::Decode {
            endpoint: "/api/plans".to_string(),
            status: StatusCode::SERVICE_UNAVAILABLE,
            details: "expected value".to_string(),
        }));
        assert_eq!(
            failure.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn gateway_error_display() {
        let err = GatewayError::Bind {
            addr: "0.0.0.0:80".to_string(),
            details: "permission denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to bind '0.0.0.0:80': permission denied"
        );
    }
}
