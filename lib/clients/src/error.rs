//! Client error types.

use reqwest::StatusCode;
use std::fmt;

/// Errors from calling a remote service.
#[derive(Debug)]
pub enum ClientError {
    /// The underlying HTTP client could not be built.
    Build { details: String },
    /// The request never produced a response (connection refused, timeout, ...).
    Transport { endpoint: String, details: String },
    /// A response arrived but its body could not be decoded.
    Decode {
        endpoint: String,
        status: StatusCode,
        details: String,
    },
    /// The service answered but reported failure in its body.
    Backend {
        endpoint: String,
        status: StatusCode,
        message: String,
    },
    /// A redirect was expected but the response carried none.
    MissingRedirect { endpoint: String, status: StatusCode },
}

impl ClientError {
    /// Returns the upstream status code, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Build { .. } | Self::Transport { .. } => None,
            Self::Decode { status, .. }
            | Self::Backend { status, .. }
            | Self::MissingRedirect { status, .. } => Some(*status),
        }
    }

    /// Returns the upstream status, or 500 when no response was received.
    #[must_use]
    pub fn status_or_internal(&self) -> StatusCode {
        self.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build { details } => write!(f, "failed to build HTTP client: {details}"),
            Self::Transport { endpoint, details } => {
                write!(f, "request to '{endpoint}' failed: {details}")
            }
            Self::Decode {
                endpoint,
                status,
                details,
            } => write!(
                f,
                "could not decode response from '{endpoint}' (status {status}): {details}"
            ),
            Self::Backend {
                endpoint,
                status,
                message,
            } => write!(f, "'{endpoint}' reported failure (status {status}): {message}"),
            Self::MissingRedirect { endpoint, status } => {
                write!(f, "no redirect in response from '{endpoint}' (status {status})")
            }
        }
    }
}

impl std::error::Error for ClientError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_has_no_status() {
        let err = ClientError::Transport {
            endpoint: "/api/session".to_string(),
            details: "connection refused".to_string(),
        };
        assert_eq!(err.status(), None);
        assert_eq!(err.status_or_internal(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn decode_error_keeps_upstream_status() {
        let err = ClientError::Decode {
            endpoint: "/api/session".to_string(),
            status: StatusCode::BAD_GATEWAY,
            details: "expected value".to_string(),
        };
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        assert!(err.to_string().contains("502"));
    }
}
