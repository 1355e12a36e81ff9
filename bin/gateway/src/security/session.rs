//! Session validation against the remote auth service.
//!
//! Every protected request triggers a fresh `GET /api/session` carrying the
//! caller's cookies. Results are not cached, so a revoked session is refused
//! on the very next request. The outbound call is part of the request's
//! future: if the client disconnects, the pending check is dropped with it.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::CookieJar;
use hstles_clients::AuthClient;
use hstles_platform_access::{AuthenticationError, RequestAuth, SessionPrincipal};
use tracing::{debug, warn};

use super::AuthRejection;

/// Verifies the session cookies on a request.
#[derive(Debug, Clone)]
pub struct SessionValidator {
    auth: AuthClient,
}

impl SessionValidator {
    #[must_use]
    pub fn new(auth: AuthClient) -> Self {
        Self { auth }
    }

    /// Asks the auth service whether the cookies in `headers` belong to a
    /// valid session.
    ///
    /// # Errors
    ///
    /// - [`AuthenticationError::SessionCheckFailed`] when the service is
    ///   unreachable or its answer cannot be decoded. `status` is the upstream
    ///   status, or 0 when no response arrived.
    /// - [`AuthenticationError::SessionRejected`] when the session is not valid.
    pub async fn validate(
        &self,
        headers: &HeaderMap,
    ) -> Result<SessionPrincipal, AuthenticationError> {
        let cookies = forwarded_cookies(headers);
        let upstream = self.auth.validate_session(&cookies).await.map_err(|report| {
            let error = report.current_context();
            warn!(error = %error, "session validation error");
            AuthenticationError::SessionCheckFailed {
                status: error.status().map_or(0, |status| status.as_u16()),
                reason: error.to_string(),
            }
        })?;

        if !upstream.body.valid {
            debug!(status = %upstream.status, "session rejected by auth service");
            return Err(AuthenticationError::SessionRejected);
        }

        Ok(SessionPrincipal::new(
            upstream.body.user_id,
            upstream.body.provider,
        ))
    }
}

/// Rebuilds the `Cookie` header to forward from the cookies on a request.
#[must_use]
pub fn forwarded_cookies(headers: &HeaderMap) -> String {
    CookieJar::from_headers(headers)
        .iter()
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Middleware admitting only requests with a valid session.
///
/// On success the request carries a session [`RequestAuth`].
///
/// # Errors
///
/// Rejects with 401 for an invalid session, and with the upstream status
/// (500 when there is none) when the session could not be checked.
pub async fn require_session(
    State(validator): State<SessionValidator>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let principal = validator.validate(request.headers()).await?;
    request
        .extensions_mut()
        .insert(RequestAuth::from_session(principal));
    Ok(next.run(request).await)
}
