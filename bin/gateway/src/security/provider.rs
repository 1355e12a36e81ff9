//! Identity-provider allow-list enforcement for an application's routes.
//!
//! Runs after session validation: it reads the [`RequestAuth`] attached by
//! an earlier layer and checks the session's provider against the app's
//! allow-list.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use hstles_platform_access::{AuthorizationError, ProviderValidator, RequestAuth};
use std::sync::Arc;
use tracing::{debug, warn};

use super::AuthRejection;

/// Provider check bound to one application.
#[derive(Debug, Clone)]
pub struct ProviderGate {
    validator: ProviderValidator,
    app_name: Arc<str>,
    app_domains: Arc<str>,
}

impl ProviderGate {
    /// `app_domains` is a comma-separated hint used when `app_name` is not a
    /// registered name.
    #[must_use]
    pub fn new(validator: ProviderValidator, app_name: &str, app_domains: &str) -> Self {
        Self {
            validator,
            app_name: Arc::from(app_name),
            app_domains: Arc::from(app_domains),
        }
    }

    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Checks the session on `auth`.
    ///
    /// # Errors
    ///
    /// - 500 when no session was attached (the gate is mounted without a
    ///   session layer in front of it)
    /// - 401 when the session has no provider
    /// - 403 when the provider is not allowed or the app cannot be resolved
    pub fn check(&self, auth: Option<&RequestAuth>) -> Result<(), AuthRejection> {
        let session = auth
            .and_then(RequestAuth::session)
            .ok_or(AuthorizationError::NoSession)?;
        self.validator
            .validate(session.provider(), &self.app_name, &self.app_domains)
            .map_err(|err| {
                warn!(
                    app = %self.app_name,
                    provider = session.provider(),
                    allowed = ?err.allowed_providers(),
                    "provider not allowed"
                );
                AuthRejection::from(err)
            })?;
        debug!(app = %self.app_name, provider = session.provider(), "provider allowed");
        Ok(())
    }
}

/// Middleware requiring a session whose provider is allowed for the app.
///
/// # Errors
///
/// See [`ProviderGate::check`].
pub async fn require_allowed_provider(
    State(gate): State<ProviderGate>,
    request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    gate.check(request.extensions().get::<RequestAuth>())?;
    Ok(next.run(request).await)
}

/// Middleware that checks the provider only when the request carries a
/// session with a known provider. Requests admitted by API key, and
/// sessions without a provider, pass through unchanged.
pub async fn check_session_provider(
    State(gate): State<ProviderGate>,
    request: Request,
    next: Next,
) -> Response {
    let provider = request
        .extensions()
        .get::<RequestAuth>()
        .map(RequestAuth::provider)
        .unwrap_or_default();
    if !provider.is_empty()
        && let Err(err) = gate
            .validator
            .validate(provider, &gate.app_name, &gate.app_domains)
    {
        warn!(app = %gate.app_name, provider, "provider not allowed");
        return (StatusCode::FORBIDDEN, format!("Access denied: {err}")).into_response();
    }
    next.run(request).await
}
