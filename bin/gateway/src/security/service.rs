//! API-key authentication for service-to-service calls.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use hstles_platform_access::{
    API_KEY_HEADER, ApiKeyTable, AuthenticationError, RequestAuth, ServicePrincipal,
};
use std::sync::Arc;
use tracing::{info, warn};

use super::AuthRejection;
use crate::helpers::{request_client_ip, user_agent};

/// Resolves the `X-API-Key` header against the configured key table.
#[derive(Debug, Clone)]
pub struct ServiceAuthValidator {
    keys: Arc<ApiKeyTable>,
}

impl ServiceAuthValidator {
    #[must_use]
    pub fn new(keys: Arc<ApiKeyTable>) -> Self {
        Self { keys }
    }

    /// Whether a request carries a non-empty `X-API-Key` header, readable
    /// or not.
    #[must_use]
    pub fn has_key_header(headers: &HeaderMap) -> bool {
        headers
            .get(API_KEY_HEADER)
            .is_some_and(|value| !value.as_bytes().is_empty())
    }

    /// Returns the API key presented on a request.
    ///
    /// # Errors
    ///
    /// [`AuthenticationError::MissingApiKey`] when the header is absent or
    /// empty, [`AuthenticationError::InvalidApiKey`] when its value is not
    /// visible ASCII.
    pub fn presented_key(headers: &HeaderMap) -> Result<&str, AuthenticationError> {
        let value = headers
            .get(API_KEY_HEADER)
            .filter(|value| !value.as_bytes().is_empty())
            .ok_or(AuthenticationError::MissingApiKey)?;
        value
            .to_str()
            .map_err(|_| AuthenticationError::InvalidApiKey)
    }

    /// Resolves a presented key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::InvalidApiKey`] when no service owns it.
    pub fn resolve(&self, presented: &str) -> Result<ServicePrincipal, AuthenticationError> {
        self.keys
            .resolve(presented)
            .ok_or(AuthenticationError::InvalidApiKey)
    }

    /// Validates the key in `headers`, logging the outcome for audit.
    /// `caller` is the client address, logged on failure.
    pub(crate) fn authenticate(
        &self,
        headers: &HeaderMap,
        caller: &str,
        path: &str,
    ) -> Result<ServicePrincipal, AuthenticationError> {
        match Self::presented_key(headers).and_then(|presented| self.resolve(presented)) {
            Ok(principal) => {
                info!(service = principal.service_name(), path, "service-to-service call");
                Ok(principal)
            }
            Err(AuthenticationError::MissingApiKey) => Err(AuthenticationError::MissingApiKey),
            Err(err) => {
                warn!(
                    caller,
                    user_agent = user_agent(headers),
                    path,
                    "invalid API key attempt"
                );
                Err(err)
            }
        }
    }
}

/// Middleware admitting only requests with a configured API key.
///
/// # Errors
///
/// Rejects with 401 when the header is missing or the key is unknown.
pub async fn require_api_key(
    State(validator): State<ServiceAuthValidator>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let caller = request_client_ip(&request);
    let principal = validator.authenticate(request.headers(), &caller, request.uri().path())?;
    request
        .extensions_mut()
        .insert(RequestAuth::from_service(principal));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::routing::get;
    use axum::{Extension, Router, middleware};
    use tower::ServiceExt;

    fn app() -> Router {
        let keys = ApiKeyTable::from_pairs([("notify", "notify-key"), ("auth", "auth-key")]);
        Router::new()
            .route(
                "/internal",
                get(|Extension(auth): Extension<RequestAuth>| async move {
                    format!(
                        "{}:{}",
                        auth.auth_type_str(),
                        auth.service_name().unwrap_or_default()
                    )
                }),
            )
            .route_layer(middleware::from_fn_with_state(
                ServiceAuthValidator::new(Arc::new(keys)),
                require_api_key,
            ))
    }

    async fn call(key: Option<&str>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri("/internal");
        if let Some(key) = key {
            builder = builder.header("X-API-Key", key);
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn configured_key_attaches_service_principal() {
        let (status, body) = call(Some("notify-key")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "service:notify");
    }

    #[tokio::test]
    async fn unknown_key_is_unauthorized() {
        let (status, body) = call(Some("guess")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Invalid API key");
    }

    #[tokio::test]
    async fn missing_key_is_unauthorized() {
        let (status, body) = call(None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "API key required");
    }

    #[tokio::test]
    async fn empty_key_counts_as_missing() {
        let (status, body) = call(Some("")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "API key required");
    }

    #[test]
    fn unreadable_key_is_invalid_not_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            axum::http::HeaderValue::from_bytes(b"bad\xffkey").unwrap(),
        );
        assert!(ServiceAuthValidator::has_key_header(&headers));
        assert_eq!(
            ServiceAuthValidator::presented_key(&headers),
            Err(AuthenticationError::InvalidApiKey)
        );
    }
}
