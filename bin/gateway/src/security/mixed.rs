//! Endpoints that accept either a service API key or a user session.
//!
//! The presence of an `X-API-Key` header decides the path outright: the key
//! is checked and nothing else. A request with an invalid key is refused
//! even if it also carries a valid session cookie. Only requests without the
//! header are checked as sessions.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use hstles_platform_access::{AuthenticationError, RequestAuth};
use tracing::debug;

use super::{AuthRejection, ServiceAuthValidator, SessionValidator};
use crate::helpers::request_client_ip;

#[derive(Debug, Clone)]
pub struct MixedAuthValidator {
    session: SessionValidator,
    service: ServiceAuthValidator,
}

impl MixedAuthValidator {
    #[must_use]
    pub fn new(session: SessionValidator, service: ServiceAuthValidator) -> Self {
        Self { session, service }
    }

    /// Authenticates by API key when one is presented in `headers`,
    /// otherwise by session.
    ///
    /// # Errors
    ///
    /// Any failure is reported as a rejected credential (401).
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
        caller: &str,
        path: &str,
    ) -> Result<RequestAuth, AuthenticationError> {
        if ServiceAuthValidator::has_key_header(headers) {
            return self
                .service
                .authenticate(headers, caller, path)
                .map(RequestAuth::from_service)
                .map_err(|_| AuthenticationError::InvalidApiKey);
        }

        match self.session.validate(headers).await {
            Ok(principal) => Ok(RequestAuth::from_session(principal)),
            Err(err) => {
                debug!(error = %err, "mixed auth: session not accepted");
                Err(AuthenticationError::SessionRejected)
            }
        }
    }
}

/// Middleware admitting requests with either a valid API key or a valid
/// session.
///
/// # Errors
///
/// Rejects with 401 when the presented credential is not accepted.
pub async fn require_key_or_session(
    State(validator): State<MixedAuthValidator>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let caller = request_client_ip(&request);
    let path = request.uri().path().to_string();
    let auth = validator
        .authenticate(request.headers(), &caller, &path)
        .await?;
    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, Request as HttpRequest, StatusCode};
    use axum::routing::get;
    use axum::{Extension, Router, middleware};
    use hstles_clients::AuthClient;
    use hstles_platform_access::ApiKeyTable;
    use std::sync::Arc;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn valid_session_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "valid": true,
                "user_id": "u_1",
                "provider": "google"
            })))
            .mount(&server)
            .await;
        server
    }

    fn app(auth_url: &str) -> Router {
        let session =
            SessionValidator::new(AuthClient::with_default_timeout(auth_url).expect("client"));
        let service = ServiceAuthValidator::new(Arc::new(ApiKeyTable::from_pairs([(
            "account",
            "account-key",
        )])));
        Router::new()
            .route(
                "/whoami",
                get(|Extension(auth): Extension<RequestAuth>| async move {
                    auth.auth_type_str().to_string()
                }),
            )
            .route_layer(middleware::from_fn_with_state(
                MixedAuthValidator::new(session, service),
                require_key_or_session,
            ))
    }

    async fn call(app: Router, key: Option<&str>, cookie: Option<&str>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri("/whoami");
        if let Some(key) = key {
            builder = builder.header("X-API-Key", key);
        }
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let response = app
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
    async fn valid_key_is_enough_without_session() {
        let server = MockServer::start().await;
        let (status, body) = call(app(&server.uri()), Some("account-key"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "service");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn session_is_used_when_no_key_is_presented() {
        let server = valid_session_server().await;
        let (status, body) = call(app(&server.uri()), None, Some("session=abc")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "session");
    }

    #[tokio::test]
    async fn invalid_key_is_not_retried_as_session() {
        let server = valid_session_server().await;
        let (status, _) = call(app(&server.uri()), Some("wrong"), Some("session=abc")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_key_is_not_retried_as_session() {
        let server = valid_session_server().await;
        let request = HttpRequest::builder()
            .uri("/whoami")
            .header("X-API-Key", HeaderValue::from_bytes(b"bad\xffkey").unwrap())
            .header("cookie", "session=abc")
            .body(Body::empty())
            .unwrap();
        let response = app(&server.uri()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_auth_service_is_unauthorized() {
        let (status, body) = call(app("http://127.0.0.1:1"), None, Some("session=abc")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Unauthorized");
    }
}
