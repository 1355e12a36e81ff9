//! Route groups by trust tier.
//!
//! ```text
//! public     ── headers
//! protected  ── headers ─ session ─ [provider check]
//! service    ── headers ─ API key
//! mixed      ── headers ─ (whatever the caller layered on)
//! ```
//!
//! The headers layer wraps the merged router, so it runs first for every
//! request, including requests that match no route.

use axum::Router;
use axum::middleware;

use super::{
    MixedAuthValidator, ProviderGate, SecurityHeaders, ServiceAuthValidator, SessionValidator,
    check_session_provider, require_api_key, require_session, security_headers,
};

/// Collects routers per tier and layers each with its authentication.
#[derive(Debug)]
pub struct SecurityRoutes<S = ()> {
    session: SessionValidator,
    service_keys: ServiceAuthValidator,
    headers: SecurityHeaders,
    provider: Option<ProviderGate>,
    public: Router<S>,
    protected: Router<S>,
    service: Router<S>,
    mixed: Router<S>,
    has_protected: bool,
    has_service: bool,
}

impl<S> SecurityRoutes<S>
where
    S: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(
        session: SessionValidator,
        service_keys: ServiceAuthValidator,
        headers: SecurityHeaders,
    ) -> Self {
        Self {
            session,
            service_keys,
            headers,
            provider: None,
            public: Router::new(),
            protected: Router::new(),
            service: Router::new(),
            mixed: Router::new(),
            has_protected: false,
            has_service: false,
        }
    }

    /// Checks the session's provider on protected routes, after the session
    /// itself has been validated.
    #[must_use]
    pub fn with_provider_check(mut self, gate: ProviderGate) -> Self {
        self.provider = Some(gate);
        self
    }

    /// A validator for mixed routes sharing this composer's session and key
    /// configuration.
    #[must_use]
    pub fn mixed_auth(&self) -> MixedAuthValidator {
        MixedAuthValidator::new(self.session.clone(), self.service_keys.clone())
    }

    /// Routes open to anyone.
    #[must_use]
    pub fn public(mut self, routes: Router<S>) -> Self {
        self.public = self.public.merge(routes);
        self
    }

    /// Routes requiring a valid session.
    #[must_use]
    pub fn protected(mut self, routes: Router<S>) -> Self {
        self.protected = self.protected.merge(routes);
        self.has_protected = true;
        self
    }

    /// Routes requiring a service API key.
    #[must_use]
    pub fn service(mut self, routes: Router<S>) -> Self {
        self.service = self.service.merge(routes);
        self.has_service = true;
        self
    }

    /// Routes that bring their own authentication layers.
    #[must_use]
    pub fn mixed(mut self, routes: Router<S>) -> Self {
        self.mixed = self.mixed.merge(routes);
        self
    }

    #[must_use]
    pub fn into_router(self) -> Router<S> {
        let mut protected = self.protected;
        if self.has_protected {
            if let Some(gate) = self.provider {
                protected = protected
                    .route_layer(middleware::from_fn_with_state(gate, check_session_provider));
            }
            protected = protected.route_layer(middleware::from_fn_with_state(
                self.session,
                require_session,
            ));
        }

        let mut service = self.service;
        if self.has_service {
            service = service.route_layer(middleware::from_fn_with_state(
                self.service_keys,
                require_api_key,
            ));
        }

        Router::new()
            .merge(self.public)
            .merge(protected)
            .merge(service)
            .merge(self.mixed)
            .layer(middleware::from_fn_with_state(
                self.headers,
                security_headers,
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::require_key_or_session;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::routing::get;
    use hstles_clients::AuthClient;
    use hstles_core::AppRegistry;
    use hstles_platform_access::{ApiKeyTable, ProviderValidator};
    use std::sync::Arc;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn session_server(valid: bool, provider: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "valid": valid,
                "user_id": "u_1",
                "provider": provider
            })))
            .mount(&server)
            .await;
        server
    }

    fn composer(auth_url: &str) -> SecurityRoutes {
        let session =
            SessionValidator::new(AuthClient::with_default_timeout(auth_url).expect("client"));
        let keys = ServiceAuthValidator::new(Arc::new(ApiKeyTable::from_pairs([(
            "notify",
            "notify-key",
        )])));
        SecurityRoutes::new(session, keys, SecurityHeaders::new("hstles.com"))
    }

    fn router(routes: SecurityRoutes) -> Router {
        let mixed = Router::new()
            .route("/mixed", get(|| async { "mixed" }))
            .route_layer(middleware::from_fn_with_state(
                routes.mixed_auth(),
                require_key_or_session,
            ));
        routes
            .public(Router::new().route("/public", get(|| async { "public" })))
            .protected(Router::new().route("/protected", get(|| async { "protected" })))
            .service(Router::new().route("/service", get(|| async { "service" })))
            .mixed(mixed)
            .into_router()
    }

    async fn status(app: &Router, method: Method, uri: &str, key: Option<&str>) -> StatusCode {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("cookie", "session=abc");
        if let Some(key) = key {
            builder = builder.header("X-API-Key", key);
        }
        app.clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn each_tier_gets_its_own_authentication() {
        let server = session_server(false, "").await;
        let app = router(composer(&server.uri()));

        assert_eq!(status(&app, Method::GET, "/public", None).await, StatusCode::OK);
        assert_eq!(
            status(&app, Method::GET, "/protected", None).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(&app, Method::GET, "/service", None).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(&app, Method::GET, "/service", Some("notify-key")).await,
            StatusCode::OK
        );
        assert_eq!(
            status(&app, Method::GET, "/mixed", Some("notify-key")).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn valid_session_opens_protected_routes() {
        let server = session_server(true, "google").await;
        let app = router(composer(&server.uri()));
        assert_eq!(
            status(&app, Method::GET, "/protected", None).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn preflight_is_answered_before_authentication() {
        let server = MockServer::start().await;
        let app = router(composer(&server.uri()));
        assert_eq!(
            status(&app, Method::OPTIONS, "/protected", None).await,
            StatusCode::OK
        );
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_check_runs_after_session() {
        let server = session_server(true, "github").await;
        let registry = Arc::new(AppRegistry::standard().expect("registry"));
        let gate = ProviderGate::new(ProviderValidator::new(registry), "support", "");
        let app = router(composer(&server.uri()).with_provider_check(gate));
        assert_eq!(
            status(&app, Method::GET, "/protected", None).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(status(&app, Method::GET, "/public", None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn empty_tiers_are_allowed() {
        let server = MockServer::start().await;
        let app = composer(&server.uri())
            .public(Router::new().route("/public", get(|| async { "public" })))
            .into_router();
        assert_eq!(status(&app, Method::GET, "/public", None).await, StatusCode::OK);
    }
}
