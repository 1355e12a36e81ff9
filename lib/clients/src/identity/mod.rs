//! Client for the identity service.
//!
//! The identity service exposes three surfaces: public (health, plans),
//! service (authenticated with an `X-API-Key` header), and protected
//! (authenticated by the end user's forwarded session cookies).

pub mod types;

use reqwest::{Method, RequestBuilder};
use rootcause::prelude::Report;
use std::time::Duration;

use crate::error::ClientError;
use crate::http::{DEFAULT_TIMEOUT, ServiceHttp, Upstream, encode_segment};

pub use types::*;

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: ServiceHttp,
}

impl IdentityClient {
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Report<ClientError>> {
        Ok(Self {
            http: ServiceHttp::new(base_url, timeout)?,
        })
    }

    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn with_default_timeout(base_url: &str) -> Result<Self, Report<ClientError>> {
        Self::new(base_url, DEFAULT_TIMEOUT)
    }

    #[must_use]
    pub fn with_http_client(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            http: ServiceHttp::with_http_client(base_url, http),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    fn service_request(&self, method: Method, path: &str, api_key: &str) -> RequestBuilder {
        self.http
            .request(method, path, "")
            .header(API_KEY_HEADER, api_key)
    }

    // Public

    /// `GET /api/health`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn health(&self) -> Result<Upstream<HealthResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/health";
        let request = self.http.request(Method::GET, ENDPOINT, "");
        self.http.json(ENDPOINT, request).await
    }

    /// `GET /heartbeat`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn heartbeat(&self) -> Result<Upstream<HeartbeatResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/heartbeat";
        let request = self.http.request(Method::GET, ENDPOINT, "");
        self.http.json(ENDPOINT, request).await
    }

    /// `GET /api/plans`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn list_plans(&self) -> Result<Upstream<Vec<Plan>>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/plans";
        let request = self.http.request(Method::GET, ENDPOINT, "");
        self.http.json(ENDPOINT, request).await
    }

    /// `GET /api/plans/{id}`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn get_plan(&self, plan_id: &str) -> Result<Upstream<Plan>, Report<ClientError>> {
        let endpoint = format!("/api/plans/{}", encode_segment(plan_id));
        let request = self.http.request(Method::GET, &endpoint, "");
        self.http.json(&endpoint, request).await
    }

    // Service API

    /// `GET /api/users/email/{email}` with a service API key.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn user_by_email(
        &self,
        api_key: &str,
        email: &str,
    ) -> Result<Upstream<User>, Report<ClientError>> {
        let endpoint = format!("/api/users/email/{}", encode_segment(email));
        let request = self.service_request(Method::GET, &endpoint, api_key);
        self.http.json(&endpoint, request).await
    }

    /// `GET /api/users/{id}` with a service API key.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn user_by_id(
        &self,
        api_key: &str,
        user_id: &str,
    ) -> Result<Upstream<User>, Report<ClientError>> {
        let endpoint = format!("/api/users/{}", encode_segment(user_id));
        let request = self.service_request(Method::GET, &endpoint, api_key);
        self.http.json(&endpoint, request).await
    }

    /// `POST /api/users` with a service API key.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn create_user(
        &self,
        api_key: &str,
        body: &CreateUserRequest,
    ) -> Result<Upstream<User>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/users";
        let request = self
            .service_request(Method::POST, ENDPOINT, api_key)
            .json(body);
        self.http.json(ENDPOINT, request).await
    }

    /// `POST /api/events` with a service API key.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn create_event(
        &self,
        api_key: &str,
        body: &CreateEventRequest,
    ) -> Result<Upstream<Event>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/events";
        let request = self
            .service_request(Method::POST, ENDPOINT, api_key)
            .json(body);
        self.http.json(ENDPOINT, request).await
    }

    // Protected API

    /// `GET /api/users`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn list_users(
        &self,
        cookies: &str,
    ) -> Result<Upstream<Vec<User>>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/users";
        let request = self.http.request(Method::GET, ENDPOINT, cookies);
        self.http.json(ENDPOINT, request).await
    }

    /// `GET /api/users/{id}`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn get_user(
        &self,
        cookies: &str,
        user_id: &str,
    ) -> Result<Upstream<User>, Report<ClientError>> {
        let endpoint = format!("/api/users/{}", encode_segment(user_id));
        let request = self.http.request(Method::GET, &endpoint, cookies);
        self.http.json(&endpoint, request).await
    }

    /// `GET /api/users/{id}/organisations`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn user_organisations(
        &self,
        cookies: &str,
        user_id: &str,
    ) -> Result<Upstream<Vec<Organisation>>, Report<ClientError>> {
        let endpoint = format!("/api/users/{}/organisations", encode_segment(user_id));
        let request = self.http.request(Method::GET, &endpoint, cookies);
        self.http.json(&endpoint, request).await
    }

    /// `GET /api/organisations`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn list_organisations(
        &self,
        cookies: &str,
    ) -> Result<Upstream<Vec<Organisation>>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/organisations";
        let request = self.http.request(Method::GET, ENDPOINT, cookies);
        self.http.json(ENDPOINT, request).await
    }

    /// `GET /api/organisations/{id}`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn get_organisation(
        &self,
        cookies: &str,
        organisation_id: &str,
    ) -> Result<Upstream<Organisation>, Report<ClientError>> {
        let endpoint = format!("/api/organisations/{}", encode_segment(organisation_id));
        let request = self.http.request(Method::GET, &endpoint, cookies);
        self.http.json(&endpoint, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> IdentityClient {
        IdentityClient::with_default_timeout(&server.uri()).expect("client")
    }

    #[tokio::test]
    async fn user_by_email_sends_api_key_and_escapes_email() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/email/a%2Bb%40example.com"))
            .and(header("X-API-Key", "identity-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "u_1",
                "email": "a+b@example.com",
                "active": true,
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-01T10:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let upstream = client(&server)
            .user_by_email("identity-key", "a+b@example.com")
            .await
            .expect("lookup");
        assert_eq!(upstream.body.id, "u_1");
        assert!(upstream.body.active);
    }

    #[tokio::test]
    async fn create_event_posts_wire_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/events"))
            .and(header("X-API-Key", "k"))
            .and(body_json(serde_json::json!({
                "user_id": "u_1",
                "type": "login",
                "description": "signed in"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "e_1",
                "user_id": "u_1",
                "type": "login",
                "description": "signed in",
                "created_at": "2024-05-01T10:00:00Z"
            })))
            .mount(&server)
            .await;

        let upstream = client(&server)
            .create_event(
                "k",
                &CreateEventRequest {
                    user_id: "u_1".to_string(),
                    event_type: "login".to_string(),
                    description: "signed in".to_string(),
                    metadata: String::new(),
                },
            )
            .await
            .expect("create");
        assert_eq!(upstream.status, StatusCode::CREATED);
        assert_eq!(upstream.body.event_type, "login");
    }

    #[tokio::test]
    async fn protected_calls_forward_cookies_not_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/organisations"))
            .and(header("cookie", "session=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "o_1", "name": "Acme", "active": true}
            ])))
            .mount(&server)
            .await;

        let upstream = client(&server)
            .list_organisations("session=abc")
            .await
            .expect("list");
        assert_eq!(upstream.body.len(), 1);
        assert_eq!(upstream.body[0].name, "Acme");

        let requests = server.received_requests().await.expect("recorded");
        assert!(requests[0].headers.get("x-api-key").is_none());
    }

    #[tokio::test]
    async fn error_body_surfaces_as_decode_error_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/plans"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(serde_json::json!({"error": "down"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).list_plans().await.unwrap_err();
        assert_eq!(
            err.current_context().status(),
            Some(StatusCode::SERVICE_UNAVAILABLE)
        );
    }

    #[test]
    fn segments_are_escaped() {
        assert_eq!(encode_segment("a b/c+d"), "a%20b%2Fc%2Bd");
    }
}
