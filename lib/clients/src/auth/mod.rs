//! Client for the central auth service.
//!
//! Almost every call forwards the end user's raw `Cookie` header so the auth
//! service sees the same session the browser presented. The recovery calls
//! are the exception: they exist for users who are locked out and have no
//! usable session.

pub mod types;

use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{Method, Response};
use rootcause::prelude::Report;
use std::time::Duration;
use tracing::instrument;

use crate::error::ClientError;
use crate::http::{DEFAULT_TIMEOUT, ServiceHttp, Upstream, encode_segment};

pub use types::*;

const HX_REDIRECT: &str = "hx-redirect";

#[derive(Debug, Clone)]
pub struct AuthClient {
    http: ServiceHttp,
}

impl AuthClient {
    /// Creates a client for `base_url` with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Report<ClientError>> {
        Ok(Self {
            http: ServiceHttp::new(base_url, timeout)?,
        })
    }

    /// Creates a client with the default timeout.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn with_default_timeout(base_url: &str) -> Result<Self, Report<ClientError>> {
        Self::new(base_url, DEFAULT_TIMEOUT)
    }

    /// Wraps an existing `reqwest::Client`. It should not follow redirects.
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

    /// `GET /api/session`: checks the session carried by `cookies`.
    ///
    /// An invalid session is not an error; inspect `body.valid`.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    #[instrument(skip_all)]
    pub async fn validate_session(
        &self,
        cookies: &str,
    ) -> Result<Upstream<SessionResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/session";
        let request = self.http.request(Method::GET, ENDPOINT, cookies);
        self.http.json(ENDPOINT, request).await
    }

    /// `POST /api/session`: deletes one session by ID.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn delete_session(
        &self,
        cookies: &str,
        session_id: &str,
    ) -> Result<Upstream<DeleteSessionResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/session";
        let request = self
            .http
            .request(Method::POST, ENDPOINT, cookies)
            .json(&DeleteSessionRequest {
                session_id: session_id.to_string(),
            });
        self.http.json(ENDPOINT, request).await
    }

    /// `DELETE /api/session`: signs the user out everywhere.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn delete_all_sessions(
        &self,
        cookies: &str,
    ) -> Result<Upstream<DeleteSessionResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/session";
        let request = self.http.request(Method::DELETE, ENDPOINT, cookies);
        self.http.json(ENDPOINT, request).await
    }

    /// `GET /api/2fa`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn two_factor_status(
        &self,
        cookies: &str,
    ) -> Result<Upstream<TwoFactorStatusResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/2fa";
        let request = self.http.request(Method::GET, ENDPOINT, cookies);
        self.http.json(ENDPOINT, request).await
    }

    /// `POST /api/2fa`: checks a session that is still waiting on its second factor.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn check_pending_session(
        &self,
        cookies: &str,
    ) -> Result<Upstream<PendingSessionResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/2fa";
        let request = self.http.request(Method::POST, ENDPOINT, cookies);
        self.http.json(ENDPOINT, request).await
    }

    /// `DELETE /api/2fa`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn delete_two_factor(
        &self,
        cookies: &str,
    ) -> Result<Upstream<DeleteSessionResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/2fa";
        let request = self.http.request(Method::DELETE, ENDPOINT, cookies);
        self.http.json(ENDPOINT, request).await
    }

    /// `POST /api/2fa/lockout`: records a failed attempt and returns the
    /// lock duration in seconds.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn lockout_user(
        &self,
        cookies: &str,
        user_id: &str,
    ) -> Result<Upstream<LockoutResponse>, Report<ClientError>> {
        self.check_lockout(
            cookies,
            &LockoutRequest {
                user_id: user_id.to_string(),
            },
        )
        .await
    }

    /// `POST /api/2fa/lockout` with a caller-built body.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn check_lockout(
        &self,
        cookies: &str,
        body: &LockoutRequest,
    ) -> Result<Upstream<LockoutResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/2fa/lockout";
        let request = self
            .http
            .request(Method::POST, ENDPOINT, cookies)
            .json(body);
        self.http.json(ENDPOINT, request).await
    }

    /// `GET /api/2fa/lockout`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn lockout_status(
        &self,
        cookies: &str,
    ) -> Result<Upstream<LockoutStatusResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/2fa/lockout";
        let request = self.http.request(Method::GET, ENDPOINT, cookies);
        self.http.json(ENDPOINT, request).await
    }

    /// `DELETE /api/2fa/lockout`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn clear_lockout(
        &self,
        cookies: &str,
    ) -> Result<Upstream<OutcomeResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/2fa/lockout";
        let request = self.http.request(Method::DELETE, ENDPOINT, cookies);
        self.http.json(ENDPOINT, request).await
    }

    /// `POST /api/2fa/configure`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn configure_two_factor(
        &self,
        cookies: &str,
        body: &ConfigureTwoFactorRequest,
    ) -> Result<Upstream<OutcomeResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/2fa/configure";
        let request = self
            .http
            .request(Method::POST, ENDPOINT, cookies)
            .json(body);
        self.http.json(ENDPOINT, request).await
    }

    /// `POST /api/2fa/verify`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn verify_two_factor(
        &self,
        cookies: &str,
        body: &VerifyTwoFactorRequest,
    ) -> Result<Upstream<VerifyTwoFactorResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/2fa/verify";
        let request = self
            .http
            .request(Method::POST, ENDPOINT, cookies)
            .json(body);
        self.http.json(ENDPOINT, request).await
    }

    /// `POST /api/2fa/reset`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn reset_two_factor(
        &self,
        cookies: &str,
        body: &ResetTwoFactorRequest,
    ) -> Result<Upstream<OutcomeResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/2fa/reset";
        let request = self
            .http
            .request(Method::POST, ENDPOINT, cookies)
            .json(body);
        self.http.json(ENDPOINT, request).await
    }

    /// `POST /api/2fa/backup-codes`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn generate_backup_codes(
        &self,
        cookies: &str,
        body: &GenerateBackupCodesRequest,
    ) -> Result<Upstream<GenerateBackupCodesResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/2fa/backup-codes";
        let request = self
            .http
            .request(Method::POST, ENDPOINT, cookies)
            .json(body);
        self.http.json(ENDPOINT, request).await
    }

    /// `GET /api/2fa/trusted-device`
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn check_trusted_device(
        &self,
        cookies: &str,
    ) -> Result<Upstream<TrustedDeviceResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/2fa/trusted-device";
        let request = self.http.request(Method::GET, ENDPOINT, cookies);
        self.http.json(ENDPOINT, request).await
    }

    /// `POST /api/2fa/recovery`. Sent without cookies.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn initiate_recovery(
        &self,
        body: &InitiateRecoveryRequest,
    ) -> Result<Upstream<OutcomeResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/2fa/recovery";
        let request = self.http.request(Method::POST, ENDPOINT, "").json(body);
        self.http.json(ENDPOINT, request).await
    }

    /// `POST /api/2fa/recovery/verify`. Sent without cookies.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn verify_recovery_code(
        &self,
        body: &VerifyRecoveryCodeRequest,
    ) -> Result<Upstream<VerifyRecoveryCodeResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/2fa/recovery/verify";
        let request = self.http.request(Method::POST, ENDPOINT, "").json(body);
        self.http.json(ENDPOINT, request).await
    }

    /// `GET /auth?provider=..&next=..`: starts a login.
    ///
    /// Returns the redirect target from `hx-redirect` or `Location`, or the
    /// response body when there is neither.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an unreadable body.
    pub async fn auth_flow(
        &self,
        cookies: &str,
        provider: &str,
        next: &str,
    ) -> Result<Upstream<String>, Report<ClientError>> {
        const ENDPOINT: &str = "/auth";
        let request = self
            .http
            .request(Method::GET, ENDPOINT, cookies)
            .query(&[("provider", provider), ("next", next)]);
        let response = self.http.send(ENDPOINT, request).await?;
        if let Some(target) =
            redirect_target(response.headers(), &[HX_REDIRECT, LOCATION.as_str()])
        {
            return Ok(Upstream {
                status: response.status(),
                body: target,
            });
        }
        read_text(ENDPOINT, response).await
    }

    /// `POST /auth/{provider}?next=..` with a URL-encoded form; returns the
    /// response body as text.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an unreadable body.
    pub async fn auth(
        &self,
        cookies: &str,
        provider: &str,
        next: &str,
        form: &[(String, String)],
    ) -> Result<Upstream<String>, Report<ClientError>> {
        let endpoint = format!("/auth/{}", encode_segment(provider));
        let request = self
            .http
            .request(Method::POST, &endpoint, cookies)
            .query(&[("next", next)])
            .form(form);
        self.http.text(&endpoint, request).await
    }

    /// `GET /auth/{provider}/callback?..`: completes a login and returns the
    /// redirect target from `Location` or `hx-redirect`.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, or with [`ClientError::MissingRedirect`]
    /// when the response carries neither header.
    pub async fn auth_callback(
        &self,
        cookies: &str,
        provider: &str,
        query: &[(String, String)],
    ) -> Result<Upstream<String>, Report<ClientError>> {
        let endpoint = format!("/auth/{}/callback", encode_segment(provider));
        let request = self
            .http
            .request(Method::GET, &endpoint, cookies)
            .query(query);
        let response = self.http.send(&endpoint, request).await?;
        let status = response.status();
        match redirect_target(response.headers(), &[LOCATION.as_str(), HX_REDIRECT]) {
            Some(target) => Ok(Upstream {
                status,
                body: target,
            }),
            None => Err(ClientError::MissingRedirect { endpoint, status }.into()),
        }
    }
}

fn redirect_target(headers: &HeaderMap, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

async fn read_text(
    endpoint: &str,
    response: Response,
) -> Result<Upstream<String>, Report<ClientError>> {
    let status = response.status();
    let body = response.text().await.map_err(|e| ClientError::Decode {
        endpoint: endpoint.to_string(),
        status,
        details: e.to_string(),
    })?;
    Ok(Upstream { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> AuthClient {
        AuthClient::with_default_timeout(&server.uri()).expect("client")
    }

    #[tokio::test]
    async fn validate_session_forwards_cookies_and_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/session"))
            .and(header("cookie", "session=abc; theme=dark"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "valid": true,
                "user_id": "u_1",
                "provider": "google"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let upstream = client(&server)
            .validate_session("session=abc; theme=dark")
            .await
            .expect("validate");
        assert_eq!(upstream.status, StatusCode::OK);
        assert!(upstream.body.valid);
        assert_eq!(upstream.body.user_id, "u_1");
        assert_eq!(upstream.body.provider, "google");
    }

    #[tokio::test]
    async fn invalid_session_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/session"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"valid": false, "error": "expired"})),
            )
            .mount(&server)
            .await;

        let upstream = client(&server).validate_session("").await.expect("decoded");
        assert_eq!(upstream.status, StatusCode::UNAUTHORIZED);
        assert!(!upstream.body.valid);
        assert_eq!(upstream.body.error, "expired");
    }

    #[tokio::test]
    async fn undecodable_body_keeps_upstream_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/session"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let err = client(&server).validate_session("").await.unwrap_err();
        assert_eq!(err.current_context().status(), Some(StatusCode::BAD_GATEWAY));
    }

    #[tokio::test]
    async fn unreachable_service_has_no_status() {
        let client = AuthClient::with_default_timeout("http://127.0.0.1:1").expect("client");
        let err = client.validate_session("session=abc").await.unwrap_err();
        assert_eq!(err.current_context().status(), None);
        assert_eq!(
            err.current_context().status_or_internal(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn delete_session_posts_session_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/session"))
            .and(body_json(serde_json::json!({"session_id": "s_9"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "deleted"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let upstream = client(&server)
            .delete_session("session=abc", "s_9")
            .await
            .expect("delete");
        assert_eq!(upstream.body.message, "deleted");
    }

    #[tokio::test]
    async fn recovery_calls_send_no_cookies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/2fa/recovery/verify"))
            .and(body_json(serde_json::json!({
                "email": "a@b.com",
                "recovery_code": "123456"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "message": "ok",
                "access_token": "tok"
            })))
            .mount(&server)
            .await;

        let upstream = client(&server)
            .verify_recovery_code(&VerifyRecoveryCodeRequest {
                email: "a@b.com".to_string(),
                recovery_code: "123456".to_string(),
            })
            .await
            .expect("verify");
        assert_eq!(upstream.body.access_token, "tok");

        let requests = server.received_requests().await.expect("recorded");
        assert!(requests[0].headers.get("cookie").is_none());
    }

    #[tokio::test]
    async fn auth_flow_prefers_hx_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth"))
            .and(query_param("provider", "github"))
            .and(query_param("next", "https://files.hstles.com/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("hx-redirect", "https://github.com/login/oauth")
                    .set_body_string("ignored"),
            )
            .mount(&server)
            .await;

        let upstream = client(&server)
            .auth_flow("", "github", "https://files.hstles.com/")
            .await
            .expect("flow");
        assert_eq!(upstream.body, "https://github.com/login/oauth");
    }

    #[tokio::test]
    async fn auth_flow_falls_back_to_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<form>login</form>"))
            .mount(&server)
            .await;

        let upstream = client(&server)
            .auth_flow("", "email", "")
            .await
            .expect("flow");
        assert_eq!(upstream.body, "<form>login</form>");
    }

    #[tokio::test]
    async fn auth_callback_relays_location_without_following_it() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/google/callback"))
            .and(query_param("code", "xyz"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", "https://services.hstles.com/"),
            )
            .mount(&server)
            .await;

        let upstream = client(&server)
            .auth_callback("", "google", &[("code".to_string(), "xyz".to_string())])
            .await
            .expect("callback");
        assert_eq!(upstream.status, StatusCode::FOUND);
        assert_eq!(upstream.body, "https://services.hstles.com/");
    }

    #[tokio::test]
    async fn provider_stays_one_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        client(&server)
            .auth("session=abc", "../api/session", "", &[])
            .await
            .expect("auth");
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.path(), "/auth/..%2Fapi%2Fsession");
    }

    #[tokio::test]
    async fn auth_callback_without_redirect_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/google/callback"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let err = client(&server)
            .auth_callback("", "google", &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err.current_context(),
            ClientError::MissingRedirect { .. }
        ));
        assert_eq!(err.current_context().status(), Some(StatusCode::BAD_REQUEST));
    }
}
