//! Client for the notify (email) service.
//!
//! Every email endpoint answers with an [`EmailResponse`]. A response with
//! `success: false` is turned into [`ClientError::Backend`], so callers only
//! see `Ok` for mail the service accepted.

pub mod types;

use reqwest::Method;
use rootcause::prelude::Report;
use serde::Serialize;
use std::time::Duration;
use tracing::{instrument, warn};

use crate::error::ClientError;
use crate::http::{DEFAULT_TIMEOUT, ServiceHttp, Upstream};

pub use types::*;

#[derive(Debug, Clone)]
pub struct NotifyClient {
    http: ServiceHttp,
}

impl NotifyClient {
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

    /// `GET /api/email/status`. The body is returned as-is, even when it
    /// reports `success: false`.
    ///
    /// # Errors
    ///
    /// Fails on transport errors or an undecodable body.
    pub async fn status(&self) -> Result<Upstream<EmailResponse>, Report<ClientError>> {
        const ENDPOINT: &str = "/api/email/status";
        let request = self.http.request(Method::GET, ENDPOINT, "");
        self.http.json(ENDPOINT, request).await
    }

    /// Posts `payload` to `/api/email/{kind}`.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, an undecodable body, or a response with
    /// `success: false`.
    #[instrument(skip(self, payload))]
    pub async fn send<P: Serialize + ?Sized>(
        &self,
        kind: EmailKind,
        payload: &P,
    ) -> Result<Upstream<EmailResponse>, Report<ClientError>> {
        let endpoint = format!("/api/email/{}", kind.slug());
        let request = self
            .http
            .request(Method::POST, &endpoint, "")
            .json(payload);
        let upstream: Upstream<EmailResponse> = self.http.json(&endpoint, request).await?;
        if !upstream.body.success {
            warn!(
                email = %kind,
                status = %upstream.status,
                error = %upstream.body.error,
                "notify service rejected email"
            );
            return Err(ClientError::Backend {
                endpoint,
                status: upstream.status,
                message: upstream.body.error,
            }
            .into());
        }
        Ok(upstream)
    }

    /// # Errors
    ///
    /// See [`NotifyClient::send`].
    pub async fn send_welcome(
        &self,
        to: &str,
        user_name: &str,
    ) -> Result<Upstream<EmailResponse>, Report<ClientError>> {
        self.send(
            EmailKind::Welcome,
            &WelcomeEmailRequest {
                to: to.to_string(),
                user_name: user_name.to_string(),
            },
        )
        .await
    }

    /// # Errors
    ///
    /// See [`NotifyClient::send`].
    pub async fn send_security_code(
        &self,
        to: &str,
        code: &str,
    ) -> Result<Upstream<EmailResponse>, Report<ClientError>> {
        self.send(
            EmailKind::SecurityCode,
            &SecurityCodeEmailRequest {
                to: to.to_string(),
                code: code.to_string(),
            },
        )
        .await
    }

    /// # Errors
    ///
    /// See [`NotifyClient::send`].
    pub async fn send_recovery_code(
        &self,
        to: &str,
        user_name: &str,
        code: &str,
    ) -> Result<Upstream<EmailResponse>, Report<ClientError>> {
        self.send(
            EmailKind::RecoveryCode,
            &RecoveryCodeEmailRequest {
                to: to.to_string(),
                user_name: user_name.to_string(),
                code: code.to_string(),
            },
        )
        .await
    }

    /// # Errors
    ///
    /// See [`NotifyClient::send`].
    pub async fn send_service_alert(
        &self,
        to: &str,
        title: &str,
        message: &str,
    ) -> Result<Upstream<EmailResponse>, Report<ClientError>> {
        self.send(
            EmailKind::ServiceAlert,
            &ServiceAlertEmailRequest {
                to: to.to_string(),
                alert_title: title.to_string(),
                alert_message: message.to_string(),
            },
        )
        .await
    }

    /// # Errors
    ///
    /// See [`NotifyClient::send`].
    pub async fn send_login_link(
        &self,
        to: &str,
        link: &str,
        user_name: &str,
    ) -> Result<Upstream<EmailResponse>, Report<ClientError>> {
        self.send(
            EmailKind::LoginLink,
            &LoginLinkEmailRequest {
                to: to.to_string(),
                login_link: link.to_string(),
                user_name: user_name.to_string(),
            },
        )
        .await
    }

    /// # Errors
    ///
    /// See [`NotifyClient::send`].
    pub async fn send_generic(
        &self,
        to: &str,
        subject: &str,
        message: &str,
    ) -> Result<Upstream<EmailResponse>, Report<ClientError>> {
        self.send(
            EmailKind::Generic,
            &GenericEmailRequest {
                to: to.to_string(),
                subject: subject.to_string(),
                message: message.to_string(),
            },
        )
        .await
    }
}
