//! Shared request plumbing for the service clients.

use reqwest::header::COOKIE;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use rootcause::prelude::Report;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::ClientError;

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A decoded upstream response and the status code it arrived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream<T> {
    pub status: StatusCode,
    pub body: T,
}

impl<T> Upstream<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Upstream<U> {
        Upstream {
            status: self.status,
            body: f(self.body),
        }
    }
}

/// Trims trailing slashes and prepends `https://` when no scheme is given.
#[must_use]
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ServiceHttp {
    base_url: String,
    http: reqwest::Client,
}

impl ServiceHttp {
    /// Builds a client. Redirects are never followed so callers can relay
    /// `Location` headers from login flows.
    pub(crate) fn new(base_url: &str, timeout: Duration) -> Result<Self, Report<ClientError>> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ClientError::Build {
                details: e.to_string(),
            })?;
        Ok(Self::with_http_client(base_url, http))
    }

    pub(crate) fn with_http_client(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            http,
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Starts a request to `path`, forwarding the caller's raw `Cookie`
    /// header when one is given.
    pub(crate) fn request(&self, method: Method, path: &str, cookies: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if cookies.is_empty() {
            builder
        } else {
            builder.header(COOKIE, cookies)
        }
    }

    #[instrument(skip(self, builder), fields(base_url = %self.base_url))]
    pub(crate) async fn send(
        &self,
        endpoint: &str,
        builder: RequestBuilder,
    ) -> Result<Response, Report<ClientError>> {
        let response = builder.send().await.map_err(|e| ClientError::Transport {
            endpoint: endpoint.to_string(),
            details: e.to_string(),
        })?;
        debug!(endpoint, status = %response.status(), "upstream responded");
        Ok(response)
    }

    /// Sends the request and decodes a JSON body, whatever the status code.
    pub(crate) async fn json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        builder: RequestBuilder,
    ) -> Result<Upstream<T>, Report<ClientError>> {
        let response = self.send(endpoint, builder).await?;
        decode(endpoint, response).await
    }

    /// Sends the request and returns the body as text.
    pub(crate) async fn text(
        &self,
        endpoint: &str,
        builder: RequestBuilder,
    ) -> Result<Upstream<String>, Report<ClientError>> {
        let response = self.send(endpoint, builder).await?;
        let status = response.status();
        let body = response.text().await.map_err(|e| ClientError::Decode {
            endpoint: endpoint.to_string(),
            status,
            details: e.to_string(),
        })?;
        Ok(Upstream { status, body })
    }
}

/// Percent-encodes `segment` so it stays a single path segment upstream.
pub(crate) fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

pub(crate) async fn decode<T: DeserializeOwned>(
    endpoint: &str,
    response: Response,
) -> Result<Upstream<T>, Report<ClientError>> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(|e| ClientError::Decode {
        endpoint: endpoint.to_string(),
        status,
        details: e.to_string(),
    })?;
    let body = serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
        endpoint: endpoint.to_string(),
        status,
        details: e.to_string(),
    })?;
    Ok(Upstream { status, body })
}
