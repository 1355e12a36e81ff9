//! Response headers applied to every route: CORS for the parent-domain
//! family and a Content-Security-Policy.

use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_SECURITY_POLICY, ORIGIN,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use hstles_platform_access::origin::{
    ALLOWED_HEADERS, ALLOWED_METHODS, content_security_policy, is_allowed_origin,
};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    parent_domain: Arc<str>,
    csp: Option<HeaderValue>,
}

impl SecurityHeaders {
    #[must_use]
    pub fn new(parent_domain: &str) -> Self {
        let csp = HeaderValue::from_str(&content_security_policy(parent_domain))
            .inspect_err(|err| warn!(error = %err, parent_domain, "unusable CSP header"))
            .ok();
        Self {
            parent_domain: Arc::from(parent_domain),
            csp,
        }
    }

    #[must_use]
    pub fn parent_domain(&self) -> &str {
        &self.parent_domain
    }

    /// Adds the CORS grant (when `origin` belongs to the family) and the CSP.
    pub fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        let allowed = origin
            .filter(|value| {
                value
                    .to_str()
                    .is_ok_and(|origin| is_allowed_origin(origin, &self.parent_domain))
            })
            .cloned();
        if let Some(origin) = allowed {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
            headers.insert(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOWED_METHODS),
            );
            headers.insert(
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOWED_HEADERS),
            );
        }
        if let Some(csp) = &self.csp {
            headers.insert(CONTENT_SECURITY_POLICY, csp.clone());
        }
    }
}

/// Middleware setting security headers. Preflight `OPTIONS` requests are
/// answered with 200 and never reach a handler.
pub async fn security_headers(
    State(policy): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request.headers().get(ORIGIN).cloned();

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };
    policy.apply(origin.as_ref(), response.headers_mut());
    response
}
