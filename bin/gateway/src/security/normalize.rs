//! Case-insensitive routing.
//!
//! Paths are lowercased before routing so `/API/Session` reaches the
//! `/api/session` handler. The query string is left untouched. This has to
//! run in front of the router (see [`crate::serve_app`]), since a router
//! layer only sees requests that already matched a route.

use axum::extract::Request;
use axum::http::Uri;
use axum::http::uri::PathAndQuery;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

/// Returns `uri` with its path lowercased, or `None` when it is already
/// lowercase.
#[must_use]
pub fn lowercase_path(uri: &Uri) -> Option<Uri> {
    let path = uri.path();
    if !path.bytes().any(|b| b.is_ascii_uppercase()) {
        return None;
    }
    let lowered = match uri.query() {
        Some(query) => format!("{}?{query}", path.to_ascii_lowercase()),
        None => path.to_ascii_lowercase(),
    };
    let path_and_query = PathAndQuery::try_from(lowered).ok()?;
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    Uri::from_parts(parts).ok()
}

pub async fn normalize_path(mut request: Request, next: Next) -> Response {
    if let Some(uri) = lowercase_path(request.uri()) {
        debug!(from = %request.uri(), to = %uri, "normalized request path");
        *request.uri_mut() = uri;
    }
    next.run(request).await
}
