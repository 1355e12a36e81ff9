//! Notify service endpoints. Sending email is reserved for other services.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use hstles_clients::notify::EmailKind;
use hstles_platform_access::RequestAuth;
use tracing::info;

use super::{json_body, relay};
use crate::state::GatewayState;

pub fn service_routes() -> Router<GatewayState> {
    Router::new()
        .route("/api/email/status", get(status))
        .route("/api/email/{kind}", post(send_email))
}

async fn status(State(state): State<GatewayState>) -> Response {
    relay(state.notify.status().await)
}

/// Forwards the payload unchanged to `/api/email/{kind}` on the notify
/// service, which owns validation of the template fields.
async fn send_email(
    State(state): State<GatewayState>,
    Extension(auth): Extension<RequestAuth>,
    Path(kind): Path<String>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Response {
    let Some(kind) = EmailKind::from_slug(&kind) else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("unknown email type '{kind}'") })),
        )
            .into_response();
    };
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    info!(
        email = %kind,
        service = auth.service_name().unwrap_or_default(),
        "sending email"
    );
    relay(state.notify.send(kind, &body).await)
}
