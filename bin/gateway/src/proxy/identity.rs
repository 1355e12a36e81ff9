//! Identity service endpoints.
//!
//! Service-tier routes are called by other platform services; the gateway
//! forwards them to the identity service's API under its own key
//! (`IDENTITY_SERVICE_API_KEY`), never the caller's.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use hstles_clients::identity::{CreateEventRequest, CreateUserRequest};
use tracing::error;

use super::{json_body, relay};
use crate::security::forwarded_cookies;
use crate::state::GatewayState;

/// Health and plan catalogue.
pub fn public_routes() -> Router<GatewayState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/plans", get(list_plans))
        .route("/api/plans/{plan_id}", get(get_plan))
}

/// User and organisation reads on behalf of the signed-in user.
pub fn protected_routes() -> Router<GatewayState> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/{user_id}", get(get_user))
        .route(
            "/api/users/{user_id}/organisations",
            get(user_organisations),
        )
        .route("/api/organisations", get(list_organisations))
        .route("/api/organisations/{organisation_id}", get(get_organisation))
}

/// Identity service API for other services.
pub fn service_routes() -> Router<GatewayState> {
    Router::new()
        .route("/api/service/users", post(create_user))
        .route("/api/service/users/email/{email}", get(user_by_email))
        .route("/api/service/users/{user_id}", get(user_by_id))
        .route("/api/service/events", post(create_event))
}

async fn health(State(state): State<GatewayState>) -> Response {
    relay(state.identity.health().await)
}

async fn list_plans(State(state): State<GatewayState>) -> Response {
    relay(state.identity.list_plans().await)
}

async fn get_plan(State(state): State<GatewayState>, Path(plan_id): Path<String>) -> Response {
    relay(state.identity.get_plan(&plan_id).await)
}

async fn list_users(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    relay(state.identity.list_users(&forwarded_cookies(&headers)).await)
}

async fn get_user(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response {
    relay(
        state
            .identity
            .get_user(&forwarded_cookies(&headers), &user_id)
            .await,
    )
}

async fn user_organisations(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response {
    relay(
        state
            .identity
            .user_organisations(&forwarded_cookies(&headers), &user_id)
            .await,
    )
}

async fn list_organisations(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    relay(
        state
            .identity
            .list_organisations(&forwarded_cookies(&headers))
            .await,
    )
}

async fn get_organisation(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(organisation_id): Path<String>,
) -> Response {
    relay(
        state
            .identity
            .get_organisation(&forwarded_cookies(&headers), &organisation_id)
            .await,
    )
}

/// The gateway's identity API key, or a 503 when none is configured.
fn service_key(state: &GatewayState) -> Result<&str, Response> {
    let key = state.identity_api_key();
    if key.is_empty() {
        error!("IDENTITY_SERVICE_API_KEY is not configured");
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "identity service API key not configured" })),
        )
            .into_response());
    }
    Ok(key)
}

async fn user_by_email(State(state): State<GatewayState>, Path(email): Path<String>) -> Response {
    let key = match service_key(&state) {
        Ok(key) => key,
        Err(response) => return response,
    };
    relay(state.identity.user_by_email(key, &email).await)
}

async fn user_by_id(State(state): State<GatewayState>, Path(user_id): Path<String>) -> Response {
    let key = match service_key(&state) {
        Ok(key) => key,
        Err(response) => return response,
    };
    relay(state.identity.user_by_id(key, &user_id).await)
}

async fn create_user(
    State(state): State<GatewayState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Response {
    let key = match service_key(&state) {
        Ok(key) => key,
        Err(response) => return response,
    };
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    relay(state.identity.create_user(key, &body).await)
}

async fn create_event(
    State(state): State<GatewayState>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Response {
    let key = match service_key(&state) {
        Ok(key) => key,
        Err(response) => return response,
    };
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    relay(state.identity.create_event(key, &body).await)
}
