//! Auth service endpoints: sessions, two-factor, lockout, and login flows.
//!
//! Login and recovery endpoints are public since the caller has no full
//! session yet. Everything that acts on an established session is protected.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use hstles_clients::auth::{
    ConfigureTwoFactorRequest, DeleteSessionRequest, GenerateBackupCodesRequest,
    InitiateRecoveryRequest, LockoutRequest, ResetTwoFactorRequest, VerifyRecoveryCodeRequest,
    VerifyTwoFactorRequest,
};
use serde::Deserialize;
use std::collections::HashMap;

use super::{json_body, relay};
use crate::error::UpstreamFailure;
use crate::security::forwarded_cookies;
use crate::state::GatewayState;

/// Login and recovery routes.
pub fn public_routes() -> Router<GatewayState> {
    Router::new()
        .route("/auth", get(start_login))
        .route("/auth/{provider}", post(submit_login))
        .route("/auth/{provider}/callback", get(login_callback))
        .route("/api/2fa/pending", post(pending_session))
        .route("/api/2fa/verify", post(verify_two_factor))
        .route("/api/2fa/trusted-device", get(trusted_device))
        .route("/api/2fa/recovery", post(initiate_recovery))
        .route("/api/2fa/recovery/verify", post(verify_recovery_code))
}

/// Routes acting on the caller's session.
pub fn protected_routes() -> Router<GatewayState> {
    Router::new()
        .route(
            "/api/session",
            get(session)
                .post(delete_session)
                .delete(delete_all_sessions),
        )
        .route("/api/2fa", get(two_factor_status).delete(delete_two_factor))
        .route(
            "/api/2fa/lockout",
            get(lockout_status).post(check_lockout).delete(clear_lockout),
        )
        .route("/api/2fa/configure", post(configure_two_factor))
        .route("/api/2fa/reset", post(reset_two_factor))
        .route("/api/2fa/backup-codes", post(generate_backup_codes))
}

#[derive(Debug, Deserialize)]
struct LoginQuery {
    #[serde(default)]
    provider: String,
    #[serde(default)]
    next: String,
}

#[derive(Debug, Deserialize)]
struct NextQuery {
    #[serde(default)]
    next: String,
}

async fn start_login(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(query): Query<LoginQuery>,
) -> Response {
    let next = state.registry.resolve_next_url_or_default(&query.next);
    let cookies = forwarded_cookies(&headers);
    match state.auth.auth_flow(&cookies, &query.provider, &next).await {
        Ok(upstream) if upstream.status.is_redirection() => {
            Redirect::to(&upstream.body).into_response()
        }
        Ok(upstream) => (upstream.status, upstream.body).into_response(),
        Err(report) => UpstreamFailure(report).into_response(),
    }
}

/// Provider names are lowercase slugs such as `google` or `microsoftonline`.
fn is_provider_name(provider: &str) -> bool {
    !provider.is_empty()
        && provider
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

fn unknown_provider(provider: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": format!("unknown provider '{provider}'") })),
    )
        .into_response()
}

async fn submit_login(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(provider): Path<String>,
    Query(query): Query<NextQuery>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if !is_provider_name(&provider) {
        return unknown_provider(&provider);
    }
    let next = state.registry.resolve_next_url_or_default(&query.next);
    let cookies = forwarded_cookies(&headers);
    let form = form.into_iter().collect::<Vec<_>>();
    match state.auth.auth(&cookies, &provider, &next, &form).await {
        Ok(upstream) => (upstream.status, upstream.body).into_response(),
        Err(report) => UpstreamFailure(report).into_response(),
    }
}

async fn login_callback(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(provider): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    if !is_provider_name(&provider) {
        return unknown_provider(&provider);
    }
    let cookies = forwarded_cookies(&headers);
    match state.auth.auth_callback(&cookies, &provider, &query).await {
        Ok(upstream) => Redirect::to(&upstream.body).into_response(),
        Err(report) => UpstreamFailure(report).into_response(),
    }
}

async fn session(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    relay(state.auth.validate_session(&forwarded_cookies(&headers)).await)
}

async fn delete_session(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    payload: Result<Json<DeleteSessionRequest>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    relay(
        state
            .auth
            .delete_session(&forwarded_cookies(&headers), &body.session_id)
            .await,
    )
}

async fn delete_all_sessions(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    relay(state.auth.delete_all_sessions(&forwarded_cookies(&headers)).await)
}

async fn two_factor_status(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    relay(state.auth.two_factor_status(&forwarded_cookies(&headers)).await)
}

async fn pending_session(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    relay(state.auth.check_pending_session(&forwarded_cookies(&headers)).await)
}

async fn delete_two_factor(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    relay(state.auth.delete_two_factor(&forwarded_cookies(&headers)).await)
}

async fn lockout_status(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    relay(state.auth.lockout_status(&forwarded_cookies(&headers)).await)
}

async fn check_lockout(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    payload: Result<Json<LockoutRequest>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    relay(state.auth.check_lockout(&forwarded_cookies(&headers), &body).await)
}

async fn clear_lockout(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    relay(state.auth.clear_lockout(&forwarded_cookies(&headers)).await)
}

async fn configure_two_factor(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    payload: Result<Json<ConfigureTwoFactorRequest>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    relay(
        state
            .auth
            .configure_two_factor(&forwarded_cookies(&headers), &body)
            .await,
    )
}

async fn verify_two_factor(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    payload: Result<Json<VerifyTwoFactorRequest>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    relay(
        state
            .auth
            .verify_two_factor(&forwarded_cookies(&headers), &body)
            .await,
    )
}

async fn reset_two_factor(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    payload: Result<Json<ResetTwoFactorRequest>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    relay(
        state
            .auth
            .reset_two_factor(&forwarded_cookies(&headers), &body)
            .await,
    )
}

async fn generate_backup_codes(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    payload: Result<Json<GenerateBackupCodesRequest>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    relay(
        state
            .auth
            .generate_backup_codes(&forwarded_cookies(&headers), &body)
            .await,
    )
}

async fn trusted_device(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    relay(state.auth.check_trusted_device(&forwarded_cookies(&headers)).await)
}

async fn initiate_recovery(
    State(state): State<GatewayState>,
    payload: Result<Json<InitiateRecoveryRequest>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    relay(state.auth.initiate_recovery(&body).await)
}

async fn verify_recovery_code(
    State(state): State<GatewayState>,
    payload: Result<Json<VerifyRecoveryCodeRequest>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    relay(state.auth.verify_recovery_code(&body).await)
}
