//! Handlers that re-expose the platform services behind the security tiers.
//!
//! Handlers relay the upstream status code with the decoded body. Failed
//! calls go through [`UpstreamFailure`], which keeps the upstream status
//! whenever a response arrived.

pub mod auth;
pub mod identity;
pub mod notify;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use hstles_clients::{ClientError, Upstream};
use rootcause::prelude::Report;
use serde::Serialize;

use crate::error::{UpstreamFailure, invalid_json};

/// Turns a client result into a response.
pub(crate) fn relay<T: Serialize>(result: Result<Upstream<T>, Report<ClientError>>) -> Response {
    match result {
        Ok(upstream) => (upstream.status, Json(upstream.body)).into_response(),
        Err(report) => UpstreamFailure(report).into_response(),
    }
}

/// Unwraps a JSON request body, answering 400 when it did not parse.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected request body");
        invalid_json()
    })
}
