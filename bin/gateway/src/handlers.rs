//! Endpoints answered by the gateway itself.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use hstles_platform_access::{ProviderValidator, RequestAuth};
use serde::Serialize;

use crate::state::GatewayState;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub auth_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl From<&RequestAuth> for WhoAmI {
    fn from(auth: &RequestAuth) -> Self {
        Self {
            auth_type: auth.auth_type_str(),
            user_id: auth.session().map(|s| s.user_id().to_string()),
            provider: auth.session().map(|s| s.provider().to_string()),
            service: auth.service_name().map(str::to_string),
        }
    }
}

/// Reports which credential admitted the request.
pub async fn whoami(Extension(auth): Extension<RequestAuth>) -> Json<WhoAmI> {
    Json(WhoAmI::from(&auth))
}

#[derive(Debug, Serialize)]
pub struct AppProviders {
    pub app: String,
    pub providers: Vec<String>,
}

/// Lists the identity providers an application accepts, so login pages can
/// offer only those.
pub async fn app_providers(
    State(state): State<GatewayState>,
    Path(app): Path<String>,
) -> Response {
    let providers =
        ProviderValidator::new(state.registry.clone()).allowed_providers_for(&app);
    if providers.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("unknown app '{app}'") })),
        )
            .into_response();
    }
    Json(AppProviders { app, providers }).into_response()
}
