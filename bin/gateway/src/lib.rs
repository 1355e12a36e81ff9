//! hstles gateway: the platform services behind one security-tiered router.
//!
//! # Tiers
//!
//! - public: login flows, account recovery, health, plans, provider lists
//! - protected: session, two-factor, lockout, user and organisation reads
//! - service: identity service API, email
//! - mixed: `/api/whoami`, open to a service key or a session
//!
//! When `APP_NAME` is set, sessions on protected and mixed routes must also
//! come from an identity provider that application accepts.

pub mod config;
pub mod error;
pub mod handlers;
pub mod helpers;
pub mod proxy;
pub mod security;
pub mod state;

use axum::extract::Request;
use axum::routing::get;
use axum::{Router, ServiceExt, middleware};
use hstles_platform_access::ProviderValidator;
use rootcause::prelude::Report;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::trace::TraceLayer;

use crate::error::GatewayError;
use crate::security::{
    ProviderGate, SecurityHeaders, SecurityRoutes, ServiceAuthValidator, SessionValidator,
    check_session_provider, normalize_path, require_key_or_session,
};
use crate::state::GatewayState;

/// The provider gate for the configured application, if there is one.
#[must_use]
pub fn provider_gate(state: &GatewayState) -> Option<ProviderGate> {
    let app_name = state.config.app_name.trim();
    if app_name.is_empty() {
        return None;
    }
    Some(ProviderGate::new(
        ProviderValidator::new(state.registry.clone()),
        app_name,
        &state.config.app_domains,
    ))
}

/// Builds the gateway router.
pub fn app(state: GatewayState) -> Router {
    let mut routes: SecurityRoutes<GatewayState> = SecurityRoutes::new(
        SessionValidator::new(state.auth.clone()),
        ServiceAuthValidator::new(state.api_keys.clone()),
        SecurityHeaders::new(&state.config.parent_domain),
    );

    let mut mixed: Router<GatewayState> =
        Router::new().route("/api/whoami", get(handlers::whoami));
    if let Some(gate) = provider_gate(&state) {
        tracing::info!(app = gate.app_name(), "provider allow-list enforced");
        mixed = mixed.route_layer(middleware::from_fn_with_state(
            gate.clone(),
            check_session_provider,
        ));
        routes = routes.with_provider_check(gate);
    }
    let mixed = mixed.route_layer(middleware::from_fn_with_state(
        routes.mixed_auth(),
        require_key_or_session,
    ));

    routes
        .public(
            Router::new()
                .route("/api/apps/{app}/providers", get(handlers::app_providers))
                .merge(proxy::auth::public_routes())
                .merge(proxy::identity::public_routes()),
        )
        .protected(
            proxy::auth::protected_routes().merge(proxy::identity::protected_routes()),
        )
        .service(proxy::identity::service_routes().merge(proxy::notify::service_routes()))
        .mixed(mixed)
        .into_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `router` on `listener` until `shutdown` resolves.
///
/// Paths are lowercased before routing, and handlers can read the peer
/// address through `ConnectInfo`.
///
/// # Errors
///
/// Returns [`GatewayError::Serve`] if the server stops with an I/O error.
pub async fn serve_app(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Report<GatewayError>> {
    let app = middleware::from_fn(normalize_path).layer(router);
    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| GatewayError::Serve {
        details: e.to_string(),
    })?;
    Ok(())
}
