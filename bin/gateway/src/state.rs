//! Shared state for gateway handlers.

use hstles_clients::{AuthClient, IdentityClient, NotifyClient};
use hstles_core::AppRegistry;
use hstles_platform_access::ApiKeyTable;
use rootcause::prelude::Report;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// Everything a handler needs, built once at startup and cloned per request.
#[derive(Debug, Clone)]
pub struct GatewayState {
    pub config: Arc<GatewayConfig>,
    pub registry: Arc<AppRegistry>,
    pub api_keys: Arc<ApiKeyTable>,
    pub auth: AuthClient,
    pub identity: IdentityClient,
    pub notify: NotifyClient,
}

impl GatewayState {
    /// Builds the registry, key table and service clients from `config`.
    ///
    /// # Errors
    ///
    /// Fails if the registry is inconsistent or a client cannot be built.
    pub fn from_config(config: GatewayConfig) -> Result<Self, Report<GatewayError>> {
        let registry = AppRegistry::standard().map_err(|e| GatewayError::Registry {
            details: e.current_context().to_string(),
        })?;
        Self::with_registry(config, registry)
    }

    /// Like [`GatewayState::from_config`] with a caller-supplied registry.
    ///
    /// # Errors
    ///
    /// Fails if a client cannot be built.
    pub fn with_registry(
        config: GatewayConfig,
        registry: AppRegistry,
    ) -> Result<Self, Report<GatewayError>> {
        let timeout = config.request_timeout();
        let client_error = |service: &'static str| {
            move |report: Report<hstles_clients::ClientError>| GatewayError::Client {
                service,
                details: report.current_context().to_string(),
            }
        };

        let auth = AuthClient::new(&config.auth_service_url, timeout)
            .map_err(client_error("auth"))?;
        let identity = IdentityClient::new(&config.identity_service_url, timeout)
            .map_err(client_error("identity"))?;
        let notify = NotifyClient::new(&config.notify_service_url, timeout)
            .map_err(client_error("notify"))?;

        Ok(Self {
            api_keys: Arc::new(config.api_keys()),
            config: Arc::new(config),
            registry: Arc::new(registry),
            auth,
            identity,
            notify,
        })
    }

    /// The key the gateway presents when it calls the identity service API.
    #[must_use]
    pub fn identity_api_key(&self) -> &str {
        self.config.service_api_key("identity").unwrap_or_default()
    }
}
