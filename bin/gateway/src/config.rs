//! Gateway configuration.
//!
//! Loaded via the `config` crate from environment variables. Every value has
//! a production default, so an empty environment yields a working gateway
//! pointed at the hosted services. Unset and empty variables are treated the
//! same.

use hstles_platform_access::ApiKeyTable;
use serde::Deserialize;
use std::time::Duration;

/// Deployment environment (`APP_ENV`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    Development,
    #[default]
    Production,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_auth_service_url")]
    pub auth_service_url: String,

    #[serde(default = "default_identity_service_url")]
    pub identity_service_url: String,

    #[serde(default = "default_notify_service_url")]
    pub notify_service_url: String,

    #[serde(default = "default_account_service_url")]
    pub account_service_url: String,

    #[serde(default = "default_login_service_url")]
    pub login_service_url: String,

    /// Domain whose subdomains may call the gateway cross-origin.
    #[serde(default = "default_parent_domain")]
    pub parent_domain: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Name of the application this gateway fronts. Enables the provider
    /// allow-list check when set.
    #[serde(default)]
    pub app_name: String,

    /// Comma-separated domains of this application, used to resolve
    /// `app_name` when it is not a registered name.
    #[serde(default)]
    pub app_domains: String,

    #[serde(default)]
    pub app_env: AppEnv,

    /// Timeout for each outbound call to a platform service.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    #[serde(default)]
    pub auth_service_api_key: String,

    #[serde(default)]
    pub identity_service_api_key: String,

    #[serde(default)]
    pub notify_service_api_key: String,

    #[serde(default)]
    pub account_service_api_key: String,
}

fn default_auth_service_url() -> String {
    "https://auth.hstles.com".to_string()
}

fn default_identity_service_url() -> String {
    "https://identity.hstles.com".to_string()
}

fn default_notify_service_url() -> String {
    "https://notify.hstles.com".to_string()
}

fn default_account_service_url() -> String {
    "https://account.hstles.com".to_string()
}

fn default_login_service_url() -> String {
    "https://login.hstles.com".to_string()
}

fn default_parent_domain() -> String {
    hstles_core::apps::HSTLES_PARENT_DOMAIN.to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    10
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            auth_service_url: default_auth_service_url(),
            identity_service_url: default_identity_service_url(),
            notify_service_url: default_notify_service_url(),
            account_service_url: default_account_service_url(),
            login_service_url: default_login_service_url(),
            parent_domain: default_parent_domain(),
            listen_addr: default_listen_addr(),
            app_name: String::new(),
            app_domains: String::new(),
            app_env: AppEnv::default(),
            request_timeout_seconds: default_request_timeout_seconds(),
            auth_service_api_key: String::new(),
            identity_service_api_key: String::new(),
            notify_service_api_key: String::new(),
            account_service_api_key: String::new(),
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::default())
    }

    fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                environment
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the base URL of a platform service by short name
    /// (`auth`, `identity`, `notify`, `account`, `login`).
    #[must_use]
    pub fn service_url(&self, service: &str) -> Option<&str> {
        match service {
            "auth" => Some(&self.auth_service_url),
            "identity" => Some(&self.identity_service_url),
            "notify" => Some(&self.notify_service_url),
            "account" => Some(&self.account_service_url),
            "login" => Some(&self.login_service_url),
            _ => None,
        }
    }

    /// Returns the API key configured for a service, if any.
    #[must_use]
    pub fn service_api_key(&self, service: &str) -> Option<&str> {
        let key = match service {
            "auth" => &self.auth_service_api_key,
            "identity" => &self.identity_service_api_key,
            "notify" => &self.notify_service_api_key,
            "account" => &self.account_service_api_key,
            _ => return None,
        };
        (!key.is_empty()).then_some(key.as_str())
    }

    /// Builds the table used to authenticate inbound service calls.
    /// Services without a key are left out.
    #[must_use]
    pub fn api_keys(&self) -> ApiKeyTable {
        ApiKeyTable::from_pairs([
            ("auth", self.auth_service_api_key.as_str()),
            ("identity", self.identity_service_api_key.as_str()),
            ("notify", self.notify_service_api_key.as_str()),
            ("account", self.account_service_api_key.as_str()),
        ])
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        self.app_env == AppEnv::Development
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(vars: &[(&str, &str)]) -> GatewayConfig {
        let source = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect::<config::Map<String, String>>();
        GatewayConfig::from_environment(config::Environment::default().source(Some(source)))
            .expect("config should load")
    }

    #[test]
    fn empty_environment_uses_production_defaults() {
        let config = load(&[]);
        assert_eq!(config.auth_service_url, "https://auth.hstles.com");
        assert_eq!(config.service_url("login"), Some("https://login.hstles.com"));
        assert_eq!(config.parent_domain, "hstles.com");
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.app_env, AppEnv::Production);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.api_keys().is_empty());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = load(&[
            ("AUTH_SERVICE_URL", "http://127.0.0.1:9000"),
            ("APP_ENV", "development"),
            ("APP_NAME", "files"),
            ("REQUEST_TIMEOUT_SECONDS", "3"),
        ]);
        assert_eq!(config.service_url("auth"), Some("http://127.0.0.1:9000"));
        assert!(config.is_development());
        assert_eq!(config.app_name, "files");
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn empty_variables_fall_back_to_defaults() {
        let config = load(&[("NOTIFY_SERVICE_URL", "")]);
        assert_eq!(config.notify_service_url, "https://notify.hstles.com");
    }

    #[test]
    fn only_non_empty_api_keys_are_loaded() {
        let config = load(&[
            ("NOTIFY_SERVICE_API_KEY", "notify-secret"),
            ("ACCOUNT_SERVICE_API_KEY", ""),
        ]);
        let keys = config.api_keys();
        assert_eq!(keys.len(), 1);
        assert_eq!(
            keys.resolve("notify-secret").map(|p| p.service_name().to_string()),
            Some("notify".to_string())
        );
        assert_eq!(config.service_api_key("notify"), Some("notify-secret"));
        assert_eq!(config.service_api_key("account"), None);
    }

    #[test]
    fn unknown_service_has_no_url() {
        assert_eq!(load(&[]).service_url("billing"), None);
    }
}
