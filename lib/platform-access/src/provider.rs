//! Identity-provider allow-list enforcement.
//!
//! Each application only accepts sessions from certain identity providers.
//! The app name reaching the validator comes from several entry points
//! (explicit configuration, URL paths, the session's app-domain list), so it
//! is resolved against the registry with a fixed chain of strategies:
//!
//! 1. exact app name
//! 2. route `"/" + app_name`
//! 3. for each comma-separated domain in the hint, the label before the first
//!    `.` tried as a route
//! 4. case-insensitive substring match of the app name against registered
//!    names (either direction), or `app_name + "."` inside a registered domain
//!
//! The first strategy that yields a descriptor wins. Step 4 is loose: short
//! names can match unintended apps, and its result depends on registration
//! order.

use hstles_core::{AppDescriptor, AppRegistry};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Why a session's provider was refused for an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderValidationError {
    /// The session carries no provider.
    EmptyProvider { app_name: String },
    /// No registered application could be resolved from the app name.
    AppNotFound {
        session_provider: String,
        app_name: String,
    },
    /// The application exists but does not accept this provider.
    ProviderNotAllowed {
        session_provider: String,
        app_name: String,
        display_name: String,
        allowed_providers: Vec<String>,
    },
}

impl ProviderValidationError {
    /// Returns the provider that was checked ("" when it was empty).
    #[must_use]
    pub fn session_provider(&self) -> &str {
        match self {
            Self::EmptyProvider { .. } => "",
            Self::AppNotFound {
                session_provider, ..
            }
            | Self::ProviderNotAllowed {
                session_provider, ..
            } => session_provider,
        }
    }

    /// Returns the app name the caller asked about.
    #[must_use]
    pub fn app_name(&self) -> &str {
        match self {
            Self::EmptyProvider { app_name }
            | Self::AppNotFound { app_name, .. }
            | Self::ProviderNotAllowed { app_name, .. } => app_name,
        }
    }

    /// Returns the providers that would have been accepted.
    ///
    /// Empty unless an application was resolved.
    #[must_use]
    pub fn allowed_providers(&self) -> &[String] {
        match self {
            Self::ProviderNotAllowed {
                allowed_providers, ..
            } => allowed_providers,
            Self::EmptyProvider { .. } | Self::AppNotFound { .. } => &[],
        }
    }

    /// Returns true if the failure comes from missing registry configuration
    /// rather than from the session itself.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::AppNotFound { .. })
    }
}

impl fmt::Display for ProviderValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyProvider { .. } => write!(f, "Session provider is empty"),
            Self::AppNotFound { app_name, .. } => {
                write!(f, "App configuration not found for app: {app_name}")
            }
            Self::ProviderNotAllowed {
                session_provider,
                app_name,
                display_name,
                allowed_providers,
            } => write!(
                f,
                "Provider '{session_provider}' is not allowed for app '{app_name}' ({display_name}). Allowed providers: {}",
                allowed_providers.join(", ")
            ),
        }
    }
}

impl std::error::Error for ProviderValidationError {}

/// Checks session providers against the registry's allow-lists.
#[derive(Debug, Clone)]
pub struct ProviderValidator {
    registry: Arc<AppRegistry>,
}

impl ProviderValidator {
    #[must_use]
    pub fn new(registry: Arc<AppRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    /// Validates that `session_provider` may sign in to `app_name`.
    ///
    /// `app_domains_hint` is a comma-separated list of domains (may be empty)
    /// used when the name alone does not identify the app.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderValidationError`] when the provider is empty, the
    /// app cannot be resolved, or the provider is not in its allow-list.
    pub fn validate(
        &self,
        session_provider: &str,
        app_name: &str,
        app_domains_hint: &str,
    ) -> Result<(), ProviderValidationError> {
        if session_provider.is_empty() {
            return Err(ProviderValidationError::EmptyProvider {
                app_name: app_name.to_string(),
            });
        }

        let app = self.resolve_app(app_name, app_domains_hint).ok_or_else(|| {
            ProviderValidationError::AppNotFound {
                session_provider: session_provider.to_string(),
                app_name: app_name.to_string(),
            }
        })?;

        if app.allows(session_provider) {
            return Ok(());
        }

        Err(ProviderValidationError::ProviderNotAllowed {
            session_provider: session_provider.to_string(),
            app_name: app_name.to_string(),
            display_name: app.display_name().to_string(),
            allowed_providers: app.allowed_providers().to_vec(),
        })
    }

    /// Returns true if `provider` may sign in to `app_name`.
    #[must_use]
    pub fn is_provider_allowed(&self, provider: &str, app_name: &str) -> bool {
        self.validate(provider, app_name, "").is_ok()
    }

    /// Returns the allow-list for `app_name`, or an empty list if the app
    /// cannot be resolved.
    #[must_use]
    pub fn allowed_providers_for(&self, app_name: &str) -> Vec<String> {
        self.resolve_app(app_name, "")
            .map(|app| app.allowed_providers().to_vec())
            .unwrap_or_default()
    }

    /// Resolves `app_name` to a descriptor using the strategy chain described
    /// in the module docs.
    #[must_use]
    pub fn resolve_app(&self, app_name: &str, app_domains_hint: &str) -> Option<&AppDescriptor> {
        let registry = self.registry.as_ref();

        if let Some(app) = registry.find_by_name(app_name) {
            return Some(app);
        }

        if let Some(app) = registry.find_by_route(&format!("/{app_name}")) {
            debug!(app_name, resolved = app.app_name(), "resolved app by route");
            return Some(app);
        }

        if let Some(app) = resolve_from_domains(registry, app_domains_hint) {
            debug!(app_name, resolved = app.app_name(), "resolved app from domain hint");
            return Some(app);
        }

        let needle = app_name.to_lowercase();
        let domain_label = format!("{app_name}.");
        let app = registry.apps().iter().find(|app| {
            let name = app.app_name().to_lowercase();
            name.contains(&needle) || needle.contains(&name) || app.domain().contains(&domain_label)
        })?;
        debug!(app_name, resolved = app.app_name(), "resolved app by partial match");
        Some(app)
    }
}

fn resolve_from_domains<'a>(registry: &'a AppRegistry, hint: &str) -> Option<&'a AppDescriptor> {
    if hint.is_empty() {
        return None;
    }
    hint.split(',')
        .map(str::trim)
        .filter_map(|domain| domain.split_once('.').map(|(label, _)| label))
        .find_map(|label| registry.find_by_route(&format!("/{label}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hstles_core::RegistryDefaults;

    fn validator() -> ProviderValidator {
        ProviderValidator::new(Arc::new(
            AppRegistry::standard().expect("standard registry"),
        ))
    }

    fn resolved(app_name: &str, hint: &str) -> Option<String> {
        validator()
            .resolve_app(app_name, hint)
            .map(|app| app.app_name().to_string())
    }

    #[test]
    fn allowed_provider_passes_for_every_registered_app() {
        let validator = validator();
        for app in validator.registry().apps() {
            for provider in app.allowed_providers() {
                assert!(
                    validator.validate(provider, app.app_name(), "").is_ok(),
                    "{provider} should be allowed for {}",
                    app.app_name()
                );
            }
        }
    }

    #[test]
    fn disallowed_provider_reports_full_allow_list() {
        let validator = validator();
        for app in validator.registry().apps() {
            for provider in ["google", "microsoftonline", "github", "email", "okta"] {
                if app.allows(provider) {
                    continue;
                }
                let err = validator
                    .validate(provider, app.app_name(), "")
                    .expect_err("provider should be refused");
                assert_eq!(err.allowed_providers(), app.allowed_providers());
                assert_eq!(err.session_provider(), provider);
                assert_eq!(err.app_name(), app.app_name());
            }
        }
    }

    #[test]
    fn empty_provider_is_rejected_before_lookup() {
        let err = validator().validate("", "files", "").unwrap_err();
        assert_eq!(
            err,
            ProviderValidationError::EmptyProvider {
                app_name: "files".to_string()
            }
        );
        assert!(err.allowed_providers().is_empty());
    }

    #[test]
    fn provider_match_is_case_sensitive() {
        assert!(validator().validate("Google", "files", "").is_err());
    }

    #[test]
    fn not_allowed_message_lists_providers() {
        let err = validator().validate("github", "support", "").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Provider 'github' is not allowed for app 'support' (Support). Allowed providers: google, microsoftonline"
        );
    }

    #[test]
    fn unresolvable_app_is_a_configuration_error() {
        let err = validator().validate("google", "portal", "").unwrap_err();
        assert!(err.is_configuration_error());
        assert_eq!(err.to_string(), "App configuration not found for app: portal");
    }

    #[test]
    fn domain_hint_resolves_app() {
        assert_eq!(
            resolved("portal", "x.example.com, account.hstles.com"),
            Some("account".to_string())
        );
        assert!(validator()
            .validate("email", "portal", "account.hstles.com")
            .is_ok());
    }

    #[test]
    fn domain_hint_entries_without_dot_are_skipped() {
        assert_eq!(resolved("portal", "account,localhost"), None);
    }

    // The partial-match step depends on registration order and on every
    // registered name; these cases pin its current behaviour.
    #[test]
    fn partial_match_resolution_is_pinned() {
        assert_eq!(resolved("org", ""), Some("organisation".to_string()));
        assert_eq!(resolved("file", ""), Some("files".to_string()));
        assert_eq!(resolved("my-account", ""), Some("account".to_string()));
        assert_eq!(resolved("sUPPort", ""), Some("support".to_string()));
        assert_eq!(resolved("s", ""), Some("files".to_string()));
        assert_eq!(resolved("hstles", ""), Some("files".to_string()));
        assert_eq!(resolved("portal", ""), None);
    }

    #[test]
    fn empty_app_name_resolves_to_root_route() {
        assert_eq!(resolved("", ""), Some("services".to_string()));
    }

    #[test]
    fn exact_name_wins_over_route_and_hint() {
        assert_eq!(
            resolved("support", "account.hstles.com"),
            Some("support".to_string())
        );
    }

    #[test]
    fn allowed_providers_for_follows_resolution() {
        let validator = validator();
        assert_eq!(
            validator.allowed_providers_for("organisation"),
            vec!["google", "microsoftonline"]
        );
        assert!(validator.allowed_providers_for("portal").is_empty());
        assert!(validator.is_provider_allowed("github", "files"));
        assert!(!validator.is_provider_allowed("email", "files"));
    }

    #[test]
    fn validator_uses_injected_registry() {
        let apps = vec![
            AppDescriptor::new("/", "home", "Home", "example.org", &["email"]),
            AppDescriptor::new("/wiki", "wiki", "Wiki", "wiki.example.org", &["github"]),
        ];
        let defaults = RegistryDefaults {
            by_route: "home".to_string(),
            by_name: "home".to_string(),
            by_domain: "home".to_string(),
        };
        let registry = AppRegistry::new(apps, "example.org", defaults).expect("valid registry");
        let validator = ProviderValidator::new(Arc::new(registry));

        assert!(validator.validate("github", "wiki", "").is_ok());
        assert!(validator.validate("google", "wiki", "").is_err());
        assert!(validator.validate("github", "files", "").is_err());
    }
}
