//! Application registry.
//!
//! Every hstles application surface (files, organisation, support, ...) is
//! described by an [`AppDescriptor`]. The registry is built once at startup
//! and is immutable afterwards, so it can be shared across request handlers
//! without locking.
//!
//! Lookups never fail. A miss resolves to a designated default descriptor so
//! the gateway always has somewhere routable to send a request. Each lookup
//! kind has its own default:
//!
//! | lookup      | default app            |
//! |-------------|------------------------|
//! | by route    | [`DEFAULT_ROUTE_APP`]  |
//! | by name     | [`DEFAULT_NAME_APP`]   |
//! | by domain   | [`DEFAULT_DOMAIN_APP`] |

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::error::RegistryError;

/// App returned by [`AppRegistry::lookup_by_route`] when no route matches.
pub const DEFAULT_ROUTE_APP: &str = "organisation";

/// App returned by [`AppRegistry::lookup_by_name`] when no name matches.
pub const DEFAULT_NAME_APP: &str = "organisation";

/// App returned by [`AppRegistry::lookup_by_domain`] when no domain matches.
pub const DEFAULT_DOMAIN_APP: &str = "services";

/// Route of the root application.
pub const ROOT_ROUTE: &str = "/";

/// Parent domain of the production registry.
pub const HSTLES_PARENT_DOMAIN: &str = "hstles.com";

/// Describes one application surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDescriptor {
    /// Path prefix, e.g. "/files".
    route: String,
    /// Unique app name, e.g. "files".
    app_name: String,
    /// Human-readable name.
    display_name: String,
    /// Fully-qualified host, without scheme.
    domain: String,
    /// Identity providers permitted to sign in to this app, in display order.
    allowed_providers: Vec<String>,
    icon: String,
    illustration: String,
}

impl AppDescriptor {
    /// Creates a descriptor with empty cosmetic fields.
    #[must_use]
    pub fn new(
        route: impl Into<String>,
        app_name: impl Into<String>,
        display_name: impl Into<String>,
        domain: impl Into<String>,
        allowed_providers: &[&str],
    ) -> Self {
        Self {
            route: route.into(),
            app_name: app_name.into(),
            display_name: display_name.into(),
            domain: domain.into(),
            allowed_providers: allowed_providers.iter().map(|p| (*p).to_string()).collect(),
            icon: String::new(),
            illustration: String::new(),
        }
    }

    /// Sets the icon and illustration asset paths.
    #[must_use]
    pub fn with_assets(mut self, icon: impl Into<String>, illustration: impl Into<String>) -> Self {
        self.icon = icon.into();
        self.illustration = illustration.into();
        self
    }

    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }

    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    #[must_use]
    pub fn allowed_providers(&self) -> &[String] {
        &self.allowed_providers
    }

    #[must_use]
    pub fn icon(&self) -> &str {
        &self.icon
    }

    #[must_use]
    pub fn illustration(&self) -> &str {
        &self.illustration
    }

    /// Returns the app's public URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("https://{}", self.domain)
    }

    /// Returns true if `provider` is in the allowed list (case-sensitive).
    #[must_use]
    pub fn allows(&self, provider: &str) -> bool {
        self.allowed_providers.iter().any(|p| p == provider)
    }
}

/// Names of the descriptors each lookup falls back to on a miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryDefaults {
    pub by_route: String,
    pub by_name: String,
    pub by_domain: String,
}

impl RegistryDefaults {
    /// The defaults used by the production registry.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            by_route: DEFAULT_ROUTE_APP.to_string(),
            by_name: DEFAULT_NAME_APP.to_string(),
            by_domain: DEFAULT_DOMAIN_APP.to_string(),
        }
    }
}

/// Immutable table of application descriptors.
#[derive(Debug, Clone)]
pub struct AppRegistry {
    apps: Vec<AppDescriptor>,
    parent_domain: String,
    route_default: usize,
    name_default: usize,
    domain_default: usize,
}

impl AppRegistry {
    /// Builds a registry, checking that names and routes are unique and that
    /// every default refers to a registered app.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] report if the table is inconsistent.
    pub fn new(
        apps: Vec<AppDescriptor>,
        parent_domain: impl Into<String>,
        defaults: RegistryDefaults,
    ) -> crate::Result<Self, RegistryError> {
        let mut names = HashSet::new();
        let mut routes = HashSet::new();
        for app in &apps {
            if !names.insert(app.app_name.as_str()) {
                return Err(RegistryError::DuplicateAppName {
                    app_name: app.app_name.clone(),
                }
                .into());
            }
            if !routes.insert(app.route.as_str()) {
                return Err(RegistryError::DuplicateRoute {
                    route: app.route.clone(),
                }
                .into());
            }
        }

        let position = |lookup: &'static str, name: &str| {
            apps.iter()
                .position(|a| a.app_name == name)
                .ok_or_else(|| RegistryError::UnknownDefault {
                    lookup,
                    app_name: name.to_string(),
                })
        };
        let route_default = position("route", &defaults.by_route)?;
        let name_default = position("name", &defaults.by_name)?;
        let domain_default = position("domain", &defaults.by_domain)?;

        Ok(Self {
            apps,
            parent_domain: parent_domain.into(),
            route_default,
            name_default,
            domain_default,
        })
    }

    /// Builds the production registry.
    ///
    /// `files` is registered ahead of the root `services` app, which is served
    /// from the same host, so domain lookups for that host resolve to `files`.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if the built-in table is inconsistent.
    pub fn standard() -> crate::Result<Self, RegistryError> {
        const ICON: &str = "assets/media/app/hstles.png";
        const ILLUSTRATION: &str = "/static/assets/media/app/hstles.png";

        let apps = vec![
            AppDescriptor::new(
                "/files",
                "files",
                "Files",
                "files.hstles.com",
                &["google", "microsoftonline", "github"],
            )
            .with_assets(ICON, "assets/media/app/box-files.svg"),
            AppDescriptor::new(
                ROOT_ROUTE,
                "services",
                "Services",
                "files.hstles.com",
                &["google", "microsoftonline", "github", "email"],
            )
            .with_assets(ICON, "assets/media/app/box.png"),
            AppDescriptor::new(
                "/organisation",
                "organisation",
                "Organisation",
                "organisation.hstles.com",
                &["google", "microsoftonline"],
            )
            .with_assets(ICON, ILLUSTRATION),
            AppDescriptor::new(
                "/support",
                "support",
                "Support",
                "support.hstles.com",
                &["google", "microsoftonline"],
            )
            .with_assets(ICON, ILLUSTRATION),
            AppDescriptor::new(
                "/account",
                "account",
                "My Account",
                "account.hstles.com",
                &["google", "microsoftonline", "github", "email"],
            )
            .with_assets(ICON, ILLUSTRATION),
        ];

        Self::new(apps, HSTLES_PARENT_DOMAIN, RegistryDefaults::standard())
    }

    /// Returns every registered descriptor in registration order.
    #[must_use]
    pub fn apps(&self) -> &[AppDescriptor] {
        &self.apps
    }

    /// Returns the parent domain all registered apps live under.
    #[must_use]
    pub fn parent_domain(&self) -> &str {
        &self.parent_domain
    }

    /// Exact route match, without fallback.
    #[must_use]
    pub fn find_by_route(&self, route: &str) -> Option<&AppDescriptor> {
        self.apps.iter().find(|a| a.route == route)
    }

    /// Exact name match, without fallback.
    #[must_use]
    pub fn find_by_name(&self, app_name: &str) -> Option<&AppDescriptor> {
        self.apps.iter().find(|a| a.app_name == app_name)
    }

    /// Exact domain match, without fallback. The first registration wins.
    #[must_use]
    pub fn find_by_domain(&self, domain: &str) -> Option<&AppDescriptor> {
        self.apps.iter().find(|a| a.domain == domain)
    }

    /// Resolves a route, falling back to [`DEFAULT_ROUTE_APP`].
    #[must_use]
    pub fn lookup_by_route(&self, route: &str) -> &AppDescriptor {
        resolve(
            "route",
            route,
            self.find_by_route(route),
            &self.apps[self.route_default],
        )
    }

    /// Resolves an app name, falling back to [`DEFAULT_NAME_APP`].
    #[must_use]
    pub fn lookup_by_name(&self, app_name: &str) -> &AppDescriptor {
        resolve(
            "name",
            app_name,
            self.find_by_name(app_name),
            &self.apps[self.name_default],
        )
    }

    /// Resolves a domain, falling back to [`DEFAULT_DOMAIN_APP`].
    #[must_use]
    pub fn lookup_by_domain(&self, domain: &str) -> &AppDescriptor {
        resolve(
            "domain",
            domain,
            self.find_by_domain(domain),
            &self.apps[self.domain_default],
        )
    }

    /// Returns the root application (route "/"), or the route default if
    /// no root is registered.
    #[must_use]
    pub fn root(&self) -> &AppDescriptor {
        self.lookup_by_route(ROOT_ROUTE)
    }
}

fn resolve<'a>(
    lookup: &'static str,
    key: &str,
    found: Option<&'a AppDescriptor>,
    default: &'a AppDescriptor,
) -> &'a AppDescriptor {
    match found {
        Some(app) => {
            debug!(lookup, key, app_name = %app.app_name, "app lookup matched");
            app
        }
        None => {
            warn!(
                lookup,
                key,
                default_app = %default.app_name,
                "app lookup missed, using default"
            );
            default
        }
    }
}
