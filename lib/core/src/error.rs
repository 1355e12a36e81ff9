//! Error handling foundation for hstles services.
//!
//! This module provides the `Result` type alias using rootcause, plus the
//! error types raised by the application registry and redirect resolution.

use rootcause::Report;
use std::fmt;

/// A Result type alias using rootcause's Report for error handling.
///
/// Each layer adds its own context via `.context()` as errors propagate.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

/// Errors raised while building an application registry.
///
/// Lookups themselves never fail; these only guard the startup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two descriptors share an app name.
    DuplicateAppName { app_name: String },
    /// Two descriptors share a route.
    DuplicateRoute { route: String },
    /// A designated default names an app that is not registered.
    UnknownDefault { lookup: &'static str, app_name: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateAppName { app_name } => {
                write!(f, "app name '{app_name}' is registered more than once")
            }
            Self::DuplicateRoute { route } => {
                write!(f, "route '{route}' is registered more than once")
            }
            Self::UnknownDefault { lookup, app_name } => {
                write!(f, "default app '{app_name}' for {lookup} lookups is not registered")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Errors from resolving a post-login redirect target.
///
/// These are advisory: the error always carries a safe URL the caller may
/// still redirect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectError {
    /// The `next` value was neither a same-family URL nor a known app name.
    InvalidNext { next: String, fallback_url: String },
}

impl RedirectError {
    /// Returns the safe URL to use instead of the rejected target.
    #[must_use]
    pub fn fallback_url(&self) -> &str {
        match self {
            Self::InvalidNext { fallback_url, .. } => fallback_url,
        }
    }
}

impl fmt::Display for RedirectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNext { next, fallback_url } => {
                write!(
                    f,
                    "invalid 'next' parameter: {next}, using default {fallback_url}"
                )
            }
        }
    }
}

impl std::error::Error for RedirectError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_type_works() {
        let ok: Result<i32> = Ok(42);
        assert_eq!(ok.expect("should be ok"), 42);
    }

    #[test]
    fn redirect_error_exposes_fallback() {
        let err = RedirectError::InvalidNext {
            next: "https://evil.example.com".to_string(),
            fallback_url: "https://files.hstles.com".to_string(),
        };
        assert_eq!(err.fallback_url(), "https://files.hstles.com");
        assert!(err.to_string().contains("evil.example.com"));
    }

    #[test]
    fn registry_error_display() {
        let err = RegistryError::UnknownDefault {
            lookup: "route",
            app_name: "ghost".to_string(),
        };
        assert!(err.to_string().contains("ghost"));
        assert!(err.to_string().contains("route"));
    }
}
