//! Authorization decisions for hstles services.
//!
//! This crate provides the framework-independent parts of the gateway's
//! security chain:
//! - Request principals (`SessionPrincipal`, `ServicePrincipal`, `RequestAuth`)
//! - Identity-provider allow-list enforcement (`ProviderValidator`)
//! - Service-to-service API key resolution (`ApiKeyTable`)
//! - Origin matching and the Content-Security-Policy template (`origin`)
//!
//! # Trust tiers
//!
//! A request is either anonymous, carries a user session validated by the
//! remote auth service, or carries a service API key. A session may further be
//! restricted to the identity providers an application permits.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use hstles_core::AppRegistry;
//! use hstles_platform_access::ProviderValidator;
//!
//! let registry = Arc::new(AppRegistry::standard().expect("built-in registry"));
//! let validator = ProviderValidator::new(registry);
//!
//! assert!(validator.validate("github", "files", "").is_ok());
//!
//! let err = validator.validate("github", "support", "").unwrap_err();
//! assert_eq!(err.allowed_providers(), &["google", "microsoftonline"]);
//! ```

pub mod api_key;
pub mod error;
pub mod origin;
pub mod principal;
pub mod provider;

// Re-export main types at crate root
pub use api_key::{API_KEY_HEADER, ApiKeyTable};
pub use error::{AuthenticationError, AuthorizationError};
pub use principal::{AuthType, RequestAuth, ServicePrincipal, SessionPrincipal};
pub use provider::{ProviderValidationError, ProviderValidator};
