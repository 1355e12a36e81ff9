//! Core types shared by every hstles service.
//!
//! This crate provides:
//! - The application registry (`AppRegistry`, `AppDescriptor`) that maps
//!   routes, app names, and domains to the application surfaces of the platform
//! - Redirect-target resolution for login flows (`AppRegistry::resolve_next_url`)
//! - The `Result` alias used with rootcause reports
//!
//! # Example
//!
//! ```
//! use hstles_core::AppRegistry;
//!
//! let registry = AppRegistry::standard().expect("built-in registry is consistent");
//!
//! let files = registry.lookup_by_route("/files");
//! assert_eq!(files.app_name(), "files");
//! assert!(files.allows("github"));
//!
//! // Unknown routes never fail; they resolve to the designated default.
//! let fallback = registry.lookup_by_route("/nope");
//! assert_eq!(fallback.app_name(), hstles_core::apps::DEFAULT_ROUTE_APP);
//! ```

pub mod apps;
pub mod error;
pub mod redirect;

pub use apps::{AppDescriptor, AppRegistry, RegistryDefaults};
pub use error::{RedirectError, RegistryError, Result};
