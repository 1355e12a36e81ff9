//! Clients for the hstles platform services.
//!
//! Each client is constructed explicitly with its service's base URL and
//! passed to whatever needs it; there is no process-wide default instance.
//!
//! Every call returns the decoded body together with the upstream status
//! code, so proxies can relay the remote service's status unchanged. Errors
//! carry the upstream status too whenever one was received.
//!
//! - [`AuthClient`]: sessions, two-factor, lockout, and login flows
//! - [`IdentityClient`]: users, organisations, plans, and audit events
//! - [`NotifyClient`]: transactional email

pub mod auth;
pub mod error;
mod http;
pub mod identity;
pub mod notify;

pub use auth::AuthClient;
pub use error::ClientError;
pub use http::{DEFAULT_TIMEOUT, Upstream, normalize_base_url};
pub use identity::IdentityClient;
pub use notify::NotifyClient;
