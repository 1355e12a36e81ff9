//! The gateway's security chain as axum middleware.
//!
//! Decisions live in `hstles-platform-access`; this module binds them to
//! requests and responses.

mod headers;
mod mixed;
mod normalize;
mod provider;
mod rejection;
mod routes;
mod service;
mod session;

pub use headers::{SecurityHeaders, security_headers};
pub use mixed::{MixedAuthValidator, require_key_or_session};
pub use normalize::{lowercase_path, normalize_path};
pub use provider::{ProviderGate, check_session_provider, require_allowed_provider};
pub use rejection::AuthRejection;
pub use routes::SecurityRoutes;
pub use service::{ServiceAuthValidator, require_api_key};
pub use session::{SessionValidator, forwarded_cookies, require_session};
