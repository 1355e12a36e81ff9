//! Cross-origin policy for the parent-domain family.
//!
//! Browsers on any `https://*.{parent}` page may call the gateway with
//! credentials; everything else gets no CORS grant at all.

use hstles_core::redirect::is_family_host;
use url::Url;

/// Methods advertised in `Access-Control-Allow-Methods`.
pub const ALLOWED_METHODS: &str = "GET, POST, DELETE, OPTIONS";

/// Headers advertised in `Access-Control-Allow-Headers`.
pub const ALLOWED_HEADERS: &str = "Content-Type";

/// Returns true if `origin` is `https://` on `parent_domain` or a subdomain.
#[must_use]
pub fn is_allowed_origin(origin: &str, parent_domain: &str) -> bool {
    let Ok(url) = Url::parse(origin) else {
        return false;
    };
    url.scheme() == "https"
        && url
            .host_str()
            .is_some_and(|host| is_family_host(host, parent_domain))
}

/// Builds the Content-Security-Policy value for `parent_domain`.
#[must_use]
pub fn content_security_policy(parent_domain: &str) -> String {
    format!(
        "default-src 'self' https://*.{parent_domain}; \
         img-src 'self' data:; \
         font-src 'self' https://cdnjs.cloudflare.com https://fonts.gstatic.com; \
         script-src 'self' https://*.{parent_domain} https://unpkg.com https://fonts.googleapis.com https://cdnjs.cloudflare.com 'unsafe-inline' 'unsafe-eval'; \
         style-src 'self' https://*.{parent_domain} https://fonts.googleapis.com https://cdnjs.cloudflare.com 'unsafe-inline';"
    )
}
