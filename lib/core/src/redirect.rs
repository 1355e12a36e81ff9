//! Post-login redirect resolution.
//!
//! Login flows carry a `next` parameter naming where the user should land.
//! It may be a full URL or a bare app name. Anything outside the registry's
//! parent domain is refused so the gateway never acts as an open redirect;
//! the refusal still yields a safe URL to send the user to.

use tracing::{debug, warn};
use url::Url;

use crate::apps::AppRegistry;
use crate::error::RedirectError;

/// Returns true if `candidate` is an absolute http(s) URL whose host is
/// `parent_domain` or a subdomain of it.
#[must_use]
pub fn is_family_url(candidate: &str, parent_domain: &str) -> bool {
    let Ok(url) = Url::parse(candidate) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    url.host_str()
        .is_some_and(|host| is_family_host(host, parent_domain))
}

/// Returns true if `host` equals `parent_domain` or is one of its subdomains.
#[must_use]
pub fn is_family_host(host: &str, parent_domain: &str) -> bool {
    if parent_domain.is_empty() {
        return false;
    }
    let host = host.to_ascii_lowercase();
    let parent = parent_domain.to_ascii_lowercase();
    host == parent
        || host
            .strip_suffix(&parent)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

impl AppRegistry {
    /// Resolves a `next` redirect parameter.
    ///
    /// - empty: the root app's URL
    /// - an absolute URL on the parent domain (or a subdomain): returned unchanged
    /// - a registered app name: that app's URL
    /// - anything else: [`RedirectError::InvalidNext`], carrying the root app's URL
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError::InvalidNext`] for unrecognized targets. The
    /// error is advisory; [`RedirectError::fallback_url`] is always safe.
    pub fn resolve_next_url(&self, next: &str) -> Result<String, RedirectError> {
        if next.is_empty() {
            return Ok(self.root().url());
        }

        if is_family_url(next, self.parent_domain()) {
            debug!(next, "next parameter accepted as same-family URL");
            return Ok(next.to_string());
        }

        if let Some(app) = self.find_by_name(next) {
            return Ok(app.url());
        }

        let fallback_url = self.root().url();
        warn!(next, fallback = %fallback_url, "rejected next parameter");
        Err(RedirectError::InvalidNext {
            next: next.to_string(),
            fallback_url,
        })
    }

    /// Like [`resolve_next_url`](Self::resolve_next_url) but always yields a URL.
    #[must_use]
    pub fn resolve_next_url_or_default(&self, next: &str) -> String {
        self.resolve_next_url(next)
            .unwrap_or_else(|err| err.fallback_url().to_string())
    }
}
