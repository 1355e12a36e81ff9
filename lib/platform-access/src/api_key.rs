//! Service-to-service API keys.
//!
//! Each internal service is issued one key. The table is small (tens of
//! entries at most) and is scanned linearly; switch to a map keyed by the
//! key itself if it ever needs to hold many more.

use std::fmt;

use crate::principal::ServicePrincipal;

/// Header that carries a caller-supplied API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Immutable table of `service name -> API key`.
#[derive(Clone, Default)]
pub struct ApiKeyTable {
    entries: Vec<(String, String)>,
}

impl ApiKeyTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(service, key)` pairs, skipping empty keys.
    #[must_use]
    pub fn from_pairs<I, S, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, K)>,
        S: Into<String>,
        K: Into<String>,
    {
        let mut table = Self::new();
        for (service, key) in pairs {
            table = table.with_key(service, key);
        }
        table
    }

    /// Adds a key for `service`. Empty keys are ignored, and a repeated
    /// service name replaces the earlier key.
    #[must_use]
    pub fn with_key(mut self, service: impl Into<String>, key: impl Into<String>) -> Self {
        let service = service.into();
        let key = key.into();
        if key.is_empty() {
            return self;
        }
        match self.entries.iter_mut().find(|(name, _)| *name == service) {
            Some(entry) => entry.1 = key,
            None => self.entries.push((service, key)),
        }
        self
    }

    /// Resolves a presented key to the service that owns it.
    #[must_use]
    pub fn resolve(&self, presented: &str) -> Option<ServicePrincipal> {
        if presented.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(_, key)| key == presented)
            .map(|(service, _)| ServicePrincipal::new(service.clone()))
    }

    /// Returns the key configured for `service`, if any.
    #[must_use]
    pub fn key_for(&self, service: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == service)
            .map(|(_, key)| key.as_str())
    }

    /// Returns the configured service names.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Keys never appear in debug output.
impl fmt::Debug for ApiKeyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyTable")
            .field("services", &self.services().collect::<Vec<_>>())
            .finish()
    }
}
