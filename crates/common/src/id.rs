//! ID and token generation.

use ulid::Ulid;
use uuid::Uuid;

/// Length of the suffix appended to generated slugs.
const SLUG_SUFFIX_LEN: usize = 8;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// IDs are lowercase, 26 characters long and sort by creation time,
    /// which keeps `id` usable as a stable tie-breaker in listings.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an opaque bearer token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // No time component, unlike entity IDs.
        Uuid::new_v4().simple().to_string()
    }

    /// Short random suffix used to make slugs unique.
    #[must_use]
    pub fn generate_suffix(&self) -> String {
        let id = self.generate();
        id[id.len() - SLUG_SUFFIX_LEN..].to_string()
    }
}
