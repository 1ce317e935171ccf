//! Identifier and token generation.

use ulid::Ulid;
use uuid::Uuid;

/// Generates row identifiers and session tokens.
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

    /// Generate a lowercase ULID for a new row.
    ///
    /// Sorting by ID roughly follows creation order, which the listings
    /// rely on only as a tiebreaker after `created_at`.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an opaque session token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // v4 has no time component
        Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_ids_are_lowercase_ulids() {
        let id_gen = IdGenerator::new();
        let id = id_gen.generate();

        assert_eq!(id.len(), 26);
        assert_eq!(id, id.to_lowercase());
        assert_ne!(id, id_gen.generate());
    }

    #[test]
    fn test_session_token_shape() {
        let token = IdGenerator::new().generate_token();

        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
