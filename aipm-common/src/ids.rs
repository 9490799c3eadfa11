//! Opaque identifier utilities
//!
//! Project records are keyed by store-generated UUIDs, rendered externally
//! as strings. Embedded references (task lists, owning user) may carry ids
//! from other systems, so normalization is opportunistic: a string that
//! parses as a UUID is canonicalized, anything else is kept verbatim.

use crate::{Error, Result};
use uuid::Uuid;

/// Generate a new opaque identifier (UUIDv4)
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse an opaque identifier from its string form.
///
/// A malformed id is the caller's invalid-input error, not a provider or
/// store failure.
pub fn parse(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|_| Error::InvalidInput("Invalid project ID format".to_string()))
}

/// Normalize an embedded identifier.
///
/// Valid UUID strings are rewritten in canonical (hyphenated lowercase)
/// form; anything else passes through unchanged. Never fails.
pub fn normalize(s: &str) -> String {
    match Uuid::parse_str(s) {
        Ok(id) => id.to_string(),
        Err(_) => s.to_string(),
    }
}
