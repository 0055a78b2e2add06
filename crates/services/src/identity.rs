//! Deterministic identifiers for boards and feedback items.

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// Marker prepended to every derived identifier.
pub const ID_PREFIX: &str = "0x";

/// SHA-256 over the plain concatenation of the three inputs, hex encoded.
pub fn derive_id(actor: &str, content: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(actor.as_bytes());
    hasher.update(content.as_bytes());
    hasher.update(salt.as_bytes());
    format!("{ID_PREFIX}{}", hex::encode(hasher.finalize()))
}

/// Board ids carry no timestamp: the same actor reusing a title and
/// category gets the same id, and the ledger rejects the duplicate account.
pub fn board_id(actor: &str, title: &str, category: &str) -> String {
    derive_id(actor, title, category)
}

pub fn feedback_id(actor: &str, text: &str, at: DateTime<Utc>) -> String {
    derive_id(actor, text, &at.to_rfc3339_opts(SecondsFormat::Millis, true))
}
