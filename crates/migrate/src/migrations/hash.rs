//! Content hashing for migration files

use sha2::{Digest, Sha256};

/// SHA-256 of the raw file text, hex encoded (the digest the Supabase CLI records)
pub fn content_hash(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
