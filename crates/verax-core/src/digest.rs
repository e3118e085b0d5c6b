//! Content digests for audit artifacts.
//!
//! Artifacts are serialized as canonical JSON (object keys sorted by UTF-16
//! code unit) so the same run always produces the same bytes, then hashed
//! with SHA-256.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::error::{Result, VeraxError};

/// Hex-encoded SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest(String);

impl ContentDigest {
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex chars.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }

    /// Parse a stored digest, rejecting anything that is not 64 hex chars.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(VeraxError::DigestMismatch {
                expected: s.to_string(),
                actual: "<malformed digest>".to_string(),
            });
        }
        Ok(ContentDigest(s.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn sort_keys_utf16(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));
            let mut sorted = serde_json::Map::new();
            for key in keys {
                if let Some(v) = map.get(key) {
                    sorted.insert(key.clone(), sort_keys_utf16(v));
                }
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(sort_keys_utf16).collect())
        }
        other => other.clone(),
    }
}

/// Pretty-printed canonical JSON bytes for `value`.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let raw = serde_json::to_value(value)?;
    Ok(serde_json::to_vec_pretty(&sort_keys_utf16(&raw))?)
}

/// Digest of the canonical JSON form of `value`.
pub fn digest_of<T: Serialize>(value: &T) -> Result<ContentDigest> {
    Ok(ContentDigest::from_bytes(&canonical_json(value)?))
}
