use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque trade identifier assigned by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(pub String);

impl TradeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a stable ID from arbitrary content bytes.
    ///
    /// Uses BLAKE3 and keeps the first 20 hex characters, which is plenty
    /// for a personal journal and keeps IDs short enough to type.
    pub fn from_content(content: &[u8]) -> Self {
        let hash = blake3::hash(content);
        let hex = hash.to_hex();
        Self(hex.as_str()[..20].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for TradeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
