//! Validated SHA-256 digest newtype.

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};

/// A validated SHA-256 digest (64 lowercase hex characters).
///
/// This newtype ensures that every digest in a manifest is validated at
/// construction and deserialization time, preventing invalid hex strings
/// from propagating through the codebase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Create a new `Sha256Hash`, validating the input.
    ///
    /// # Errors
    ///
    /// Returns an error if `s` is not exactly 64 ASCII hex characters.
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();

        if s.len() != 64 {
            anyhow::bail!(
                "Invalid SHA256 digest: expected 64 hex characters, got {} in '{s}'",
                s.len(),
            );
        }

        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("Invalid SHA256 digest: contains non-hex characters in '{s}'");
        }

        Ok(Self(s.to_lowercase()))
    }

    /// Build a `Sha256Hash` from raw digest bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a 32-byte digest.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::new(hex::encode(bytes))
    }

    /// Return the inner hex string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Sha256Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Hash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
