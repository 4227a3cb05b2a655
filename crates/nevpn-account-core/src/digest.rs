//! Password digests.
//!
//! A password is never persisted. What lands in storage is its SHA-256
//! fingerprint, written as 64 lowercase hex characters. There is no way back
//! from a digest to the secret; login recomputes the digest and compares.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{CoreError, Result};

/// A 32-byte SHA-256 digest of a password.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PasswordDigest([u8; 32]);

impl PasswordDigest {
    /// Compute the digest of a plaintext secret.
    pub fn compute(secret: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidDigest(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| CoreError::InvalidDigest(format!("expected 32 bytes, got {}", b.len())))?;
        Ok(Self(arr))
    }

    /// Whether `secret` hashes to this digest.
    pub fn matches(&self, secret: &str) -> bool {
        Self::compute(secret) == *self
    }
}

/// Digest a plaintext secret into its hex fingerprint.
pub fn digest(plaintext: &str) -> String {
    PasswordDigest::compute(plaintext).to_hex()
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PasswordDigest({}...)", &self.to_hex()[..8])
    }
}

impl Serialize for PasswordDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PasswordDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
