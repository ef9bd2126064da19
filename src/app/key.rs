//! Cache key derivation
//!
//! A cache key is the SHA-256 digest of a URL's path component. Query string
//! and fragment are deliberately ignored: `https://host/a?x=1` and
//! `https://host/a#top` share one entry. The digest is rendered as padded
//! URL-safe base64 so it forms a single filesystem-safe path segment and can
//! be decoded back to the raw digest.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::constants::cache;
use crate::errors::CacheError;

/// Length of an encoded key (32 bytes in padded base64)
pub const ENCODED_LEN: usize = 44;

/// SHA-256 identity of a remote resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Derive the key for a URL from its path component only
    ///
    /// # Examples
    ///
    /// ```rust
    /// use remote_file_cache::app::CacheKey;
    /// use url::Url;
    ///
    /// let a = CacheKey::from_url(&Url::parse("http://x/download?v=1").unwrap());
    /// let b = CacheKey::from_url(&Url::parse("http://x/download#part").unwrap());
    /// assert_eq!(a, b);
    /// ```
    pub fn from_url(url: &Url) -> Self {
        Self::from_path_component(url.path())
    }

    /// Derive the key for an already-extracted URL path
    pub fn from_path_component(path: &str) -> Self {
        let digest = Sha256::digest(path.as_bytes());
        Self(digest.into())
    }

    /// Create from raw digest bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw digest
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the key as URL-safe base64
    pub fn to_encoded(&self) -> String {
        URL_SAFE.encode(self.0)
    }

    /// Decode a key previously produced by [`CacheKey::to_encoded`]
    pub fn from_encoded(encoded: &str) -> Result<Self, CacheError> {
        let bytes = URL_SAFE
            .decode(encoded)
            .map_err(|_| CacheError::InvalidKey {
                key: encoded.to_string(),
            })?;

        let digest: [u8; 32] = bytes.try_into().map_err(|_| CacheError::InvalidKey {
            key: encoded.to_string(),
        })?;

        Ok(Self(digest))
    }

    /// File name of the entry for this key, e.g. `<key>.cache`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.to_encoded(), cache::ENTRY_EXTENSION)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_encoded())
    }
}

impl FromStr for CacheKey {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_encoded(s)
    }
}

impl Serialize for CacheKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_encoded())
    }
}

impl<'de> Deserialize<'de> for CacheKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        Self::from_encoded(&encoded).map_err(serde::de::Error::custom)
    }
}
