//! [`SecretKey`]: the process-wide AES-256 key used for field encryption.
//!
//! # Lifecycle
//!
//! 1. At startup the 64-character hex `SECRET_KEY` is decoded by
//!    [`SecretKey::from_hex`]; any failure aborts startup.
//! 2. The key is wrapped in an `Arc` and shared read-only for the rest of the
//!    process. It is never re-read, rotated, or replaced.
//!
//! # Security invariants
//!
//! - Key bytes are **never** logged, formatted, or included in traces.
//! - The buffer is overwritten with zeroes when the last reference is dropped.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::crypto::KEY_LEN;

/// Errors produced while loading the secret key.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The configured value is not valid hexadecimal.
    #[error("secret key is not valid hex")]
    InvalidHex,

    /// The decoded key material has an unexpected length.
    #[error("secret key has invalid length: expected {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
struct KeyBytes(Box<[u8; KEY_LEN]>);

impl Drop for KeyBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

/// Immutable, cheaply cloneable handle to the secret key.
///
/// Deserialises from the hex string form, so a bad key fails configuration loading.
#[derive(Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct SecretKey {
    inner: Arc<KeyBytes>,
}

impl SecretKey {
    /// Decode a key from its 64-character hex representation.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidHex`] if `encoded` is not hex, or
    /// [`KeyError::InvalidLength`] if it does not decode to [`KEY_LEN`] bytes.
    pub fn from_hex(encoded: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(encoded.trim()).map_err(|_| KeyError::InvalidHex)?;
        Self::from_bytes(&bytes)
    }

    /// Build a key from raw bytes, which must be exactly [`KEY_LEN`] long.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidLength`] if the slice has the wrong length.
    pub fn from_bytes(key_bytes: &[u8]) -> Result<Self, KeyError> {
        if key_bytes.len() != KEY_LEN {
            return Err(KeyError::InvalidLength(key_bytes.len()));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(key_bytes);
        Ok(Self {
            inner: Arc::new(KeyBytes(buf)),
        })
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.inner.0
    }
}

impl TryFrom<String> for SecretKey {
    type Error = KeyError;

    fn try_from(encoded: String) -> Result<Self, Self::Error> {
        Self::from_hex(&encoded)
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("SecretKey([REDACTED])")
    }
}
