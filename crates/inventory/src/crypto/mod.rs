//! AES-256-CBC field encryption primitives.
//!
//! This module is intentionally free of storage and HTTP dependencies.
//! It provides the low-level encrypt/decrypt operations used by the record codec.
//!
//! # Ciphertext format
//!
//! ```text
//! <hex(iv)>:<hex(ciphertext)>
//! ```
//!
//! The IV is 16 random bytes drawn per call, so equal plaintexts never share a
//! stored representation.

pub mod cipher;

pub use cipher::{CipherError, FieldCipher, KEY_LEN};
