//! AES-256-CBC encryption and decryption of individual string fields.
//!
//! **Padding:** PKCS#7. A wrong key or a tampered ciphertext almost always
//! surfaces as a padding failure; the rare case where garbage unpads cleanly is
//! caught by the UTF-8 check on the recovered plaintext.
//!
//! **Do NOT reuse an IV.** [`FieldCipher::encrypt`] draws a fresh one from the
//! OS CSPRNG on every call.

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

use crate::key::SecretKey;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of a CBC initialisation vector (one AES block).
pub const IV_LEN: usize = 16;

/// Separator between the hex IV and the hex ciphertext.
pub const SEPARATOR: char = ':';

/// A parsed, encrypted field value.
///
/// The string representation is `<hex(iv)>:<hex(ciphertext)>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedField {
    /// Raw IV bytes.
    pub iv: [u8; IV_LEN],
    /// Raw ciphertext bytes; always a non-zero multiple of the block size.
    pub ciphertext: Vec<u8>,
}

impl EncryptedField {
    /// Encode this value to its canonical string representation.
    pub fn to_string_repr(&self) -> String {
        format!(
            "{}{}{}",
            hex::encode(self.iv),
            SEPARATOR,
            hex::encode(&self.ciphertext)
        )
    }

    /// Parse an encrypted field string back into an [`EncryptedField`].
    ///
    /// Splits on the first `:`.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidFormat`] if the separator is missing, either
    /// half is not hex, the IV is not [`IV_LEN`] bytes, or the ciphertext is not
    /// a whole number of blocks.
    pub fn from_str(s: &str) -> Result<Self, CipherError> {
        let (iv_hex, ct_hex) = s.split_once(SEPARATOR).ok_or(CipherError::InvalidFormat)?;

        let iv_bytes = hex::decode(iv_hex).map_err(|_| CipherError::InvalidFormat)?;
        if iv_bytes.len() != IV_LEN {
            return Err(CipherError::InvalidFormat);
        }
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&iv_bytes);

        let ciphertext = hex::decode(ct_hex).map_err(|_| CipherError::InvalidFormat)?;
        if ciphertext.is_empty() || ciphertext.len() % IV_LEN != 0 {
            return Err(CipherError::InvalidFormat);
        }

        Ok(Self { iv, ciphertext })
    }
}

/// Errors produced by the cipher layer.
///
/// Every variant is a decryption failure; encryption with a loaded key cannot fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The serialised value does not match the `iv:ciphertext` structure.
    #[error("invalid encrypted field format")]
    InvalidFormat,

    /// Unpadding failed: wrong key or tampered ciphertext.
    #[error("decryption failed: bad padding")]
    BadPadding,

    /// The recovered bytes are not UTF-8.
    #[error("decryption failed: plaintext is not valid UTF-8")]
    InvalidPlaintext,
}

/// Stateless encrypt/decrypt of single string values under the secret key.
#[derive(Clone, Debug)]
pub struct FieldCipher {
    key: SecretKey,
}

impl FieldCipher {
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }

    /// Encrypt `plaintext` under a fresh random IV and return the serialised form.
    pub fn encrypt(&self, plaintext: &str) -> String {
        self.encrypt_field(plaintext.as_bytes()).to_string_repr()
    }

    /// Parse and decrypt a serialised `iv:ciphertext` value.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError`] if the input is malformed, the padding is corrupt,
    /// or the plaintext is not UTF-8 (typically: encrypted under another key).
    pub fn decrypt(&self, serialized: &str) -> Result<String, CipherError> {
        let field = EncryptedField::from_str(serialized)?;
        let bytes = self.decrypt_field(&field)?;
        String::from_utf8(bytes).map_err(|_| CipherError::InvalidPlaintext)
    }

    /// Encrypt raw bytes under a fresh random IV.
    pub fn encrypt_field(&self, plaintext: &[u8]) -> EncryptedField {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new(self.key.as_bytes().into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        EncryptedField { iv, ciphertext }
    }

    /// Decrypt an [`EncryptedField`] back to plaintext bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::BadPadding`] if unpadding fails.
    pub fn decrypt_field(&self, field: &EncryptedField) -> Result<Vec<u8>, CipherError> {
        Aes256CbcDec::new(self.key.as_bytes().into(), &field.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&field.ciphertext)
            .map_err(|_| CipherError::BadPadding)
    }
}
