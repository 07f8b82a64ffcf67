//! [`RecordCodec`]: encrypts records on the way into storage and decrypts them on the way out.

use common::protocol::{Item, ItemView, StoredItem};
use thiserror::Error;
use tracing::warn;

use crate::crypto::{CipherError, FieldCipher};

use super::{ATTR_NAME, ATTR_PRICE, ATTR_STOCK};

/// Why a stored row could not be turned back into an [`Item`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A field did not decrypt under the current key.
    #[error("field `{field}` failed to decrypt: {source}")]
    Cipher {
        field: &'static str,
        #[source]
        source: CipherError,
    },

    /// A numeric field decrypted to something that is not a number.
    #[error("field `{field}` is not a valid number")]
    InvalidNumber { field: &'static str },
}

/// Record-level encryption built on a single [`FieldCipher`].
#[derive(Clone, Debug)]
pub struct RecordCodec {
    cipher: FieldCipher,
}

impl RecordCodec {
    pub fn new(cipher: FieldCipher) -> Self {
        Self { cipher }
    }

    /// Encrypt the sensitive fields of `item`; `id` passes through.
    pub fn to_storage(&self, item: &Item) -> StoredItem {
        StoredItem {
            id: item.id.clone(),
            name: self.encrypt_name(&item.name),
            stock: self.encrypt_stock(item.stock),
            price: self.encrypt_price(item.price),
        }
    }

    /// Decrypt a stored row.
    ///
    /// The three sensitive fields succeed or fail as a unit: if any one of them
    /// cannot be decrypted or parsed, the row is returned untouched as
    /// [`ItemView::Raw`] so it stays visible to callers.
    pub fn from_storage(&self, row: StoredItem) -> ItemView {
        match self.decode(&row) {
            Ok(item) => ItemView::Decrypted(item),
            Err(e) => {
                warn!(id = %row.id, error = %e, "returning stored row undecrypted");
                ItemView::Raw(row)
            }
        }
    }

    pub fn encrypt_name(&self, name: &str) -> String {
        self.cipher.encrypt(name)
    }

    pub fn encrypt_stock(&self, stock: i64) -> String {
        self.cipher.encrypt(&stock.to_string())
    }

    pub fn encrypt_price(&self, price: f64) -> String {
        self.cipher.encrypt(&price.to_string())
    }

    fn decode(&self, row: &StoredItem) -> Result<Item, DecodeError> {
        let name = self.decrypt(ATTR_NAME, &row.name)?;
        let stock = self
            .decrypt(ATTR_STOCK, &row.stock)?
            .parse::<i64>()
            .map_err(|_| DecodeError::InvalidNumber { field: ATTR_STOCK })?;
        let price = self
            .decrypt(ATTR_PRICE, &row.price)?
            .parse::<f64>()
            .map_err(|_| DecodeError::InvalidNumber { field: ATTR_PRICE })?;

        Ok(Item {
            id: row.id.clone(),
            name,
            stock,
            price,
        })
    }

    fn decrypt(&self, field: &'static str, value: &str) -> Result<String, DecodeError> {
        self.cipher
            .decrypt(value)
            .map_err(|source| DecodeError::Cipher { field, source })
    }
}
