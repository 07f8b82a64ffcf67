//! Request and response types exchanged over the public HTTP API.
//!
//! Plaintext records travel as [`Item`]; rows that could not be decrypted travel
//! as [`StoredItem`] with their at-rest cipher strings untouched.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A decrypted inventory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Server-generated identifier; the table partition key.
    pub id: String,
    pub name: String,
    pub stock: i64,
    pub price: f64,
}

/// The at-rest layout of a record.
///
/// `name`, `stock` and `price` hold `hex(iv):hex(ciphertext)` strings for any
/// row written by this service. Legacy or corrupt rows may hold anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredItem {
    pub id: String,
    pub name: String,
    pub stock: String,
    pub price: String,
}

/// Result of decoding a stored row.
///
/// Serialised untagged, so a raw row appears on the wire with string
/// `stock`/`price` values and callers can tell the two apart by type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemView {
    /// All sensitive fields decrypted and parsed.
    Decrypted(Item),
    /// Decryption failed; the row is returned exactly as stored.
    Raw(StoredItem),
}

impl ItemView {
    /// Identifier of the underlying record, whichever variant this is.
    pub fn id(&self) -> &str {
        match self {
            ItemView::Decrypted(item) => &item.id,
            ItemView::Raw(row) => &row.id,
        }
    }

    /// The name as the caller sees it: plaintext when decrypted, the stored string otherwise.
    pub fn name(&self) -> &str {
        match self {
            ItemView::Decrypted(item) => &item.name,
            ItemView::Raw(row) => &row.name,
        }
    }

    /// Returns the decrypted record, if decryption succeeded.
    pub fn as_decrypted(&self) -> Option<&Item> {
        match self {
            ItemView::Decrypted(item) => Some(item),
            ItemView::Raw(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Request body for `POST /items`.
///
/// Every field is optional at the type level so that absence can be reported
/// as a validation error rather than a deserialisation failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateItemRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "whole_number::option")]
    pub stock: Option<i64>,
    pub price: Option<f64>,
}

/// Successful response body for `POST /items` (`201 Created`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemResponse {
    pub message: String,
    #[serde(flatten)]
    pub item: Item,
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// Query string for `GET /items`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListItemsQuery {
    /// Case-insensitive substring filter applied to decrypted names.
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Update / Delete
// ---------------------------------------------------------------------------

/// Query string for `PUT /items` and `DELETE /items`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemIdQuery {
    pub id: Option<String>,
}

/// Request body for `PUT /items?id=...`.
///
/// A field is updated when its key is present with a non-null value, regardless
/// of whether that value is zero or empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "whole_number::option")]
    pub stock: Option<i64>,
    pub price: Option<f64>,
}

/// Successful response body for `PUT /items?id=...`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemResponse {
    pub message: String,
    pub item: ItemView,
}

/// Successful response body for `DELETE /items?id=...`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteItemResponse {
    pub message: String,
    #[serde(rename = "deletedItem")]
    pub deleted_item: ItemView,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(err: &crate::ServiceError) -> Self {
        Self::new(err.code(), err.public_message())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status; always `"ok"` once the server is listening.
    pub status: String,
    /// Crate version of the running binary.
    pub version: String,
}

/// Integer fields that also accept whole-number floats such as `10.0`.
mod whole_number {
    use super::*;

    struct WholeNumber(i64);

    struct WholeNumberVisitor;

    impl<'de> de::Visitor<'de> for WholeNumberVisitor {
        type Value = WholeNumber;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a whole number")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<WholeNumber, E> {
            Ok(WholeNumber(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<WholeNumber, E> {
            i64::try_from(v)
                .map(WholeNumber)
                .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<WholeNumber, E> {
            // 2^63 is exactly representable; anything at or above it overflows.
            const LIMIT: f64 = 9_223_372_036_854_775_808.0;
            if v.is_finite() && v.fract() == 0.0 && (-LIMIT..LIMIT).contains(&v) {
                Ok(WholeNumber(v as i64))
            } else {
                Err(E::invalid_value(de::Unexpected::Float(v), &self))
            }
        }
    }

    impl<'de> Deserialize<'de> for WholeNumber {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            d.deserialize_any(WholeNumberVisitor)
        }
    }

    pub(super) fn option<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(Option::<WholeNumber>::deserialize(d)?.map(|n| n.0))
    }
}
