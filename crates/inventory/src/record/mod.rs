//! Mapping between plaintext records and their encrypted at-rest form.
//!
//! # Module invariants
//!
//! - `id` is never encrypted and never derived from content.
//! - `name`, `stock` and `price` are encrypted independently, each under its own IV.
//! - Numeric fields are stringified in decimal before encryption and re-parsed
//!   only after a successful decryption.

pub mod codec;
pub mod update;

pub use codec::RecordCodec;
pub use update::{build_update, ItemPatch, UpdateError, UpdateSpec};

/// Partition key attribute.
pub const ATTR_ID: &str = "id";
pub const ATTR_NAME: &str = "name";
pub const ATTR_STOCK: &str = "stock";
pub const ATTR_PRICE: &str = "price";
