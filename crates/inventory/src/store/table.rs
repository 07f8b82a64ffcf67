//! [`ItemTable`]: the key-value table seam beneath the record store.

use async_trait::async_trait;
use common::protocol::StoredItem;
use thiserror::Error;

use crate::record::UpdateSpec;

/// Errors from a table backend.
#[derive(Debug, Error)]
pub enum TableError {
    /// The update precondition (`attribute_exists(id)`) did not hold.
    #[error("conditional check failed")]
    ConditionFailed,

    /// The backend call itself failed.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// The backend returned a row this service cannot interpret at all.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Raw storage operations over rows keyed by `id`.
///
/// Backends store and return rows exactly as given; encryption happens above
/// this layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemTable: Send + Sync {
    /// Write `row` unconditionally.
    async fn put(&self, row: StoredItem) -> Result<(), TableError>;

    /// Return every row. Order is unspecified.
    async fn scan(&self) -> Result<Vec<StoredItem>, TableError>;

    /// Apply `spec` to the row with `id` if it exists and return the updated row.
    ///
    /// Returns [`TableError::ConditionFailed`] when the row is absent.
    async fn update(&self, id: &str, spec: &UpdateSpec) -> Result<StoredItem, TableError>;

    /// Remove the row with `id`, returning its prior value if there was one.
    async fn delete(&self, id: &str) -> Result<Option<StoredItem>, TableError>;
}
