//! [`MemoryTable`]: in-process [`ItemTable`] for local runs and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::protocol::StoredItem;
use tokio::sync::RwLock;

use super::table::{ItemTable, TableError};
use crate::record::{UpdateSpec, ATTR_NAME, ATTR_PRICE, ATTR_STOCK};

/// Rows held in a `HashMap` behind an async `RwLock`.
///
/// The write lock is the serialisation point, playing the role the table
/// service plays in production: concurrent updates to one id apply in lock
/// acquisition order.
#[derive(Clone, Debug, Default)]
pub struct MemoryTable {
    rows: Arc<RwLock<HashMap<String, StoredItem>>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored.
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Fetch a row by id without decoding it.
    #[cfg(test)]
    pub async fn get(&self, id: &str) -> Option<StoredItem> {
        self.rows.read().await.get(id).cloned()
    }
}

#[async_trait]
impl ItemTable for MemoryTable {
    async fn put(&self, row: StoredItem) -> Result<(), TableError> {
        self.rows.write().await.insert(row.id.clone(), row);
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<StoredItem>, TableError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn update(&self, id: &str, spec: &UpdateSpec) -> Result<StoredItem, TableError> {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(id).ok_or(TableError::ConditionFailed)?;
        for (attribute, value) in spec.resolved() {
            match attribute {
                ATTR_NAME => row.name = value.to_owned(),
                ATTR_STOCK => row.stock = value.to_owned(),
                ATTR_PRICE => row.price = value.to_owned(),
                other => {
                    return Err(TableError::Backend(format!(
                        "unknown attribute in update: {other}"
                    )))
                }
            }
        }
        Ok(row.clone())
    }

    async fn delete(&self, id: &str) -> Result<Option<StoredItem>, TableError> {
        Ok(self.rows.write().await.remove(id))
    }
}
