//! Record store: create, read, update and delete over an encrypted key-value table.
//!
//! # Responsibilities
//!
//! - Validate inbound fields before any storage call.
//! - Encrypt on the way in and decrypt on the way out via [`RecordCodec`].
//! - Translate backend outcomes (`ConditionFailed`, absent prior value) into
//!   [`RecordError::NotFound`].
//!
//! # Scalability ceiling
//!
//! Reads are full table scans and the name filter runs after decryption.
//! Ciphertext uses a random IV per value, so no server-side equality or prefix
//! index over names is possible without searchable encryption.

pub mod dynamo;
pub mod memory;
pub mod table;

pub use dynamo::DynamoTable;
pub use memory::MemoryTable;
pub use table::{ItemTable, TableError};

use std::sync::Arc;

use common::protocol::{CreateItemRequest, Item, ItemView};
use common::ServiceError;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::record::{build_update, ItemPatch, RecordCodec, UpdateError};

/// Errors from [`RecordStore`] operations.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Missing or out-of-range input.
    #[error("{0}")]
    Validation(String),

    /// An update supplied none of `name`, `stock`, `price`.
    #[error("no fields to update")]
    NoFieldsToUpdate,

    /// The target id does not exist.
    #[error("item not found: {0}")]
    NotFound(String),

    /// The backend call failed.
    #[error(transparent)]
    Storage(#[from] TableError),
}

impl From<UpdateError> for RecordError {
    fn from(err: UpdateError) -> Self {
        match err {
            UpdateError::NoFieldsToUpdate => RecordError::NoFieldsToUpdate,
        }
    }
}

impl From<RecordError> for ServiceError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Validation(msg) => ServiceError::BadRequest(msg),
            RecordError::NoFieldsToUpdate => ServiceError::BadRequest("no fields to update".into()),
            RecordError::NotFound(_) => ServiceError::NotFound("item not found".into()),
            RecordError::Storage(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

/// Validated fields for a new record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub stock: i64,
    pub price: f64,
}

impl TryFrom<CreateItemRequest> for NewItem {
    type Error = RecordError;

    /// Presence is what counts: `stock: 0` and `price: 0` are accepted.
    fn try_from(req: CreateItemRequest) -> Result<Self, Self::Error> {
        let (name, stock, price) = match (req.name, req.stock, req.price) {
            (Some(name), Some(stock), Some(price)) => (name, stock, price),
            (name, stock, price) => {
                let missing: Vec<&str> = [
                    ("name", name.is_none()),
                    ("stock", stock.is_none()),
                    ("price", price.is_none()),
                ]
                .into_iter()
                .filter_map(|(field, absent)| absent.then_some(field))
                .collect();
                return Err(RecordError::Validation(format!(
                    "missing required fields: {}",
                    missing.join(", ")
                )));
            }
        };
        validate_stock(stock)?;
        validate_price(price)?;
        Ok(Self { name, stock, price })
    }
}

fn validate_stock(stock: i64) -> Result<(), RecordError> {
    if stock < 0 {
        return Err(RecordError::Validation("stock must be >= 0".into()));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<(), RecordError> {
    if !price.is_finite() || price < 0.0 {
        return Err(RecordError::Validation(
            "price must be a finite number >= 0".into(),
        ));
    }
    Ok(())
}

fn validate_id(id: &str) -> Result<(), RecordError> {
    if id.trim().is_empty() {
        return Err(RecordError::Validation("missing id".into()));
    }
    Ok(())
}

/// Generate a fresh record id. No uniqueness check is made against storage.
fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Facade over an [`ItemTable`] that applies field encryption.
///
/// Cheap to clone; every clone shares the same table and key.
#[derive(Clone)]
pub struct RecordStore {
    table: Arc<dyn ItemTable>,
    codec: RecordCodec,
}

impl RecordStore {
    pub fn new(table: Arc<dyn ItemTable>, codec: RecordCodec) -> Self {
        Self { table, codec }
    }

    /// Create a record with a newly generated id and return its plaintext view.
    ///
    /// # Errors
    ///
    /// [`RecordError::Validation`] if a field is missing or out of range;
    /// [`RecordError::Storage`] if the write fails.
    pub async fn create(&self, req: CreateItemRequest) -> Result<Item, RecordError> {
        let new = NewItem::try_from(req)?;
        let item = Item {
            id: generate_id(),
            name: new.name,
            stock: new.stock,
            price: new.price,
        };

        self.table
            .put(self.codec.to_storage(&item))
            .await
            .map_err(|e| storage_failure("create", &item.id, e))?;

        info!(id = %item.id, "item created");
        Ok(item)
    }

    /// Return every record, optionally keeping only names that contain `name_filter`.
    ///
    /// The filter is case-insensitive and applied after decryption. Rows that
    /// fail to decrypt are matched against their stored `name` as-is.
    pub async fn list(&self, name_filter: Option<&str>) -> Result<Vec<ItemView>, RecordError> {
        let rows = self
            .table
            .scan()
            .await
            .map_err(|e| storage_failure("list", "*", e))?;
        let scanned = rows.len();

        let needle = name_filter
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase);
        let views: Vec<ItemView> = rows
            .into_iter()
            .map(|row| self.codec.from_storage(row))
            .filter(|view| match &needle {
                Some(needle) => view.name().to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .collect();

        debug!(scanned, returned = views.len(), "items listed");
        Ok(views)
    }

    /// Apply a partial update to an existing record and return its new state.
    ///
    /// # Errors
    ///
    /// [`RecordError::NoFieldsToUpdate`] before any storage call if `patch` is
    /// empty; [`RecordError::NotFound`] if `id` does not exist.
    pub async fn update(&self, id: &str, patch: ItemPatch) -> Result<ItemView, RecordError> {
        validate_id(id)?;
        if let Some(stock) = patch.stock {
            validate_stock(stock)?;
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
        }
        let spec = build_update(&patch, &self.codec)?;

        let row = match self.table.update(id, &spec).await {
            Ok(row) => row,
            Err(TableError::ConditionFailed) => return Err(RecordError::NotFound(id.to_owned())),
            Err(e) => return Err(storage_failure("update", id, e)),
        };

        info!(id, fields = spec.assignments.len(), "item updated");
        Ok(self.codec.from_storage(row))
    }

    /// Delete a record and return its last known state.
    ///
    /// # Errors
    ///
    /// [`RecordError::NotFound`] if `id` does not exist.
    pub async fn delete(&self, id: &str) -> Result<ItemView, RecordError> {
        validate_id(id)?;
        let prior = self
            .table
            .delete(id)
            .await
            .map_err(|e| storage_failure("delete", id, e))?
            .ok_or_else(|| RecordError::NotFound(id.to_owned()))?;

        info!(id, "item deleted");
        Ok(self.codec.from_storage(prior))
    }
}

fn storage_failure(op: &'static str, id: &str, err: TableError) -> RecordError {
    error!(op, id, error = %err, "storage call failed");
    RecordError::Storage(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{FieldCipher, KEY_LEN};
    use crate::key::SecretKey;
    use crate::store::table::MockItemTable;
    use common::protocol::StoredItem;

    fn codec() -> RecordCodec {
        let key = SecretKey::from_bytes(&[0x42u8; KEY_LEN]).unwrap();
        RecordCodec::new(FieldCipher::new(key))
    }

    fn memory_store() -> (RecordStore, MemoryTable) {
        let table = MemoryTable::new();
        (RecordStore::new(Arc::new(table.clone()), codec()), table)
    }

    fn create_req(name: &str, stock: i64, price: f64) -> CreateItemRequest {
        CreateItemRequest {
            name: Some(name.into()),
            stock: Some(stock),
            price: Some(price),
        }
    }

    fn is_cipher_form(s: &str) -> bool {
        s.split_once(':').is_some_and(|(iv, ct)| {
            !iv.is_empty()
                && !ct.is_empty()
                && iv.chars().chain(ct.chars()).all(|c| matches!(c, '0'..='9' | 'a'..='f'))
        })
    }

    #[tokio::test]
    async fn create_encrypts_at_rest() {
        let (store, table) = memory_store();
        let item = store.create(create_req("apple", 10, 2.5)).await.unwrap();
        assert!(!item.id.is_empty());
        assert_eq!(item.name, "apple");

        let row = table.get(&item.id).await.unwrap();
        assert!(is_cipher_form(&row.name), "name not encrypted: {}", row.name);
        assert!(is_cipher_form(&row.stock));
        assert!(is_cipher_form(&row.price));
    }

    #[tokio::test]
    async fn create_generates_distinct_ids() {
        let (store, table) = memory_store();
        let a = store.create(create_req("a", 1, 1.0)).await.unwrap();
        let b = store.create(create_req("a", 1, 1.0)).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(table.len().await, 2);
    }

    #[tokio::test]
    async fn create_accepts_zero_stock_and_price() {
        let (store, _) = memory_store();
        let item = store.create(create_req("free", 0, 0.0)).await.unwrap();
        assert_eq!(item.stock, 0);
        assert_eq!(item.price, 0.0);
    }

    #[tokio::test]
    async fn create_rejects_missing_fields() {
        let (store, table) = memory_store();
        for req in [
            CreateItemRequest {
                name: None,
                ..create_req("x", 1, 1.0)
            },
            CreateItemRequest {
                stock: None,
                ..create_req("x", 1, 1.0)
            },
            CreateItemRequest {
                price: None,
                ..create_req("x", 1, 1.0)
            },
        ] {
            let err = store.create(req).await.unwrap_err();
            assert!(matches!(err, RecordError::Validation(_)));
        }
        assert_eq!(table.len().await, 0);
    }

    #[tokio::test]
    async fn create_reports_every_missing_field() {
        let (store, _) = memory_store();
        let err = store.create(CreateItemRequest::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "missing required fields: name, stock, price");
    }

    #[tokio::test]
    async fn create_rejects_negative_stock() {
        let (store, _) = memory_store();
        let err = store.create(create_req("x", -1, 1.0)).await.unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));
    }

    #[tokio::test]
    async fn list_filters_after_decryption() {
        let (store, _) = memory_store();
        store.create(create_req("apple", 10, 2.5)).await.unwrap();
        store.create(create_req("banana", 5, 1.0)).await.unwrap();

        let all = store.list(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = store.list(Some("APPL")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name(), "apple");

        assert!(store.list(Some("cherry")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_keeps_undecryptable_rows() {
        let (store, table) = memory_store();
        store.create(create_req("apple", 10, 2.5)).await.unwrap();
        let legacy = StoredItem {
            id: "legacy".into(),
            name: "old pear".into(),
            stock: "7".into(),
            price: "1".into(),
        };
        table.put(legacy.clone()).await.unwrap();

        let all = store.list(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&ItemView::Raw(legacy.clone())));

        let pears = store.list(Some("pear")).await.unwrap();
        assert_eq!(pears, vec![ItemView::Raw(legacy)]);
    }

    #[tokio::test]
    async fn update_to_zero_stock() {
        let (store, _) = memory_store();
        let item = store.create(create_req("apple", 10, 2.5)).await.unwrap();
        let patch = ItemPatch {
            stock: Some(0),
            ..Default::default()
        };
        let view = store.update(&item.id, patch).await.unwrap();
        let updated = view.as_decrypted().unwrap();
        assert_eq!(updated.stock, 0);
        assert_eq!(updated.name, "apple");
        assert_eq!(updated.price, 2.5);
    }

    #[tokio::test]
    async fn update_missing_id_is_not_found() {
        let (store, table) = memory_store();
        store.create(create_req("apple", 10, 2.5)).await.unwrap();
        let before = table.scan().await.unwrap();

        let patch = ItemPatch {
            name: Some("pear".into()),
            ..Default::default()
        };
        let err = store.update("does-not-exist", patch).await.unwrap_err();
        assert!(matches!(err, RecordError::NotFound(_)));
        assert_eq!(table.scan().await.unwrap(), before);
    }

    #[tokio::test]
    async fn empty_update_makes_no_storage_call() {
        let mut mock = MockItemTable::new();
        mock.expect_update().never();
        mock.expect_put().never();
        mock.expect_scan().never();
        mock.expect_delete().never();
        let store = RecordStore::new(Arc::new(mock), codec());

        let err = store.update("some-id", ItemPatch::default()).await.unwrap_err();
        assert!(matches!(err, RecordError::NoFieldsToUpdate));
    }

    #[tokio::test]
    async fn blank_id_is_rejected_before_storage() {
        let mut mock = MockItemTable::new();
        mock.expect_update().never();
        mock.expect_delete().never();
        let store = RecordStore::new(Arc::new(mock), codec());

        let patch = ItemPatch {
            stock: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            store.update("  ", patch).await,
            Err(RecordError::Validation(_))
        ));
        assert!(matches!(store.delete("").await, Err(RecordError::Validation(_))));
    }

    #[tokio::test]
    async fn backend_failure_surfaces_as_storage_error() {
        let mut mock = MockItemTable::new();
        mock.expect_scan()
            .times(1)
            .returning(|| Err(TableError::Backend("throttled".into())));
        let store = RecordStore::new(Arc::new(mock), codec());

        let err = store.list(None).await.unwrap_err();
        assert!(matches!(err, RecordError::Storage(_)));
        let public = ServiceError::from(err);
        assert_eq!(public.http_status(), 500);
        assert_eq!(public.public_message(), "internal server error");
    }

    #[tokio::test]
    async fn delete_returns_last_state_then_not_found() {
        let (store, table) = memory_store();
        let item = store.create(create_req("apple", 10, 2.5)).await.unwrap();

        let deleted = store.delete(&item.id).await.unwrap();
        assert_eq!(deleted, ItemView::Decrypted(item.clone()));
        assert_eq!(table.len().await, 0);

        let err = store.delete(&item.id).await.unwrap_err();
        assert!(matches!(err, RecordError::NotFound(_)));
    }
}
