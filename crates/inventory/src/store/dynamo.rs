//! [`DynamoTable`]: [`ItemTable`] backed by an AWS DynamoDB table.
//!
//! The table's partition key is `id` (string). Every other attribute is a
//! string holding a serialised cipher value.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::DisplayErrorContext,
    types::{AttributeValue, ReturnValue},
    Client,
};
use common::protocol::StoredItem;
use tracing::{debug, warn};

use super::table::{ItemTable, TableError};
use crate::record::{UpdateSpec, ATTR_ID, ATTR_NAME, ATTR_PRICE, ATTR_STOCK};

type Attributes = HashMap<String, AttributeValue>;

/// DynamoDB-backed table.
#[derive(Clone, Debug)]
pub struct DynamoTable {
    client: Client,
    table_name: String,
}

impl DynamoTable {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn key(id: &str) -> (String, AttributeValue) {
        (ATTR_ID.to_owned(), AttributeValue::S(id.to_owned()))
    }
}

#[async_trait]
impl ItemTable for DynamoTable {
    async fn put(&self, row: StoredItem) -> Result<(), TableError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_attributes(row)))
            .send()
            .await
            .map_err(|e| TableError::Backend(DisplayErrorContext(e).to_string()))?;
        Ok(())
    }

    /// Full table scan, following `LastEvaluatedKey` until exhausted.
    async fn scan(&self) -> Result<Vec<StoredItem>, TableError> {
        let mut rows = Vec::new();
        let mut start_key: Option<Attributes> = None;
        let mut pages = 0usize;

        loop {
            let out = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| TableError::Backend(DisplayErrorContext(e).to_string()))?;
            pages += 1;

            for attrs in out.items() {
                match from_attributes(attrs) {
                    Ok(row) => rows.push(row),
                    // A row without a string id cannot be addressed; skip it.
                    Err(e) => warn!(error = %e, "skipping unreadable row during scan"),
                }
            }

            match out.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        debug!(pages, rows = rows.len(), "scan complete");
        Ok(rows)
    }

    async fn update(&self, id: &str, spec: &UpdateSpec) -> Result<StoredItem, TableError> {
        let (key_name, key_value) = Self::key(id);
        let mut req = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(key_name, key_value)
            .update_expression(spec.update_expression())
            .condition_expression(&spec.condition)
            .return_values(ReturnValue::AllNew);
        for (placeholder, attribute) in &spec.names {
            req = req.expression_attribute_names(placeholder, attribute);
        }
        for (placeholder, value) in &spec.values {
            req = req.expression_attribute_values(placeholder, AttributeValue::S(value.clone()));
        }

        match req.send().await {
            Ok(out) => out
                .attributes()
                .map(from_attributes)
                .transpose()?
                .ok_or_else(|| TableError::Corrupt(format!("update of {id} returned no attributes"))),
            Err(e) => {
                let condition_failed = e
                    .as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception());
                if condition_failed {
                    Err(TableError::ConditionFailed)
                } else {
                    Err(TableError::Backend(DisplayErrorContext(e).to_string()))
                }
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<Option<StoredItem>, TableError> {
        let (key_name, key_value) = Self::key(id);
        let out = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key(key_name, key_value)
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| TableError::Backend(DisplayErrorContext(e).to_string()))?;

        out.attributes()
            .filter(|attrs| !attrs.is_empty())
            .map(from_attributes)
            .transpose()
    }
}

fn to_attributes(row: StoredItem) -> Attributes {
    HashMap::from([
        (ATTR_ID.to_owned(), AttributeValue::S(row.id)),
        (ATTR_NAME.to_owned(), AttributeValue::S(row.name)),
        (ATTR_STOCK.to_owned(), AttributeValue::S(row.stock)),
        (ATTR_PRICE.to_owned(), AttributeValue::S(row.price)),
    ])
}

/// Convert a DynamoDB item into a [`StoredItem`].
///
/// Only `id` is mandatory. Sensitive attributes that are missing or of an
/// unexpected type become whatever text can be recovered (or an empty string),
/// which the codec then reports as undecryptable instead of dropping the row.
fn from_attributes(attrs: &Attributes) -> Result<StoredItem, TableError> {
    let id = match attrs.get(ATTR_ID) {
        Some(AttributeValue::S(id)) => id.clone(),
        _ => return Err(TableError::Corrupt("row has no string `id`".into())),
    };
    Ok(StoredItem {
        name: text_of(attrs.get(ATTR_NAME)),
        stock: text_of(attrs.get(ATTR_STOCK)),
        price: text_of(attrs.get(ATTR_PRICE)),
        id,
    })
}

fn text_of(value: Option<&AttributeValue>) -> String {
    match value {
        Some(AttributeValue::S(s)) | Some(AttributeValue::N(s)) => s.clone(),
        Some(AttributeValue::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
    use aws_smithy_http_client::test_util::{ReplayEvent, StaticReplayClient};
    use aws_smithy_types::body::SdkBody;
    use axum::http;

    use crate::crypto::{FieldCipher, KEY_LEN};
    use crate::key::SecretKey;
    use crate::record::{build_update, ItemPatch, RecordCodec};

    /// A table whose client answers its single call with `status` and `body`.
    fn replay_table(status: u16, body: &'static str) -> DynamoTable {
        let request = http::Request::builder()
            .uri("https://dynamodb.us-east-1.amazonaws.com/")
            .body(SdkBody::empty())
            .unwrap();
        let response = http::Response::builder()
            .status(status)
            .header("content-type", "application/x-amz-json-1.0")
            .body(SdkBody::from(body))
            .unwrap();
        let http_client = StaticReplayClient::new(vec![ReplayEvent::new(request, response)]);

        let conf = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("akid", "secret", None, None, "test"))
            .http_client(http_client)
            .build();
        DynamoTable::new(Client::from_conf(conf), "items")
    }

    fn row() -> StoredItem {
        StoredItem {
            id: "abc".into(),
            name: "00:11".into(),
            stock: "22:33".into(),
            price: "44:55".into(),
        }
    }

    #[test]
    fn attributes_round_trip() {
        let attrs = to_attributes(row());
        assert_eq!(attrs.len(), 4);
        assert_eq!(from_attributes(&attrs).unwrap(), row());
    }

    #[test]
    fn missing_id_is_corrupt() {
        let mut attrs = to_attributes(row());
        attrs.remove(ATTR_ID);
        assert!(matches!(from_attributes(&attrs), Err(TableError::Corrupt(_))));
    }

    #[test]
    fn legacy_numeric_attribute_is_kept_as_text() {
        let mut attrs = to_attributes(row());
        attrs.insert(ATTR_STOCK.into(), AttributeValue::N("10".into()));
        attrs.remove(ATTR_PRICE);
        let stored = from_attributes(&attrs).unwrap();
        assert_eq!(stored.stock, "10");
        assert_eq!(stored.price, "");
    }

    #[tokio::test]
    async fn update_of_missing_row_is_condition_failed() {
        let table = replay_table(
            400,
            r#"{"__type":"com.amazonaws.dynamodb.v20120810#ConditionalCheckFailedException","message":"The conditional request failed"}"#,
        );
        let codec = RecordCodec::new(FieldCipher::new(
            SecretKey::from_bytes(&[0x42u8; KEY_LEN]).unwrap(),
        ));
        let patch = ItemPatch {
            stock: Some(0),
            ..Default::default()
        };
        let spec = build_update(&patch, &codec).unwrap();

        let err = table.update("ghost", &spec).await.unwrap_err();
        assert!(matches!(err, TableError::ConditionFailed), "got {err:?}");
    }

    #[tokio::test]
    async fn other_service_errors_are_backend_failures() {
        let table = replay_table(
            400,
            r#"{"__type":"com.amazonaws.dynamodb.v20120810#ResourceNotFoundException","message":"Requested resource not found"}"#,
        );
        let err = table.delete("abc").await.unwrap_err();
        assert!(matches!(err, TableError::Backend(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn delete_of_missing_row_is_none() {
        let table = replay_table(200, "{}");
        assert_eq!(table.delete("ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_returns_prior_row() {
        let table = replay_table(
            200,
            r#"{"Attributes":{"id":{"S":"abc"},"name":{"S":"00:11"},"stock":{"S":"22:33"},"price":{"S":"44:55"}}}"#,
        );
        assert_eq!(table.delete("abc").await.unwrap(), Some(row()));
    }
}
