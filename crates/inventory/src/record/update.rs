//! Partial update construction.
//!
//! A field is updated because the caller supplied it, not because its value is
//! truthy: `stock: 0`, `price: 0.0` and `name: ""` are all real updates.

use std::collections::BTreeMap;

use common::protocol::UpdateItemRequest;
use thiserror::Error;

use super::{RecordCodec, ATTR_ID, ATTR_NAME, ATTR_PRICE, ATTR_STOCK};

/// Errors from [`build_update`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpdateError {
    /// None of `name`, `stock`, `price` was supplied.
    #[error("no fields to update")]
    NoFieldsToUpdate,
}

/// Sparse set of proposed field changes. `None` means "leave as stored".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub stock: Option<i64>,
    pub price: Option<f64>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.stock.is_none() && self.price.is_none()
    }
}

impl From<UpdateItemRequest> for ItemPatch {
    fn from(req: UpdateItemRequest) -> Self {
        Self {
            name: req.name,
            stock: req.stock,
            price: req.price,
        }
    }
}

/// One `#attr = :attr` clause of an update expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Real attribute name in the table.
    pub attribute: &'static str,
    /// Key into [`UpdateSpec::names`].
    pub name_placeholder: String,
    /// Key into [`UpdateSpec::values`].
    pub value_placeholder: String,
}

impl Assignment {
    fn new(attribute: &'static str) -> Self {
        Self {
            attribute,
            name_placeholder: format!("#{attribute}"),
            value_placeholder: format!(":{attribute}"),
        }
    }

    /// Render as an expression clause, e.g. `#stock = :stock`.
    pub fn clause(&self) -> String {
        format!("{} = {}", self.name_placeholder, self.value_placeholder)
    }
}

/// Everything the storage layer needs to apply a conditional partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSpec {
    /// Assignments in `name`, `stock`, `price` order, present fields only.
    pub assignments: Vec<Assignment>,
    /// Placeholder → attribute name.
    pub names: BTreeMap<String, String>,
    /// Placeholder → encrypted value.
    pub values: BTreeMap<String, String>,
    /// Existence precondition on the target key.
    pub condition: String,
}

impl UpdateSpec {
    /// The assignment clauses in order.
    pub fn clauses(&self) -> Vec<String> {
        self.assignments.iter().map(Assignment::clause).collect()
    }

    /// Full `SET` expression, e.g. `SET #name = :name, #stock = :stock`.
    pub fn update_expression(&self) -> String {
        format!("SET {}", self.clauses().join(", "))
    }

    /// Resolve each assignment to `(attribute, encrypted value)`.
    pub fn resolved(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.assignments.iter().filter_map(|a| {
            self.values
                .get(&a.value_placeholder)
                .map(|v| (a.attribute, v.as_str()))
        })
    }
}

/// Build an [`UpdateSpec`] from `patch`, encrypting each supplied field.
///
/// # Errors
///
/// Returns [`UpdateError::NoFieldsToUpdate`] if `patch` is empty. No encryption
/// work is done in that case.
pub fn build_update(patch: &ItemPatch, codec: &RecordCodec) -> Result<UpdateSpec, UpdateError> {
    if patch.is_empty() {
        return Err(UpdateError::NoFieldsToUpdate);
    }

    let mut fields: Vec<(&'static str, String)> = Vec::with_capacity(3);
    if let Some(name) = &patch.name {
        fields.push((ATTR_NAME, codec.encrypt_name(name)));
    }
    if let Some(stock) = patch.stock {
        fields.push((ATTR_STOCK, codec.encrypt_stock(stock)));
    }
    if let Some(price) = patch.price {
        fields.push((ATTR_PRICE, codec.encrypt_price(price)));
    }

    let mut spec = UpdateSpec {
        assignments: Vec::with_capacity(fields.len()),
        names: BTreeMap::new(),
        values: BTreeMap::new(),
        condition: format!("attribute_exists({ATTR_ID})"),
    };
    for (attribute, encrypted) in fields {
        let assignment = Assignment::new(attribute);
        spec.names
            .insert(assignment.name_placeholder.clone(), attribute.to_owned());
        spec.values
            .insert(assignment.value_placeholder.clone(), encrypted);
        spec.assignments.push(assignment);
    }
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{FieldCipher, KEY_LEN};
    use crate::key::SecretKey;

    fn codec() -> RecordCodec {
        let key = SecretKey::from_bytes(&[0x42u8; KEY_LEN]).unwrap();
        RecordCodec::new(FieldCipher::new(key))
    }

    #[test]
    fn empty_patch_is_rejected() {
        let err = build_update(&ItemPatch::default(), &codec()).unwrap_err();
        assert_eq!(err, UpdateError::NoFieldsToUpdate);
    }

    #[test]
    fn zero_stock_is_an_update() {
        let patch = ItemPatch {
            stock: Some(0),
            ..Default::default()
        };
        let spec = build_update(&patch, &codec()).unwrap();
        assert_eq!(spec.update_expression(), "SET #stock = :stock");
        assert_eq!(spec.names.get("#stock").map(String::as_str), Some("stock"));
        assert!(spec.values.contains_key(":stock"));
        assert_eq!(spec.condition, "attribute_exists(id)");
    }

    #[test]
    fn empty_name_and_zero_price_are_updates() {
        let patch = ItemPatch {
            name: Some(String::new()),
            price: Some(0.0),
            ..Default::default()
        };
        let spec = build_update(&patch, &codec()).unwrap();
        assert_eq!(spec.clauses(), vec!["#name = :name", "#price = :price"]);
    }

    #[test]
    fn values_are_encrypted() {
        let codec = codec();
        let patch = ItemPatch {
            name: Some("pear".into()),
            stock: Some(3),
            price: Some(1.25),
        };
        let spec = build_update(&patch, &codec).unwrap();
        assert_eq!(spec.assignments.len(), 3);

        let cipher = FieldCipher::new(SecretKey::from_bytes(&[0x42u8; KEY_LEN]).unwrap());
        let resolved: Vec<_> = spec.resolved().collect();
        assert_eq!(resolved[0].0, "name");
        assert_eq!(cipher.decrypt(resolved[0].1).unwrap(), "pear");
        assert_eq!(cipher.decrypt(resolved[1].1).unwrap(), "3");
        assert_eq!(cipher.decrypt(resolved[2].1).unwrap(), "1.25");
    }

    #[test]
    fn patch_from_request_keeps_presence() {
        let req: UpdateItemRequest = serde_json::from_str(r#"{"price": 0}"#).unwrap();
        let patch = ItemPatch::from(req);
        assert_eq!(patch.price, Some(0.0));
        assert!(!patch.is_empty());
    }
}
