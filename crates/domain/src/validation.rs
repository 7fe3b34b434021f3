//! Structural validation of incoming order requests.
//!
//! Validation works on the raw JSON payload so that type errors are
//! reported alongside missing fields in one pass.

use common::OwnerId;
use serde_json::Value;
use thiserror::Error;

use crate::order::CatalogItemId;

/// One requested line, before pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedItem {
    pub item_id: CatalogItemId,
    pub quantity: u32,
}

/// A structurally valid order request.
///
/// `owner` always comes from the authenticated session; owner fields in
/// the payload are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub owner: OwnerId,
    pub items: Vec<RequestedItem>,
}

/// Every problem found in a request, in the order encountered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Error)]
#[error("{}", .0.join("; "))]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn into_messages(self) -> Vec<String> {
        self.0
    }
}


/// Keys accepted for the item list; `products` is the legacy name.
const ITEM_LIST_KEYS: [&str; 2] = ["items", "products"];

/// Keys accepted for an item identifier.
const ITEM_ID_KEYS: [&str; 3] = ["item_id", "itemId", "product_id"];

/// Validates a raw order payload for the authenticated `owner`.
///
/// All violations are collected rather than stopping at the first one.
pub fn validate_order_request(
    payload: &Value,
    owner: OwnerId,
) -> Result<OrderRequest, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let Some(body) = payload.as_object() else {
        errors.push("Request body must be a JSON object");
        return Err(errors);
    };

    let list = ITEM_LIST_KEYS.iter().find_map(|key| body.get(*key));
    let mut items = Vec::new();

    match list {
        None => errors.push("Items are required"),
        Some(Value::Array(entries)) if !entries.is_empty() => {
            for (idx, entry) in entries.iter().enumerate() {
                if let Some(item) = validate_item(idx, entry, &mut errors) {
                    items.push(item);
                }
            }
        }
        Some(_) => errors.push("Items must be a non-empty list"),
    }

    if errors.is_empty() {
        Ok(OrderRequest { owner, items })
    } else {
        Err(errors)
    }
}

fn validate_item(idx: usize, entry: &Value, errors: &mut ValidationErrors) -> Option<RequestedItem> {
    let Some(fields) = entry.as_object() else {
        errors.push(format!("Item {idx}: must be an object"));
        return None;
    };

    let item_id = match ITEM_ID_KEYS.iter().find_map(|key| fields.get(*key)) {
        None | Some(Value::Null) => {
            errors.push(format!("Item {idx}: item_id is required"));
            None
        }
        Some(Value::String(s)) if !s.trim().is_empty() => Some(CatalogItemId::new(s.trim())),
        Some(Value::Number(n)) if n.is_u64() || n.is_i64() => Some(CatalogItemId::new(n.to_string())),
        Some(_) => {
            errors.push(format!(
                "Item {idx}: item_id must be a non-empty string or an integer"
            ));
            None
        }
    };

    let quantity = match fields.get("quantity") {
        None | Some(Value::Null) => {
            errors.push(format!("Item {idx}: quantity is required"));
            None
        }
        Some(value) => match value.as_u64().and_then(|q| u32::try_from(q).ok()) {
            Some(q) if q > 0 => Some(q),
            _ => {
                errors.push(format!("Item {idx}: quantity must be a positive integer"));
                None
            }
        },
    };

    Some(RequestedItem {
        item_id: item_id?,
        quantity: quantity?,
    })
}
