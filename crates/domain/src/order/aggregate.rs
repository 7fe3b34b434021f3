//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, OwnerId};
use serde::{Deserialize, Serialize};

use super::{LineItem, Money, OrderError, OrderStatus, UnitPrice};

/// A fully priced order that has not been persisted yet.
///
/// Construction enforces the aggregate invariants, so a store only ever
/// receives well-formed orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    owner: OwnerId,
    line_items: Vec<LineItem>,
    total: Money,
}

impl NewOrder {
    /// Builds an order from priced line items, fixing its total.
    ///
    /// Line subtotals are summed at catalog precision and only the sum is
    /// rounded to whole cents.
    pub fn new(owner: OwnerId, line_items: Vec<LineItem>) -> Result<Self, OrderError> {
        if line_items.is_empty() {
            return Err(OrderError::NoLineItems);
        }
        if let Some(bad) = line_items.iter().find(|line| line.quantity == 0) {
            return Err(OrderError::InvalidQuantity {
                item_id: bad.catalog_item_id.clone(),
                quantity: bad.quantity,
            });
        }
        let total = line_items
            .iter()
            .try_fold(UnitPrice::zero(), |sum, line| sum.checked_add(line.line_subtotal))
            .and_then(|sum| sum.to_money())
            .ok_or(OrderError::AmountOverflow)?;
        Ok(Self {
            owner,
            line_items,
            total,
        })
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    /// Turns the draft into a stored order with its assigned identity.
    ///
    /// The initial status is always `Pending`.
    pub fn into_order(self, id: OrderId, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            owner: self.owner,
            line_items: self.line_items,
            total: self.total,
            status: OrderStatus::Pending,
            created_at,
            updated_at: created_at,
        }
    }
}

/// Order aggregate root.
///
/// Line items and total are a snapshot taken at creation; only the status
/// and last-modified time ever change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    owner: OwnerId,
    line_items: Vec<LineItem>,
    total: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Rebuilds an order from persisted columns.
    pub fn restore(
        id: OrderId,
        owner: OwnerId,
        line_items: Vec<LineItem>,
        total: Money,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            line_items,
            total,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the order belongs to `owner`.
    pub fn is_owned_by(&self, owner: OwnerId) -> bool {
        self.owner == owner
    }

    /// Moves the order to `target`, enforcing the lifecycle.
    pub fn transition(&mut self, target: OrderStatus, at: DateTime<Utc>) -> Result<(), OrderError> {
        self.status = self.status.transition_to(target)?;
        self.updated_at = at;
        Ok(())
    }
}
