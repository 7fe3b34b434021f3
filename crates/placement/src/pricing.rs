//! Pricing and availability resolution.

use std::sync::Arc;

use catalog::CatalogClient;
use domain::{LineItem, Money, RequestedItem, UnitPrice};

use crate::PricingError;

/// A fully priced request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItems {
    pub line_items: Vec<LineItem>,
    /// Sum of the unrounded line subtotals, rounded to whole cents.
    pub total: Money,
}

/// Prices requested items against the catalog.
pub struct PricingResolver<C> {
    catalog: Arc<C>,
}

impl<C: CatalogClient> PricingResolver<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    /// Prices `items` in request order, stopping at the first failure.
    ///
    /// Items after a failing one are never looked up. Stock is compared
    /// against the catalog's figure at lookup time and is not reserved.
    #[tracing::instrument(skip(self, items), fields(item_count = items.len()))]
    pub async fn resolve(&self, items: &[RequestedItem]) -> Result<PricedItems, PricingError> {
        let mut line_items = Vec::with_capacity(items.len());
        let mut subtotal_sum = UnitPrice::zero();
        let mut total = Money::zero();

        for requested in items {
            let item = self
                .catalog
                .lookup(&requested.item_id)
                .await
                .map_err(|err| PricingError::from_lookup(&requested.item_id, err))?;

            if item.available_stock < i64::from(requested.quantity) {
                return Err(PricingError::InsufficientStock {
                    item_id: requested.item_id.clone(),
                    requested: requested.quantity,
                    available: item.available_stock,
                });
            }

            let overflow = || PricingError::AmountOverflow(requested.item_id.clone());
            let line_subtotal = item
                .price
                .checked_multiply(requested.quantity)
                .ok_or_else(overflow)?;
            subtotal_sum = subtotal_sum.checked_add(line_subtotal).ok_or_else(overflow)?;
            total = subtotal_sum.to_money().ok_or_else(overflow)?;

            line_items.push(LineItem {
                catalog_item_id: requested.item_id.clone(),
                name: item.name,
                unit_price: item.price,
                quantity: requested.quantity,
                line_subtotal,
            });
        }

        Ok(PricedItems { line_items, total })
    }
}
