use domain::{Money, Order, OrderStatus};

use crate::OwnerId;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on the page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A paginated listing of one owner's orders.
///
/// Results are ordered by creation time, most recent first. Pages are
/// 1-based; a page past the end yields no orders rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    /// Only orders of this owner are listed.
    pub owner: OwnerId,

    /// Filter by status.
    pub status: Option<OrderStatus>,

    /// 1-based page number.
    pub page: u32,

    /// Orders per page.
    pub page_size: u32,
}

impl OrderQuery {
    /// Creates a query for the first page of an owner's orders.
    pub fn for_owner(owner: OwnerId) -> Self {
        Self {
            owner,
            status: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Filters by status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Selects a page. Zero values are lifted to 1 and the size is capped
    /// at [`MAX_PAGE_SIZE`].
    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page.max(1);
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Number of orders skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// One page of orders plus the size of the full result set.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// Matching orders across all pages.
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl OrderPage {
    /// Number of pages needed for `total` orders.
    pub fn pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.page_size.max(1)))
    }
}

/// Aggregate figures over every order of one owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OwnerTotals {
    pub order_count: u64,
    /// Sum of order totals, whatever their status.
    pub total_spent: Money,
    pub pending_count: u64,
    /// Orders in `Delivered`.
    pub completed_count: u64,
}

impl OwnerTotals {
    /// Folds a set of orders into totals.
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        orders
            .into_iter()
            .fold(OwnerTotals::default(), |mut acc, order| {
                acc.order_count += 1;
                acc.total_spent += order.total();
                match order.status() {
                    OrderStatus::Pending => acc.pending_count += 1,
                    OrderStatus::Delivered => acc.completed_count += 1,
                    _ => {}
                }
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let query = OrderQuery::for_owner(OwnerId::new(1));
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(query.status, None);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_query_page_bounds() {
        let query = OrderQuery::for_owner(OwnerId::new(1)).page(0, 0);
        assert_eq!((query.page, query.page_size), (1, 1));

        let query = OrderQuery::for_owner(OwnerId::new(1)).page(3, 500);
        assert_eq!(query.page_size, MAX_PAGE_SIZE);
        assert_eq!(query.offset(), 200);
    }

    #[test]
    fn test_page_count() {
        let page = |total| OrderPage {
            orders: vec![],
            total,
            page: 1,
            page_size: 10,
        };
        assert_eq!(page(0).pages(), 0);
        assert_eq!(page(1).pages(), 1);
        assert_eq!(page(10).pages(), 1);
        assert_eq!(page(11).pages(), 2);
    }
}
