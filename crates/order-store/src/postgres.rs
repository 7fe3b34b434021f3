use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use domain::{LineItem, Money, NewOrder, Order, OrderStatus};
use sqlx::{
    PgPool, Row,
    postgres::{PgPoolOptions, PgRow},
};

use crate::{
    OrderId, OrderPage, OrderQuery, OwnerId, OwnerTotals, Result, StoreError,
    store::{OrderStore, StatusChange},
};

const ORDER_COLUMNS: &str = "id, owner_id, line_items, total_cents, status, created_at, updated_at";

/// PostgreSQL-backed order store implementation.
///
/// Line items are stored as a JSONB snapshot next to the order row. Status
/// updates are a single conditional `UPDATE`, which takes the row lock and
/// makes the compare-and-set atomic.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool on `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Postgres keeps microseconds; truncate so returned orders compare
    /// equal to what a later read yields.
    fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let order_id = OrderId::new(row.try_get("id")?);

        let status_text: String = row.try_get("status")?;
        let status: OrderStatus = status_text.parse().map_err(|_| StoreError::Corrupt {
            order_id,
            reason: format!("unknown status '{status_text}'"),
        })?;

        let line_items_json: serde_json::Value = row.try_get("line_items")?;
        let line_items: Vec<LineItem> = serde_json::from_value(line_items_json)?;

        Ok(Order::restore(
            order_id,
            OwnerId::new(row.try_get("owner_id")?),
            line_items,
            Money::from_cents(row.try_get("total_cents")?),
            status,
            row.try_get("created_at")?,
            row.try_get("updated_at")?,
        ))
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order> {
        let created_at = Self::now();
        let line_items = serde_json::to_value(order.line_items())?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (owner_id, line_items, total_cents, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id
            "#,
        )
        .bind(order.owner().as_i64())
        .bind(line_items)
        .bind(order.total().cents())
        .bind(OrderStatus::Pending.as_str())
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        metrics::counter!("order_store_writes_total", "op" => "create").increment(1);
        Ok(order.into_order(OrderId::new(id), created_at))
    }

    async fn get(&self, id: OrderId, owner: OwnerId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id.as_i64())
        .bind(owner.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list(&self, query: OrderQuery) -> Result<OrderPage> {
        let status = query.status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE owner_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            "#,
        )
        .bind(query.owner.as_i64())
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE owner_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(query.owner.as_i64())
        .bind(status)
        .bind(i64::from(query.page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;

        Ok(OrderPage {
            orders,
            total: total.max(0) as u64,
            page: query.page,
            page_size: query.page_size,
        })
    }

    async fn update_status(
        &self,
        id: OrderId,
        owner: OwnerId,
        change: StatusChange,
    ) -> Result<Order> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE orders SET status = $1, updated_at = $2
            WHERE id = $3 AND owner_id = $4 AND status = $5
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(change.target().as_str())
        .bind(Self::now())
        .bind(id.as_i64())
        .bind(owner.as_i64())
        .bind(change.expected().as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            metrics::counter!("order_store_writes_total", "op" => "update_status").increment(1);
            return Self::row_to_order(row);
        }

        // Nothing matched: either the order isn't visible or its status moved on
        let actual: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 AND owner_id = $2")
                .bind(id.as_i64())
                .bind(owner.as_i64())
                .fetch_optional(&self.pool)
                .await?;

        match actual {
            None => Err(StoreError::OrderNotFound(id)),
            Some(text) => {
                let actual = text.parse().map_err(|_| StoreError::Corrupt {
                    order_id: id,
                    reason: format!("unknown status '{text}'"),
                })?;
                Err(StoreError::ConcurrencyConflict {
                    order_id: id,
                    expected: change.expected(),
                    actual,
                })
            }
        }
    }

    async fn owner_totals(&self, owner: OwnerId) -> Result<OwnerTotals> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS order_count,
                COALESCE(SUM(total_cents), 0)::BIGINT AS total_cents,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending_count,
                COUNT(*) FILTER (WHERE status = 'delivered') AS completed_count
            FROM orders
            WHERE owner_id = $1
            "#,
        )
        .bind(owner.as_i64())
        .fetch_one(&self.pool)
        .await?;

        let count = |column: &str| -> Result<u64> {
            let value: i64 = row.try_get(column)?;
            Ok(value.max(0) as u64)
        };

        Ok(OwnerTotals {
            order_count: count("order_count")?,
            total_spent: Money::from_cents(row.try_get("total_cents")?),
            pending_count: count("pending_count")?,
            completed_count: count("completed_count")?,
        })
    }
}
