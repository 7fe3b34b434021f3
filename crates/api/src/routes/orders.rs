//! Order placement, lifecycle and stats endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use catalog::CatalogClient;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{LineItem, Order, OrderStatus};
use order_store::{MAX_PAGE_SIZE, OrderPage, OrderQuery, OrderStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stats::StatsSnapshot;

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    #[serde(alias = "pageSize")]
    pub per_page: Option<String>,
    pub status: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct LineItemResponse {
    pub item_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    pub subtotal: f64,
}

impl From<&LineItem> for LineItemResponse {
    fn from(line: &LineItem) -> Self {
        Self {
            item_id: line.catalog_item_id.to_string(),
            name: line.name.clone(),
            price: line.unit_price.as_decimal(),
            quantity: line.quantity,
            subtotal: line.line_subtotal.as_decimal(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub user_id: i64,
    pub items: Vec<LineItemResponse>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().as_i64(),
            user_id: order.owner().as_i64(),
            items: order.line_items().iter().map(LineItemResponse::from).collect(),
            total_amount: order.total().as_decimal(),
            status: order.status(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub order: OrderResponse,
}

impl OrderEnvelope {
    fn new(order: &Order) -> Self {
        Self {
            message: None,
            order: order.into(),
        }
    }

    fn with_message(message: &'static str, order: &Order) -> Self {
        Self {
            message: Some(message),
            order: order.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u32,
    pub pages: u64,
}

impl From<OrderPage> for OrderListResponse {
    fn from(page: OrderPage) -> Self {
        Self {
            orders: page.orders.iter().map(OrderResponse::from).collect(),
            total: page.total,
            page: page.page,
            pages: page.pages(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub order_count: u64,
    pub total_spent: f64,
    pub pending_count: u64,
    pub completed_count: u64,
}

impl From<StatsSnapshot> for StatsResponse {
    fn from(stats: StatsSnapshot) -> Self {
        Self {
            order_count: stats.order_count,
            total_spent: stats.total_spent.as_decimal(),
            pending_count: stats.pending_count,
            completed_count: stats.completed_count,
        }
    }
}

// -- Helpers --

fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e.body_text())))
}

/// Non-numeric ids can't name an order, so they read as not found.
fn order_id(path: Result<Path<i64>, PathRejection>) -> Result<OrderId, ApiError> {
    path.map(|Path(id)| OrderId::new(id))
        .map_err(|_| ApiError::NotFound("Order not found".to_string()))
}

fn positive(name: &str, value: Option<&str>, default: u32) -> Result<u32, ApiError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ApiError::BadRequest(format!("{name} must be a positive integer")))
}

fn list_query(owner: common::OwnerId, params: ListParams) -> Result<OrderQuery, ApiError> {
    let page = positive("page", params.page.as_deref(), 1)?;
    let per_page = positive(
        "per_page",
        params.per_page.as_deref(),
        order_store::DEFAULT_PAGE_SIZE,
    )?;

    let mut query = OrderQuery::for_owner(owner).page(page, per_page.min(MAX_PAGE_SIZE));
    if let Some(status) = params.status.as_deref().map(str::trim)
        && !status.is_empty()
    {
        let status: OrderStatus = status
            .parse()
            .map_err(|e: domain::ParseStatusError| ApiError::BadRequest(e.to_string()))?;
        query = query.status(status);
    }
    Ok(query)
}

// -- Handlers --

/// POST /api/orders: validate, price and place an order.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    AuthUser(owner): AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderEnvelope>), ApiError>
where
    S: OrderStore + 'static,
    C: CatalogClient + 'static,
{
    let payload = json_body(payload)?;
    let order = state.orders.place_order(owner, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderEnvelope::with_message("Order created successfully", &order)),
    ))
}

/// GET /api/orders: list the caller's orders, most recent first.
#[tracing::instrument(skip(state, params))]
pub async fn list<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    AuthUser(owner): AuthUser,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<OrderListResponse>, ApiError>
where
    S: OrderStore + 'static,
    C: CatalogClient + 'static,
{
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let query = list_query(owner, params)?;
    let page = state.orders.list_orders(query).await?;

    Ok(Json(page.into()))
}

/// GET /api/orders/{id}: load one of the caller's orders.
#[tracing::instrument(skip(state, path))]
pub async fn get<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    AuthUser(owner): AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<OrderEnvelope>, ApiError>
where
    S: OrderStore + 'static,
    C: CatalogClient + 'static,
{
    let id = order_id(path)?;
    let order = state.orders.get_order(owner, id).await?;

    Ok(Json(OrderEnvelope::new(&order)))
}

/// PUT /api/orders/{id}/status: move an order along its lifecycle.
#[tracing::instrument(skip(state, path, payload))]
pub async fn update_status<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    AuthUser(owner): AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<OrderEnvelope>, ApiError>
where
    S: OrderStore + 'static,
    C: CatalogClient + 'static,
{
    let id = order_id(path)?;
    let payload = json_body(payload)?;

    let status = match payload.get("status") {
        None | Some(Value::Null) => {
            return Err(ApiError::BadRequest("Status is required".to_string()));
        }
        Some(Value::String(s)) => s
            .parse::<OrderStatus>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        Some(other) => {
            return Err(ApiError::BadRequest(
                domain::ParseStatusError(other.to_string()).to_string(),
            ));
        }
    };

    let order = state.orders.update_status(owner, id, status).await?;

    Ok(Json(OrderEnvelope::with_message(
        "Order status updated successfully",
        &order,
    )))
}

/// DELETE /api/orders/{id}: cancel an order that hasn't shipped.
#[tracing::instrument(skip(state, path))]
pub async fn cancel<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    AuthUser(owner): AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<OrderEnvelope>, ApiError>
where
    S: OrderStore + 'static,
    C: CatalogClient + 'static,
{
    let id = order_id(path)?;
    let order = state.orders.cancel_order(owner, id).await?;

    Ok(Json(OrderEnvelope::with_message(
        "Order cancelled successfully",
        &order,
    )))
}

/// GET /api/orders/stats: the caller's order statistics.
#[tracing::instrument(skip(state))]
pub async fn stats<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    AuthUser(owner): AuthUser,
) -> Result<Json<StatsResponse>, ApiError>
where
    S: OrderStore + 'static,
    C: CatalogClient + 'static,
{
    let stats = state.orders.get_stats(owner).await?;
    Ok(Json(stats.into()))
}
