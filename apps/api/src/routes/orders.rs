//! Orders.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};

use shopdesk_core::{NewOrder, OrderDetail, OrderFilter, OrderItem, OrderStatus, Page, DEFAULT_PAGE_SIZE};

use crate::error::ApiError;
use crate::extract::{require_admin, ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItemOutput {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
}

impl From<OrderItem> for OrderItemOutput {
    fn from(item: OrderItem) -> Self {
        OrderItemOutput {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price().to_major(),
        }
    }
}

/// Order as returned to callers; money in major units.
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderOutput {
    pub id: i64,
    pub client_id: i64,
    pub status: OrderStatus,
    pub total: f64,
    pub items: Vec<OrderItemOutput>,
}

impl From<OrderDetail> for OrderOutput {
    fn from(detail: OrderDetail) -> Self {
        OrderOutput {
            id: detail.order.id,
            client_id: detail.order.client_id,
            status: detail.order.status,
            total: detail.order.total().to_major(),
            items: detail.items.into_iter().map(OrderItemOutput::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderList {
    pub orders: Vec<OrderOutput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderUpdate {
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    order_id: Option<i64>,
    client_id: Option<i64>,
    status: Option<String>,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    skip: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_orders(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<ApiJson<OrderList>, ApiError> {
    let filter = OrderFilter {
        order_id: query.order_id,
        client_id: query.client_id,
        status: query.status,
    };
    let orders = state
        .db
        .orders()
        .list(&filter, Page::new(query.limit, query.skip))
        .await?;

    Ok(ApiJson(OrderList {
        orders: orders.into_iter().map(OrderOutput::from).collect(),
    }))
}

async fn create_order(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiJson(request): ApiJson<NewOrder>,
) -> Result<(StatusCode, ApiJson<OrderOutput>), ApiError> {
    let detail = state.db.orders().place(&request).await?;
    Ok((StatusCode::CREATED, ApiJson(detail.into())))
}

async fn get_order(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiJson<OrderOutput>, ApiError> {
    let detail = state.db.orders().get(id).await?;
    Ok(ApiJson(detail.into()))
}

async fn update_order(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<OrderUpdate>,
) -> Result<ApiJson<OrderOutput>, ApiError> {
    let detail = state.db.orders().update_status(id, update.status).await?;
    Ok(ApiJson(detail.into()))
}

async fn delete_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_admin(&user)?;
    state.db.orders().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
