//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{Aggregate, ContactDetails, DeliveryInfo, Order, OrderStatus, PaymentInfo};
use lifecycle::{NewOrder, OrderUpdate};
use serde::Serialize;

use super::parse_aggregate_id;
use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub item_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub version: i64,
    pub user_id: Option<String>,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub contact: Option<ContactDetails>,
    pub message: Option<String>,
    pub delivery: Option<DeliveryInfo>,
    pub payment: Option<PaymentInfo>,
    pub return_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().map(|id| id.to_string()).unwrap_or_default(),
            version: order.version().as_i64(),
            user_id: order.user_id().map(|id| id.to_string()),
            status: order.status(),
            items: order
                .items()
                .iter()
                .map(|item| OrderItemResponse {
                    item_id: item.item_id.to_string(),
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                    line_total_cents: item.line_total().cents(),
                })
                .collect(),
            total_cents: order.total_amount().cents(),
            contact: order.contact().cloned(),
            message: order.message().map(String::from),
            delivery: order.delivery().cloned(),
            payment: order.payment().copied(),
            return_id: order.return_id().map(|id| id.to_string()),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

/// POST /orders: place an order and reserve its items.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewOrder>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state.lifecycle.create_order(req).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_aggregate_id(&id)?;
    let order = state.lifecycle.get_order(order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// PATCH /orders/{id}: any combination of new items, status, delivery and
/// payment.
#[tracing::instrument(skip(state, req))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<OrderUpdate>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_aggregate_id(&id)?;
    let order = state.lifecycle.update_order(order_id, req).await?;
    Ok(Json(OrderResponse::from(&order)))
}
