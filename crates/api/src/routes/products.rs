//! Product stock view and administrative restock.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{Money, ProductId};
use inventory::Product;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct PutProductRequest {
    pub name: String,
    pub price_cents: i64,
    pub stock: u64,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub stock: u64,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            price_cents: product.price.cents(),
            stock: product.stock,
        }
    }
}

/// GET /products/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.lifecycle.get_product(&ProductId::new(id)).await?;
    Ok(Json(product.into()))
}

/// PUT /products/{id}: create the product or overwrite its stock.
#[tracing::instrument(skip(state, req))]
pub async fn put(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<PutProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    if req.price_cents < 0 {
        return Err(ApiError::BadRequest(
            "price_cents must not be negative".to_string(),
        ));
    }

    let product = state
        .lifecycle
        .put_product(Product::new(
            id,
            req.name,
            Money::from_cents(req.price_cents),
            req.stock,
        ))
        .await?;
    Ok(Json(product.into()))
}
