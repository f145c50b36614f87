//! Return endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{Aggregate, Return, ReturnStatus};
use lifecycle::{NewReturn, ReturnUpdate};
use serde::Serialize;

use super::parse_aggregate_id;
use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct ReturnResponse {
    pub id: String,
    pub order_id: String,
    pub status: ReturnStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Return> for ReturnResponse {
    fn from(ret: &Return) -> Self {
        Self {
            id: ret.id().map(|id| id.to_string()).unwrap_or_default(),
            order_id: ret.order_id().map(|id| id.to_string()).unwrap_or_default(),
            status: ret.status(),
            message: ret.message().to_string(),
            created_at: ret.created_at(),
            updated_at: ret.updated_at(),
        }
    }
}

/// POST /returns: open a return and force its order to `Refunded`.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewReturn>,
) -> Result<(StatusCode, Json<ReturnResponse>), ApiError> {
    let ret = state.lifecycle.create_return(req).await?;
    Ok((StatusCode::CREATED, Json(ReturnResponse::from(&ret))))
}

/// GET /returns/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let return_id = parse_aggregate_id(&id)?;
    let ret = state.lifecycle.get_return(return_id).await?;
    Ok(Json(ReturnResponse::from(&ret)))
}

/// PATCH /returns/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ReturnUpdate>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let return_id = parse_aggregate_id(&id)?;
    let ret = state.lifecycle.update_return(return_id, req).await?;
    Ok(Json(ReturnResponse::from(&ret)))
}
