//! Registration of the delivery/payment methods and users orders refer to.
//!
//! Only used when the process runs with its built-in directory.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::UserId;
use domain::{Method, MethodKind, User};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RegisterMethodRequest {
    pub kind: MethodKind,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
}

/// POST /methods
pub async fn register_method(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterMethodRequest>,
) -> Result<(StatusCode, Json<Method>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }

    let method = match req.kind {
        MethodKind::Delivery => Method::delivery(req.name),
        MethodKind::Payment => Method::payment(req.name),
    };
    state.directory.add_method(method.clone()).await;
    tracing::info!(method_id = %method.id, kind = %method.kind, "method registered");
    Ok((StatusCode::CREATED, Json(method)))
}

/// POST /users
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest(format!(
            "invalid email address: {}",
            req.email
        )));
    }

    let user = User {
        id: UserId::new(),
        email: req.email,
    };
    state.directory.add_user(user.clone()).await;
    tracing::info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}
