use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::order::{Order, PlaceOrderRequest, TakeOrderRequest, TakeOrderResponse};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list_orders).post(place_order))
        .route("/orders/:id", patch(take_order))
}

/// Kept as strings so a bad value gets our 400 body, not the extractor's.
#[derive(Deserialize)]
pub struct ListOrdersQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

fn integer_param(name: &str, raw: Option<&str>) -> Result<i64, AppError> {
    raw.and_then(|value| value.parse::<i64>().ok())
        .ok_or_else(|| AppError::Validation(format!("{name} should be a valid integer")))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        AppError::Validation(format!("invalid request payload: {}", rejection.body_text()))
    })
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> Result<Json<Vec<Order>>, AppError> {
    let Query(query) = query.map_err(|rejection| {
        AppError::Validation(format!("invalid query string: {}", rejection.body_text()))
    })?;
    let limit = integer_param("limit", query.limit.as_deref())?;
    let page = integer_param("page", query.page.as_deref())?;

    let orders = state.orders.list_orders(page, limit).await?;
    Ok(Json(orders))
}

async fn place_order(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<Json<Order>, AppError> {
    let request = json_body(payload)?;
    let order = state.orders.place_order(request).await?;
    Ok(Json(order))
}

async fn take_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<TakeOrderRequest>, JsonRejection>,
) -> Result<Json<TakeOrderResponse>, AppError> {
    let id = id
        .parse::<i64>()
        .map_err(|_| AppError::Validation("invalid order id".to_string()))?;
    let request = json_body(payload)?;

    let response = state.orders.take_order(id, &request.status).await?;
    Ok(Json(response))
}
