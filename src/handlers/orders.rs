use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use super::{extract_token, service_error_to_response, ApiState};
use crate::models::{Order, PlaceOrderRequest, UpdateOrderRequest, UserType};

/// Place an order from the current customer's cart
#[instrument(name = "place_order", skip(state, headers, request))]
pub async fn place_order(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>), (StatusCode, Json<Value>)> {
    let token = extract_token(&headers)?;
    let session = state
        .auth_service
        .validate_token(token, UserType::Customer)
        .await
        .map_err(service_error_to_response)?;

    info!("Placing order for {}", session.user_id);

    match state.order_service.place_order(&session.user_id, request).await {
        Ok(order) => {
            state.metrics.record_order_operation("place_order", true);
            info!("Order placed: {} ({})", order.order_id, order.total);
            Ok((StatusCode::CREATED, Json(order)))
        }
        Err(err) => {
            state.metrics.record_order_operation("place_order", false);
            error!("Failed to place order: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get one of the current customer's orders
#[instrument(name = "get_order", skip(state, headers), fields(order_id = %order_id))]
pub async fn get_order(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, (StatusCode, Json<Value>)> {
    let token = extract_token(&headers)?;
    let session = state
        .auth_service
        .validate_token(token, UserType::Customer)
        .await
        .map_err(service_error_to_response)?;

    match state.order_service.get_order(&session.user_id, &order_id).await {
        Ok(order) => Ok(Json(order)),
        Err(err) => {
            error!("Failed to get order {}: {}", order_id, err);
            Err(service_error_to_response(err))
        }
    }
}

/// List all orders of the current customer
#[instrument(name = "list_customer_orders", skip(state, headers))]
pub async fn list_customer_orders(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Order>>, (StatusCode, Json<Value>)> {
    let token = extract_token(&headers)?;
    let session = state
        .auth_service
        .validate_token(token, UserType::Customer)
        .await
        .map_err(service_error_to_response)?;

    match state.order_service.list_customer_orders(&session.user_id).await {
        Ok(orders) => {
            info!("Found {} orders", orders.len());
            Ok(Json(orders))
        }
        Err(err) => {
            error!("Failed to list orders: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// List all orders placed on a calendar date (YYYY-MM-DD)
#[instrument(name = "list_orders_by_date", skip(state), fields(date = %date))]
pub async fn list_orders_by_date(
    State(state): State<ApiState>,
    Path(date): Path<String>,
) -> Result<Json<Vec<Order>>, (StatusCode, Json<Value>)> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!("Invalid date: {date}, expected YYYY-MM-DD"),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        )
    })?;

    match state.order_service.list_orders_by_date(date).await {
        Ok(orders) => Ok(Json(orders)),
        Err(err) => {
            error!("Failed to list orders by date: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Cancel an order, restoring the stock it consumed
#[instrument(name = "cancel_order", skip(state, headers), fields(order_id = %order_id))]
pub async fn cancel_order(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, (StatusCode, Json<Value>)> {
    let token = extract_token(&headers)?;
    let session = state
        .auth_service
        .validate_token(token, UserType::Customer)
        .await
        .map_err(service_error_to_response)?;

    info!("Cancelling order {} for {}", order_id, session.user_id);

    match state
        .order_service
        .cancel_order(&session.user_id, &order_id)
        .await
    {
        Ok(order) => {
            state.metrics.record_order_operation("cancel_order", true);
            Ok(Json(order))
        }
        Err(err) => {
            state.metrics.record_order_operation("cancel_order", false);
            error!("Failed to cancel order: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Change card or shipping details of a pending order
#[instrument(name = "update_order", skip(state, headers, request), fields(order_id = %order_id))]
pub async fn update_order(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
    Json(request): Json<UpdateOrderRequest>,
) -> Result<Json<Order>, (StatusCode, Json<Value>)> {
    let token = extract_token(&headers)?;
    let session = state
        .auth_service
        .validate_token(token, UserType::Customer)
        .await
        .map_err(service_error_to_response)?;

    info!("Updating order {} for {}", order_id, session.user_id);

    match state
        .order_service
        .update_order(&session.user_id, &order_id, request)
        .await
    {
        Ok(order) => {
            state.metrics.record_order_operation("update_order", true);
            Ok(Json(order))
        }
        Err(err) => {
            state.metrics.record_order_operation("update_order", false);
            error!("Failed to update order: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
