use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use super::{extract_token, service_error_to_response, ApiState};
use crate::models::{AddCartItemRequest, CartResponse, RemoveCartItemRequest, UserType};

/// Add a product to the current customer's cart
#[instrument(name = "add_to_cart", skip(state, headers, request), fields(product_id = %request.product_id, quantity = request.quantity))]
pub async fn add_to_cart(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<AddCartItemRequest>,
) -> Result<(StatusCode, Json<CartResponse>), (StatusCode, Json<Value>)> {
    let token = extract_token(&headers)?;
    let session = state
        .auth_service
        .validate_token(token, UserType::Customer)
        .await
        .map_err(service_error_to_response)?;

    info!("Adding product to cart for {}", session.user_id);

    match state.cart_service.add_product(&session.user_id, request).await {
        Ok(cart) => {
            state.metrics.record_cart_operation("add_product", true);
            info!("Cart now holds {} items", cart.total_items);
            Ok((StatusCode::CREATED, Json(cart)))
        }
        Err(err) => {
            state.metrics.record_cart_operation("add_product", false);
            error!("Failed to add product to cart: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get the current customer's cart
#[instrument(name = "get_cart", skip(state, headers))]
pub async fn get_cart(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<CartResponse>, (StatusCode, Json<Value>)> {
    let token = extract_token(&headers)?;
    let session = state
        .auth_service
        .validate_token(token, UserType::Customer)
        .await
        .map_err(service_error_to_response)?;

    match state.cart_service.get_cart(&session.user_id).await {
        Ok(cart) => Ok(Json(cart)),
        Err(err) => {
            error!("Failed to get cart: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Remove one line item from the cart; the product id rides in the body
#[instrument(name = "remove_from_cart", skip(state, headers, request), fields(product_id = %request.product_id))]
pub async fn remove_from_cart(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<RemoveCartItemRequest>,
) -> Result<Json<CartResponse>, (StatusCode, Json<Value>)> {
    let token = extract_token(&headers)?;
    let session = state
        .auth_service
        .validate_token(token, UserType::Customer)
        .await
        .map_err(service_error_to_response)?;

    info!("Removing product from cart for {}", session.user_id);

    match state
        .cart_service
        .remove_product(&session.user_id, request)
        .await
    {
        Ok(cart) => {
            state.metrics.record_cart_operation("remove_product", true);
            Ok(Json(cart))
        }
        Err(err) => {
            state.metrics.record_cart_operation("remove_product", false);
            error!("Failed to remove product from cart: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Empty the current customer's cart
#[instrument(name = "clear_cart", skip(state, headers))]
pub async fn clear_cart(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let token = extract_token(&headers)?;
    let session = state
        .auth_service
        .validate_token(token, UserType::Customer)
        .await
        .map_err(service_error_to_response)?;

    info!("Clearing cart for {}", session.user_id);

    match state.cart_service.clear_cart(&session.user_id).await {
        Ok(()) => {
            state.metrics.record_cart_operation("clear_cart", true);
            Ok(Json(json!({
                "message": "Cart cleared",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })))
        }
        Err(err) => {
            state.metrics.record_cart_operation("clear_cart", false);
            error!("Failed to clear cart: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
