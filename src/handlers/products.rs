use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use super::{extract_token, service_error_to_response, ApiState};
use crate::models::{
    CreateProductRequest, Product, ProductListResponse, UpdateProductRequest, UserType,
};

/// List the whole catalog (public)
#[instrument(name = "list_products", skip(state))]
pub async fn list_products(
    State(state): State<ApiState>,
) -> Result<Json<ProductListResponse>, (StatusCode, Json<Value>)> {
    info!("Listing products");

    match state.product_service.list_products().await {
        Ok(response) => {
            info!("Listed {} products", response.total_count);
            Ok(Json(response))
        }
        Err(err) => {
            error!("Failed to list products: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Get a single product (public)
#[instrument(name = "get_product", skip(state), fields(product_id = %product_id))]
pub async fn get_product(
    State(state): State<ApiState>,
    Path(product_id): Path<String>,
) -> Result<Json<Product>, (StatusCode, Json<Value>)> {
    match state.product_service.get_product(&product_id).await {
        Ok(product) => Ok(Json(product)),
        Err(err) => {
            error!("Failed to get product {}: {}", product_id, err);
            Err(service_error_to_response(err))
        }
    }
}

/// List a seller's products (public)
#[instrument(name = "list_seller_products", skip(state), fields(seller_id = %seller_id))]
pub async fn list_seller_products(
    State(state): State<ApiState>,
    Path(seller_id): Path<String>,
) -> Result<Json<ProductListResponse>, (StatusCode, Json<Value>)> {
    match state.product_service.list_by_seller(&seller_id).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            error!("Failed to list seller products: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Create a product, attributed to the seller behind the token
#[instrument(name = "create_product", skip(state, headers, request), fields(product_name = %request.product_name))]
pub async fn create_product(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), (StatusCode, Json<Value>)> {
    let token = extract_token(&headers)?;
    let session = state
        .auth_service
        .validate_token(token, UserType::Seller)
        .await
        .map_err(service_error_to_response)?;

    info!("Creating product for seller {}", session.user_id);

    match state
        .product_service
        .create_product(&session.user_id, request)
        .await
    {
        Ok(product) => {
            info!("Product created: {}", product.product_id);
            Ok((StatusCode::CREATED, Json(product)))
        }
        Err(err) => {
            error!("Failed to create product: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Update a product; the product id rides in the body
#[instrument(name = "update_product", skip(state, headers, request), fields(product_id = %request.product_id))]
pub async fn update_product(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Product>, (StatusCode, Json<Value>)> {
    let token = extract_token(&headers)?;
    let session = state
        .auth_service
        .validate_token(token, UserType::Seller)
        .await
        .map_err(service_error_to_response)?;

    info!("Updating product for seller {}", session.user_id);

    match state
        .product_service
        .update_product(&session.user_id, request)
        .await
    {
        Ok(product) => Ok(Json(product)),
        Err(err) => {
            error!("Failed to update product: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Delete a product listed by the seller behind the token
#[instrument(name = "delete_product", skip(state, headers), fields(product_id = %product_id))]
pub async fn delete_product(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let token = extract_token(&headers)?;
    let session = state
        .auth_service
        .validate_token(token, UserType::Seller)
        .await
        .map_err(service_error_to_response)?;

    info!("Deleting product for seller {}", session.user_id);

    match state
        .product_service
        .delete_product(&session.user_id, &product_id)
        .await
    {
        Ok(()) => Ok(Json(json!({
            "message": "Product deleted",
            "productId": product_id,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))),
        Err(err) => {
            error!("Failed to delete product: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
