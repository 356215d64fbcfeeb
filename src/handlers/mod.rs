// Handlers module - HTTP layer

pub mod auth;
pub mod cart;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod orders;
pub mod products;

pub use auth::*;
pub use cart::*;
pub use health::*;
pub use metrics::*;
pub use middleware::*;
pub use orders::*;
pub use products::*;

use std::sync::Arc;

use axum::{
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};

use crate::models::{LoginError, RepositoryError, ServiceError};
use crate::observability::Metrics;
use crate::services::{AuthService, CartService, OrderService, ProductService};

/// Shared application state containing all services
#[derive(Clone)]
pub struct ApiState {
    pub auth_service: Arc<AuthService>,
    pub cart_service: Arc<CartService>,
    pub product_service: Arc<ProductService>,
    pub order_service: Arc<OrderService>,
    pub metrics: Arc<Metrics>,
}

/// Create API router with all endpoints
pub fn create_api_router(
    auth_service: Arc<AuthService>,
    cart_service: Arc<CartService>,
    product_service: Arc<ProductService>,
    order_service: Arc<OrderService>,
    metrics: Arc<Metrics>,
) -> Router {
    let state = ApiState {
        auth_service,
        cart_service,
        product_service,
        order_service,
        metrics,
    };

    Router::new()
        // Accounts and sessions
        .route("/register/customer", post(register_customer))
        .route("/register/seller", post(register_seller))
        .route("/login/customer", post(login_customer))
        .route("/login/seller", post(login_seller))
        .route("/logout/customer", post(logout_customer))
        .route("/logout/seller", post(logout_seller))
        .route("/customer/current", get(current_customer))
        .route("/seller/current", get(current_seller))
        // Cart
        .route("/cart/add", post(add_to_cart))
        .route("/cart", get(get_cart).delete(remove_from_cart))
        .route("/cart/clear", delete(clear_cart))
        // Catalog
        .route(
            "/products",
            get(list_products).post(create_product).put(update_product),
        )
        .route("/products/seller/:seller_id", get(list_seller_products))
        .route("/product/:product_id", get(get_product).delete(delete_product))
        // Orders
        .route("/orders", post(place_order))
        .route(
            "/orders/:order_id",
            get(get_order).put(update_order).delete(cancel_order),
        )
        .route("/orders/date/:date", get(list_orders_by_date))
        .route("/customer/orders", get(list_customer_orders))
        .with_state(state)
}

/// Pull the session token out of the `token` request header
pub(crate) fn extract_token(headers: &HeaderMap) -> Result<&str, (StatusCode, Json<Value>)> {
    headers
        .get("token")
        .and_then(|value| value.to_str().ok())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| service_error_to_response(LoginError::MissingToken.into()))
}

/// Map a service error to an HTTP status and JSON error body
pub(crate) fn service_error_to_response(err: ServiceError) -> (StatusCode, Json<Value>) {
    let (status, message) = match err {
        ServiceError::CustomerNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::SellerNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::ProductNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::EmptyCatalog => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::CartItemNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::OrderNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::OrderError { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::ValidationError { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::DuplicateMobile { .. } => (StatusCode::CONFLICT, err.to_string()),
        ServiceError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        ServiceError::ProductUnavailable { .. } => (StatusCode::CONFLICT, err.to_string()),
        ServiceError::Login { ref source } => match source {
            LoginError::AlreadyLoggedIn => (StatusCode::CONFLICT, err.to_string()),
            _ => (StatusCode::UNAUTHORIZED, err.to_string()),
        },
        ServiceError::Repository { source } => match source {
            RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            RepositoryError::Timeout => {
                (StatusCode::REQUEST_TIMEOUT, "Request timeout".to_string())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        },
    };

    (
        status,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let (status, _) = service_error_to_response(ServiceError::ProductNotFound {
            id: "P001".to_string(),
        });
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = service_error_to_response(ServiceError::EmptyCatalog);
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = service_error_to_response(LoginError::SessionExpired.into());
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = service_error_to_response(LoginError::AlreadyLoggedIn.into());
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = service_error_to_response(ServiceError::InsufficientStock {
            requested: 5,
            available: 2,
        });
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_extract_token() {
        let mut headers = HeaderMap::new();
        assert!(extract_token(&headers).is_err());

        headers.insert("token", "customer_abc123".parse().unwrap());
        assert_eq!(extract_token(&headers).unwrap(), "customer_abc123");
    }
}
