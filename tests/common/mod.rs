use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use storefront_rs::{
    handlers::{
        cors_middleware, create_api_router, health_check, metrics_handler,
        request_validation_middleware, security_headers_middleware,
    },
    observability::Metrics,
    repositories::{
        create_pool, run_migrations, SqliteCartRepository, SqliteCustomerRepository,
        SqliteOrderRepository, SqliteProductRepository, SqliteSellerRepository,
        SqliteSessionRepository,
    },
    services::{AuthService, CartService, OrderService, ProductService},
};

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
}

/// Build the full application over a fresh in-memory database
async fn create_test_app() -> Router {
    let pool = create_pool("sqlite::memory:", 1)
        .await
        .expect("Failed to create test pool");
    run_migrations(&pool).await.expect("Failed to run migrations");

    let customer_repository = Arc::new(SqliteCustomerRepository::new(pool.clone()));
    let seller_repository = Arc::new(SqliteSellerRepository::new(pool.clone()));
    let product_repository = Arc::new(SqliteProductRepository::new(pool.clone()));
    let cart_repository = Arc::new(SqliteCartRepository::new(pool.clone()));
    let order_repository = Arc::new(SqliteOrderRepository::new(pool.clone()));
    let session_repository = Arc::new(SqliteSessionRepository::new(pool));

    let auth_service = Arc::new(AuthService::new(
        customer_repository,
        seller_repository,
        session_repository,
        3600,
    ));
    let cart_service = Arc::new(CartService::new(
        cart_repository.clone(),
        product_repository.clone(),
    ));
    let product_service = Arc::new(ProductService::new(product_repository.clone()));
    let order_service = Arc::new(OrderService::new(
        order_repository,
        cart_repository,
        product_repository,
    ));

    let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));

    Router::new()
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics.clone())
        .merge(create_api_router(
            auth_service,
            cart_service,
            product_service,
            order_service,
            metrics.clone(),
        ))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(cors_middleware))
        .layer(middleware::from_fn(request_validation_middleware))
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let app = create_test_app().await;

        // Start server
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = Client::new();

        Self { client, base_url }
    }

    /// Register a customer and return their profile
    pub async fn register_customer(&self, mobile_no: &str) -> Value {
        let response = self
            .client
            .post(format!("{}/register/customer", self.base_url))
            .json(&json!({
                "firstName": "Asha",
                "lastName": "Rao",
                "mobileNo": mobile_no,
                "emailId": "asha@example.com",
                "password": "secret123",
                "address": {
                    "street": "12 MG Road",
                    "city": "Bengaluru",
                    "state": "KA",
                    "pincode": "560001"
                }
            }))
            .send()
            .await
            .expect("Failed to register customer");

        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse response")
    }

    /// Log a customer in and return the session token
    pub async fn login_customer(&self, mobile_no: &str) -> String {
        let response = self
            .client
            .post(format!("{}/login/customer", self.base_url))
            .json(&json!({ "mobileNo": mobile_no, "password": "secret123" }))
            .send()
            .await
            .expect("Failed to log customer in");

        assert_eq!(response.status().as_u16(), 202);
        let session: Value = response.json().await.expect("Failed to parse response");
        session["token"]
            .as_str()
            .expect("Expected session token")
            .to_string()
    }

    /// Register a seller and return their profile
    pub async fn register_seller(&self, mobile: &str) -> Value {
        let response = self
            .client
            .post(format!("{}/register/seller", self.base_url))
            .json(&json!({
                "firstName": "Ravi",
                "lastName": "Menon",
                "mobile": mobile,
                "emailId": "ravi@example.com",
                "password": "secret123"
            }))
            .send()
            .await
            .expect("Failed to register seller");

        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse response")
    }

    /// Log a seller in and return the session token
    pub async fn login_seller(&self, mobile: &str) -> String {
        let response = self
            .client
            .post(format!("{}/login/seller", self.base_url))
            .json(&json!({ "mobile": mobile, "password": "secret123" }))
            .send()
            .await
            .expect("Failed to log seller in");

        assert_eq!(response.status().as_u16(), 202);
        let session: Value = response.json().await.expect("Failed to parse response");
        session["token"]
            .as_str()
            .expect("Expected session token")
            .to_string()
    }

    /// List a product under the given seller token and return it
    pub async fn create_product(
        &self,
        seller_token: &str,
        name: &str,
        price: &str,
        quantity: u32,
    ) -> Value {
        let response = self
            .client
            .post(format!("{}/products", self.base_url))
            .header("token", seller_token)
            .json(&json!({
                "productName": name,
                "manufacturer": "Acme",
                "category": "general",
                "price": price,
                "quantity": quantity
            }))
            .send()
            .await
            .expect("Failed to create product");

        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse response")
    }

    /// Add a product to the customer's cart
    pub async fn add_to_cart(&self, customer_token: &str, product_id: &str, quantity: u32) -> Value {
        let response = self
            .client
            .post(format!("{}/cart/add", self.base_url))
            .header("token", customer_token)
            .json(&json!({ "productId": product_id, "quantity": quantity }))
            .send()
            .await
            .expect("Failed to add to cart");

        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse response")
    }

    /// Place an order from the customer's current cart
    pub async fn place_order(&self, customer_token: &str) -> Value {
        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .header("token", customer_token)
            .json(&json!({
                "cardNumber": "4111111111111111",
                "shippingAddress": {
                    "street": "12 MG Road",
                    "city": "Bengaluru",
                    "state": "KA",
                    "pincode": "560001"
                }
            }))
            .send()
            .await
            .expect("Failed to place order");

        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse response")
    }
}
