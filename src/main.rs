use axum::{
    middleware,
    routing::get,
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use storefront_rs::{
    handlers::{
        cors_middleware, create_api_router, health_check, metrics_handler,
        request_validation_middleware, security_headers_middleware,
    },
    init_observability,
    observability::{observability_middleware, Metrics},
    repositories::{
        create_pool, run_migrations, SqliteCartRepository, SqliteCustomerRepository,
        SqliteOrderRepository, SqliteProductRepository, SqliteSellerRepository,
        SqliteSessionRepository,
    },
    services::{AuthService, CartService, OrderService, ProductService},
    shutdown_observability, Config,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first (basic logging only)
    let config = Config::from_environment()?;
    println!("Configuration loaded successfully");

    // Initialize comprehensive observability
    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        config
            .observability
            .otlp_endpoint
            .as_deref()
            .unwrap_or("http://localhost:4317"),
        config.observability.enable_json_logging,
    )?;

    info!("Starting storefront-rs service");
    info!(
        "Service: {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Database: {}", config.database.database_url);

    // Initialize metrics
    let metrics = Arc::new(Metrics::new()?);
    info!("Metrics initialized successfully");

    // Open the database and bring the schema up to date
    let pool = create_pool(
        &config.database.database_url,
        config.database.max_connections,
    )
    .await?;
    run_migrations(&pool).await?;
    metrics.set_active_connections(pool.size() as f64);
    info!("Database initialized successfully");

    // Initialize repositories
    let customer_repository = Arc::new(SqliteCustomerRepository::new(pool.clone()));
    let seller_repository = Arc::new(SqliteSellerRepository::new(pool.clone()));
    let product_repository = Arc::new(SqliteProductRepository::new(pool.clone()));
    let cart_repository = Arc::new(SqliteCartRepository::new(pool.clone()));
    let order_repository = Arc::new(SqliteOrderRepository::new(pool.clone()));
    let session_repository = Arc::new(SqliteSessionRepository::new(pool.clone()));
    info!("Repositories initialized successfully");

    // Initialize services
    let auth_service = Arc::new(AuthService::new(
        customer_repository,
        seller_repository,
        session_repository,
        config.auth.session_ttl_seconds,
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
    info!("Services initialized successfully");

    // Build the application router
    let app = create_app(
        metrics,
        auth_service,
        cart_service,
        product_service,
        order_service,
    );

    // Create socket address
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Server listening on {}", addr);

    // Create TCP listener
    let listener = TcpListener::bind(addr).await?;

    // Set up graceful shutdown
    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Shutdown signal received");
        shutdown_observability().await;
    };

    // Start the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn create_app(
    metrics: Arc<Metrics>,
    auth_service: Arc<AuthService>,
    cart_service: Arc<CartService>,
    product_service: Arc<ProductService>,
    order_service: Arc<OrderService>,
) -> Router {
    let metrics_for_middleware = metrics.clone();

    Router::new()
        // Health and metrics endpoints (with metrics state)
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        // Store API endpoints
        .merge(create_api_router(
            auth_service,
            cart_service,
            product_service,
            order_service,
            metrics_for_middleware.clone(),
        ))
        // Add middleware layers (order matters - outer to inner)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(cors_middleware))
        .layer(middleware::from_fn(request_validation_middleware))
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
