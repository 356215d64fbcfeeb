// Repositories module - data access layer

pub mod cart_repository;
pub mod customer_repository;
pub mod database;
pub mod order_repository;
pub mod product_repository;
pub mod seller_repository;
pub mod session_repository;

pub use cart_repository::{CartRepository, SqliteCartRepository};
pub use customer_repository::{CustomerRepository, SqliteCustomerRepository};
pub use database::{create_pool, run_migrations, DbPool};
pub use order_repository::{OrderRepository, SqliteOrderRepository};
pub use product_repository::{ProductRepository, SqliteProductRepository};
pub use seller_repository::{SellerRepository, SqliteSellerRepository};
pub use session_repository::{SessionRepository, SqliteSessionRepository};
