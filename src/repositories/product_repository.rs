use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::FromRow;
use tracing::{info, instrument};

use super::customer_repository::parse_timestamp;
use super::database::DbPool;
use crate::models::{Product, ProductStatus, RepositoryError, RepositoryResult};

/// Trait defining the interface for product data access operations
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Persist a new product
    async fn create(&self, product: Product) -> RepositoryResult<Product>;

    /// Find a product by ID
    async fn find_by_id(&self, product_id: &str) -> RepositoryResult<Option<Product>>;

    /// List the whole catalog
    async fn find_all(&self) -> RepositoryResult<Vec<Product>>;

    /// List a seller's products
    async fn find_by_seller(&self, seller_id: &str) -> RepositoryResult<Vec<Product>>;

    /// Update an existing product (all columns)
    async fn update(&self, product: Product) -> RepositoryResult<Product>;

    /// Delete a product
    async fn delete(&self, product_id: &str) -> RepositoryResult<()>;
}

/// SQLite implementation of the ProductRepository trait
pub struct SqliteProductRepository {
    pool: DbPool,
}

impl SqliteProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ProductRow {
    product_id: String,
    seller_id: String,
    product_name: String,
    manufacturer: Option<String>,
    description: Option<String>,
    category: Option<String>,
    price: String,
    quantity: i64,
    status: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            product_id: row.product_id,
            seller_id: row.seller_id,
            product_name: row.product_name,
            manufacturer: row.manufacturer,
            description: row.description,
            category: row.category,
            price: Decimal::from_str(&row.price).map_err(|e| RepositoryError::Serialization {
                message: format!("invalid price {:?}: {e}", row.price),
            })?,
            quantity: row.quantity.max(0) as u32,
            status: ProductStatus::from_str(&row.status)
                .map_err(|e| RepositoryError::Serialization { message: e })?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

const SELECT_COLUMNS: &str = "product_id, seller_id, product_name, manufacturer, description, \
                              category, price, quantity, status, created_at, updated_at";

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    #[instrument(skip(self, product), fields(product_id = %product.product_id))]
    async fn create(&self, product: Product) -> RepositoryResult<Product> {
        sqlx::query(
            r#"
            INSERT INTO products (product_id, seller_id, product_name, manufacturer, description,
                                  category, price, quantity, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.product_id)
        .bind(&product.seller_id)
        .bind(&product.product_name)
        .bind(&product.manufacturer)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price.to_string())
        .bind(product.quantity as i64)
        .bind(product.status.to_string())
        .bind(product.created_at.to_rfc3339())
        .bind(product.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        info!("Product created");
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn find_by_id(&self, product_id: &str) -> RepositoryResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE product_id = ?"
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM products ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    #[instrument(skip(self), fields(seller_id = %seller_id))]
    async fn find_by_seller(&self, seller_id: &str) -> RepositoryResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE seller_id = ? ORDER BY created_at DESC"
        ))
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    #[instrument(skip(self, product), fields(product_id = %product.product_id))]
    async fn update(&self, product: Product) -> RepositoryResult<Product> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                product_name = ?,
                manufacturer = ?,
                description = ?,
                category = ?,
                price = ?,
                quantity = ?,
                status = ?,
                updated_at = ?
            WHERE product_id = ?
            "#,
        )
        .bind(&product.product_name)
        .bind(&product.manufacturer)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price.to_string())
        .bind(product.quantity as i64)
        .bind(product.status.to_string())
        .bind(product.updated_at.to_rfc3339())
        .bind(&product.product_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        info!("Product updated");
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn delete(&self, product_id: &str) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE product_id = ?")
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        info!("Product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateProductRequest, CreateSellerRequest, Seller};
    use crate::repositories::database::test_pool;
    use crate::repositories::seller_repository::{SellerRepository, SqliteSellerRepository};
    use rust_decimal_macros::dec;

    async fn seed_seller(pool: &DbPool) -> Seller {
        let repo = SqliteSellerRepository::new(pool.clone());
        repo.create(Seller::new(CreateSellerRequest {
            first_name: "Ravi".to_string(),
            last_name: "Kumar".to_string(),
            mobile: "9123456780".to_string(),
            email_id: "ravi@example.com".to_string(),
            password: "sellerpass".to_string(),
        }))
        .await
        .unwrap()
    }

    fn test_product(seller_id: &str) -> Product {
        Product::new(
            seller_id.to_string(),
            CreateProductRequest {
                product_name: "Wireless Mouse".to_string(),
                manufacturer: Some("Logi".to_string()),
                description: None,
                category: Some("electronics".to_string()),
                price: dec!(799.00),
                quantity: 20,
            },
        )
    }

    #[tokio::test]
    async fn test_create_and_roundtrip() {
        let pool = test_pool().await;
        let seller = seed_seller(&pool).await;
        let repo = SqliteProductRepository::new(pool);

        let product = repo.create(test_product(&seller.seller_id)).await.unwrap();
        let found = repo
            .find_by_id(&product.product_id)
            .await
            .unwrap()
            .expect("product should exist");

        assert_eq!(found.price, dec!(799.00));
        assert_eq!(found.status, ProductStatus::Available);
        assert_eq!(found.quantity, 20);
    }

    #[tokio::test]
    async fn test_find_by_seller() {
        let pool = test_pool().await;
        let seller = seed_seller(&pool).await;
        let repo = SqliteProductRepository::new(pool);

        repo.create(test_product(&seller.seller_id)).await.unwrap();
        repo.create(test_product(&seller.seller_id)).await.unwrap();

        let listed = repo.find_by_seller(&seller.seller_id).await.unwrap();
        assert_eq!(listed.len(), 2);

        let none = repo.find_by_seller("S00000000").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let pool = test_pool().await;
        let seller = seed_seller(&pool).await;
        let repo = SqliteProductRepository::new(pool);

        let mut product = test_product(&seller.seller_id);
        product.product_id = "P00000000".to_string();

        match repo.update(product).await.unwrap_err() {
            RepositoryError::NotFound => {}
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = test_pool().await;
        let seller = seed_seller(&pool).await;
        let repo = SqliteProductRepository::new(pool);

        let product = repo.create(test_product(&seller.seller_id)).await.unwrap();
        repo.delete(&product.product_id).await.unwrap();

        assert!(repo.find_by_id(&product.product_id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&product.product_id).await.unwrap_err(),
            RepositoryError::NotFound
        ));
    }
}
