use async_trait::async_trait;
use sqlx::FromRow;
use tracing::{info, instrument};

use super::customer_repository::parse_timestamp;
use super::database::DbPool;
use crate::models::{RepositoryError, RepositoryResult, Seller};

/// Trait defining the interface for seller data access operations
#[async_trait]
pub trait SellerRepository: Send + Sync {
    /// Persist a new seller
    async fn create(&self, seller: Seller) -> RepositoryResult<Seller>;

    /// Find a seller by ID
    async fn find_by_id(&self, seller_id: &str) -> RepositoryResult<Option<Seller>>;

    /// Find a seller by mobile number (the login key)
    async fn find_by_mobile(&self, mobile: &str) -> RepositoryResult<Option<Seller>>;
}

/// SQLite implementation of the SellerRepository trait
pub struct SqliteSellerRepository {
    pool: DbPool,
}

impl SqliteSellerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SellerRow {
    seller_id: String,
    first_name: String,
    last_name: String,
    mobile: String,
    email_id: String,
    password: String,
    created_at: String,
}

impl TryFrom<SellerRow> for Seller {
    type Error = RepositoryError;

    fn try_from(row: SellerRow) -> Result<Self, Self::Error> {
        Ok(Seller {
            seller_id: row.seller_id,
            first_name: row.first_name,
            last_name: row.last_name,
            mobile: row.mobile,
            email_id: row.email_id,
            password: row.password,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

#[async_trait]
impl SellerRepository for SqliteSellerRepository {
    #[instrument(skip(self, seller), fields(seller_id = %seller.seller_id))]
    async fn create(&self, seller: Seller) -> RepositoryResult<Seller> {
        sqlx::query(
            r#"
            INSERT INTO sellers (seller_id, first_name, last_name, mobile, email_id,
                                 password, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&seller.seller_id)
        .bind(&seller.first_name)
        .bind(&seller.last_name)
        .bind(&seller.mobile)
        .bind(&seller.email_id)
        .bind(&seller.password)
        .bind(seller.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        info!("Seller created");
        Ok(seller)
    }

    #[instrument(skip(self), fields(seller_id = %seller_id))]
    async fn find_by_id(&self, seller_id: &str) -> RepositoryResult<Option<Seller>> {
        let row: Option<SellerRow> = sqlx::query_as(
            "SELECT seller_id, first_name, last_name, mobile, email_id, password, created_at \
             FROM sellers WHERE seller_id = ?",
        )
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Seller::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_mobile(&self, mobile: &str) -> RepositoryResult<Option<Seller>> {
        let row: Option<SellerRow> = sqlx::query_as(
            "SELECT seller_id, first_name, last_name, mobile, email_id, password, created_at \
             FROM sellers WHERE mobile = ?",
        )
        .bind(mobile)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Seller::try_from).transpose()
    }
}
