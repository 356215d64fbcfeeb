use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::FromRow;
use tracing::{debug, info, instrument};

use super::customer_repository::parse_timestamp;
use super::database::DbPool;
use crate::models::{Cart, CartItem, RepositoryError, RepositoryResult};

/// Trait defining the interface for cart data access operations
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Load a customer's cart with its line items
    async fn find_by_customer(&self, customer_id: &str) -> RepositoryResult<Option<Cart>>;

    /// Persist a cart and its line items, replacing any stored state
    async fn save(&self, cart: Cart) -> RepositoryResult<Cart>;

    /// Delete a customer's cart entirely
    async fn delete_by_customer(&self, customer_id: &str) -> RepositoryResult<()>;
}

/// SQLite implementation of the CartRepository trait
pub struct SqliteCartRepository {
    pool: DbPool,
}

impl SqliteCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct CartRow {
    cart_id: String,
    customer_id: String,
    created_at: String,
    updated_at: String,
}

#[derive(FromRow)]
struct CartItemRow {
    cart_item_id: String,
    product_id: String,
    quantity: i64,
    unit_price: String,
    added_at: String,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        Ok(CartItem {
            cart_item_id: row.cart_item_id,
            product_id: row.product_id,
            quantity: row.quantity.max(0) as u32,
            unit_price: Decimal::from_str(&row.unit_price).map_err(|e| {
                RepositoryError::Serialization {
                    message: format!("invalid price {:?}: {e}", row.unit_price),
                }
            })?,
            added_at: parse_timestamp(&row.added_at)?,
        })
    }
}

#[async_trait]
impl CartRepository for SqliteCartRepository {
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn find_by_customer(&self, customer_id: &str) -> RepositoryResult<Option<Cart>> {
        let row: Option<CartRow> = sqlx::query_as(
            "SELECT cart_id, customer_id, created_at, updated_at FROM carts WHERE customer_id = ?",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            debug!("No cart for customer");
            return Ok(None);
        };

        let item_rows: Vec<CartItemRow> = sqlx::query_as(
            r#"
            SELECT cart_item_id, product_id, quantity, unit_price, added_at
            FROM cart_items WHERE cart_id = ? ORDER BY added_at
            "#,
        )
        .bind(&row.cart_id)
        .fetch_all(&self.pool)
        .await?;

        let items = item_rows
            .into_iter()
            .map(CartItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Cart {
            cart_id: row.cart_id,
            customer_id: row.customer_id,
            items,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        }))
    }

    #[instrument(skip(self, cart), fields(cart_id = %cart.cart_id, items = cart.items.len()))]
    async fn save(&self, cart: Cart) -> RepositoryResult<Cart> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO carts (cart_id, customer_id, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(customer_id) DO UPDATE SET updated_at = excluded.updated_at
            "#,
        )
        .bind(&cart.cart_id)
        .bind(&cart.customer_id)
        .bind(cart.created_at.to_rfc3339())
        .bind(cart.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        // The upsert keeps the original cart_id on conflict, so resolve
        // the stored id before rewriting the line items.
        let (cart_id,): (String,) =
            sqlx::query_as("SELECT cart_id FROM carts WHERE customer_id = ?")
                .bind(&cart.customer_id)
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
            .bind(&cart_id)
            .execute(&mut *tx)
            .await?;

        for item in &cart.items {
            sqlx::query(
                r#"
                INSERT INTO cart_items (cart_item_id, cart_id, product_id, quantity, unit_price, added_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.cart_item_id)
            .bind(&cart_id)
            .bind(&item.product_id)
            .bind(item.quantity as i64)
            .bind(item.unit_price.to_string())
            .bind(item.added_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!("Cart saved");
        Ok(Cart { cart_id, ..cart })
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn delete_by_customer(&self, customer_id: &str) -> RepositoryResult<()> {
        sqlx::query("DELETE FROM carts WHERE customer_id = ?")
            .bind(customer_id)
            .execute(&self.pool)
            .await?;

        info!("Cart deleted");
        Ok(())
    }
}
