use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::FromRow;
use tracing::{info, instrument};

use super::customer_repository::parse_timestamp;
use super::database::DbPool;
use crate::models::{Address, Order, OrderItem, OrderStatus, RepositoryError, RepositoryResult};

/// Trait defining the interface for order data access operations
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Atomically place an order: decrement the stock each line item
    /// consumes, persist the order with its items and empty the
    /// customer's cart. A stock shortfall rolls the whole thing back
    /// with `ConstraintViolation`.
    async fn place(&self, order: Order) -> RepositoryResult<Order>;

    /// Find an order by ID
    async fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>>;

    /// List a customer's orders, newest first
    async fn find_by_customer(&self, customer_id: &str) -> RepositoryResult<Vec<Order>>;

    /// List all orders placed on a given date
    async fn find_by_date(&self, date: NaiveDate) -> RepositoryResult<Vec<Order>>;

    /// Update an order's mutable columns (status, card, address)
    async fn update(&self, order: Order) -> RepositoryResult<Order>;
}

/// SQLite implementation of the OrderRepository trait
pub struct SqliteOrderRepository {
    pool: DbPool,
}

impl SqliteOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct OrderRow {
    order_id: String,
    customer_id: String,
    order_date: String,
    order_status: String,
    card_number: String,
    ship_street: String,
    ship_city: String,
    ship_state: String,
    ship_pincode: String,
    total: String,
    created_at: String,
    updated_at: String,
}

#[derive(FromRow)]
struct OrderItemRow {
    order_item_id: String,
    product_id: String,
    product_name: String,
    quantity: i64,
    unit_price: String,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(OrderItem {
            order_item_id: row.order_item_id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity.max(0) as u32,
            unit_price: parse_decimal(&row.unit_price)?,
        })
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw).map_err(|e| RepositoryError::Serialization {
        message: format!("invalid amount {raw:?}: {e}"),
    })
}

fn order_from_rows(row: OrderRow, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
    Ok(Order {
        order_id: row.order_id,
        customer_id: row.customer_id,
        date: NaiveDate::parse_from_str(&row.order_date, "%Y-%m-%d").map_err(|e| {
            RepositoryError::Serialization {
                message: format!("invalid date {:?}: {e}", row.order_date),
            }
        })?,
        order_status: OrderStatus::from_str(&row.order_status)
            .map_err(|e| RepositoryError::Serialization { message: e })?,
        card_number: row.card_number,
        shipping_address: Address {
            street: row.ship_street,
            city: row.ship_city,
            state: row.ship_state,
            pincode: row.ship_pincode,
        },
        items,
        total: parse_decimal(&row.total)?,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}

const SELECT_COLUMNS: &str = "order_id, customer_id, order_date, order_status, card_number, \
                              ship_street, ship_city, ship_state, ship_pincode, total, \
                              created_at, updated_at";

impl SqliteOrderRepository {
    async fn load_items(&self, order_id: &str) -> RepositoryResult<Vec<OrderItem>> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT order_item_id, product_id, product_name, quantity, unit_price
            FROM order_items WHERE order_id = ?
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderItem::try_from).collect()
    }

    async fn hydrate(&self, rows: Vec<OrderRow>) -> RepositoryResult<Vec<Order>> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.load_items(&row.order_id).await?;
            orders.push(order_from_rows(row, items)?);
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    #[instrument(skip(self, order), fields(order_id = %order.order_id, items = order.items.len()))]
    async fn place(&self, order: Order) -> RepositoryResult<Order> {
        let mut tx = self.pool.begin().await?;

        for item in &order.items {
            // Guarded decrement: the WHERE clause refuses to oversell
            // even when a concurrent order got there first.
            let result = sqlx::query(
                r#"
                UPDATE products SET
                    quantity = quantity - ?,
                    status = CASE WHEN quantity - ? = 0 THEN 'out_of_stock' ELSE status END,
                    updated_at = ?
                WHERE product_id = ? AND status = 'available' AND quantity >= ?
                "#,
            )
            .bind(item.quantity as i64)
            .bind(item.quantity as i64)
            .bind(order.updated_at.to_rfc3339())
            .bind(&item.product_id)
            .bind(item.quantity as i64)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(RepositoryError::ConstraintViolation {
                    message: format!("insufficient stock for product {}", item.product_id),
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO orders (order_id, customer_id, order_date, order_status, card_number,
                                ship_street, ship_city, ship_state, ship_pincode, total,
                                created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order.order_id)
        .bind(&order.customer_id)
        .bind(order.date.format("%Y-%m-%d").to_string())
        .bind(order.order_status.to_string())
        .bind(&order.card_number)
        .bind(&order.shipping_address.street)
        .bind(&order.shipping_address.city)
        .bind(&order.shipping_address.state)
        .bind(&order.shipping_address.pincode)
        .bind(order.total.to_string())
        .bind(order.created_at.to_rfc3339())
        .bind(order.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_item_id, order_id, product_id, product_name, quantity, unit_price)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.order_item_id)
            .bind(&order.order_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity as i64)
            .bind(item.unit_price.to_string())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            DELETE FROM cart_items
            WHERE cart_id IN (SELECT cart_id FROM carts WHERE customer_id = ?)
            "#,
        )
        .bind(&order.customer_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE carts SET updated_at = ? WHERE customer_id = ?")
            .bind(order.updated_at.to_rfc3339())
            .bind(&order.customer_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Order placed");
        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders WHERE order_id = ?"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.load_items(&row.order_id).await?;
        Ok(Some(order_from_rows(row, items)?))
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn find_by_customer(&self, customer_id: &str) -> RepositoryResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders WHERE customer_id = ? ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    #[instrument(skip(self), fields(date = %date))]
    async fn find_by_date(&self, date: NaiveDate) -> RepositoryResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders WHERE order_date = ? ORDER BY created_at DESC"
        ))
        .bind(date.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    #[instrument(skip(self, order), fields(order_id = %order.order_id, status = %order.order_status))]
    async fn update(&self, order: Order) -> RepositoryResult<Order> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                order_status = ?,
                card_number = ?,
                ship_street = ?,
                ship_city = ?,
                ship_state = ?,
                ship_pincode = ?,
                updated_at = ?
            WHERE order_id = ?
            "#,
        )
        .bind(order.order_status.to_string())
        .bind(&order.card_number)
        .bind(&order.shipping_address.street)
        .bind(&order.shipping_address.city)
        .bind(&order.shipping_address.state)
        .bind(&order.shipping_address.pincode)
        .bind(order.updated_at.to_rfc3339())
        .bind(&order.order_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        info!("Order updated");
        Ok(order)
    }
}
