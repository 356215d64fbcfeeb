use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::models::{
    Order, PlaceOrderRequest, RepositoryError, ServiceError, ServiceResult, UpdateOrderRequest,
};
use crate::repositories::{CartRepository, OrderRepository, ProductRepository};

/// Service for placing and managing orders
pub struct OrderService {
    order_repository: Arc<dyn OrderRepository>,
    cart_repository: Arc<dyn CartRepository>,
    product_repository: Arc<dyn ProductRepository>,
}

impl OrderService {
    /// Create a new OrderService
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        cart_repository: Arc<dyn CartRepository>,
        product_repository: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            order_repository,
            cart_repository,
            product_repository,
        }
    }

    /// Place an order from the customer's cart. Snapshots the line items,
    /// then decrements stock and clears the cart in one transaction.
    #[instrument(skip(self, request), fields(customer_id = %customer_id))]
    pub async fn place_order(
        &self,
        customer_id: &str,
        request: PlaceOrderRequest,
    ) -> ServiceResult<Order> {
        info!("Placing order");

        if request.card_number.trim().is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Card number cannot be empty".to_string(),
            });
        }

        let cart = self
            .cart_repository
            .find_by_customer(customer_id)
            .await?
            .ok_or_else(|| ServiceError::OrderError {
                message: "Cart is empty, nothing to order".to_string(),
            })?;

        if cart.is_empty() {
            return Err(ServiceError::OrderError {
                message: "Cart is empty, nothing to order".to_string(),
            });
        }

        // Checked up front for precise errors; the repository re-checks
        // stock inside the placement transaction.
        let mut products = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let product = self
                .product_repository
                .find_by_id(&item.product_id)
                .await?
                .ok_or_else(|| ServiceError::ProductNotFound {
                    id: item.product_id.clone(),
                })?;

            if !product.is_available() {
                return Err(ServiceError::ProductUnavailable {
                    product_id: product.product_id,
                });
            }
            if product.quantity < item.quantity {
                return Err(ServiceError::InsufficientStock {
                    requested: item.quantity,
                    available: product.quantity,
                });
            }
            products.push(product);
        }

        let item_names: Vec<(String, String)> = products
            .iter()
            .map(|p| (p.product_id.clone(), p.product_name.clone()))
            .collect();

        let order = Order::from_cart(&cart, &item_names, request);

        // Stock decrement, order insert and cart clearing commit or roll
        // back together inside the repository.
        let order = match self.order_repository.place(order).await {
            Ok(order) => order,
            Err(RepositoryError::ConstraintViolation { message }) => {
                warn!(error = %message, "Stock changed while placing order");
                return Err(ServiceError::OrderError {
                    message: "Stock changed while placing the order, please retry".to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        info!(order_id = %order.order_id, total = %order.total, "Order placed");
        Ok(order)
    }

    /// Fetch one of the customer's orders
    #[instrument(skip(self), fields(customer_id = %customer_id, order_id = %order_id))]
    pub async fn get_order(&self, customer_id: &str, order_id: &str) -> ServiceResult<Order> {
        let order = self.find_owned_order(customer_id, order_id).await?;
        Ok(order)
    }

    /// List all orders of a customer, newest first
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn list_customer_orders(&self, customer_id: &str) -> ServiceResult<Vec<Order>> {
        info!("Listing customer orders");
        let orders = self.order_repository.find_by_customer(customer_id).await?;
        info!("Found {} orders", orders.len());
        Ok(orders)
    }

    /// List all orders placed on a calendar date
    #[instrument(skip(self), fields(date = %date))]
    pub async fn list_orders_by_date(&self, date: NaiveDate) -> ServiceResult<Vec<Order>> {
        info!("Listing orders by date");
        let orders = self.order_repository.find_by_date(date).await?;
        Ok(orders)
    }

    /// Cancel an order and restore the stock it consumed
    #[instrument(skip(self), fields(customer_id = %customer_id, order_id = %order_id))]
    pub async fn cancel_order(&self, customer_id: &str, order_id: &str) -> ServiceResult<Order> {
        info!("Cancelling order");

        let mut order = self.find_owned_order(customer_id, order_id).await?;

        if !order.order_status.is_cancellable() {
            warn!(status = %order.order_status, "Order not cancellable");
            return Err(ServiceError::OrderError {
                message: format!("Order cannot be cancelled in status {}", order.order_status),
            });
        }

        for item in &order.items {
            // A delisted product simply keeps its stock unrestored
            if let Some(mut product) =
                self.product_repository.find_by_id(&item.product_id).await?
            {
                product.set_stock(product.quantity + item.quantity);
                self.product_repository.update(product).await?;
            }
        }

        order.cancel();
        let order = self.order_repository.update(order).await?;

        info!("Order cancelled");
        Ok(order)
    }

    /// Change card and shipping details of a pending order
    #[instrument(skip(self, request), fields(customer_id = %customer_id, order_id = %order_id))]
    pub async fn update_order(
        &self,
        customer_id: &str,
        order_id: &str,
        request: UpdateOrderRequest,
    ) -> ServiceResult<Order> {
        info!("Updating order");

        let mut order = self.find_owned_order(customer_id, order_id).await?;

        if !order.is_editable() {
            warn!(status = %order.order_status, "Order not editable");
            return Err(ServiceError::OrderError {
                message: format!("Order cannot be changed in status {}", order.order_status),
            });
        }

        order.apply_update(request);
        let order = self.order_repository.update(order).await?;

        info!("Order updated");
        Ok(order)
    }

    /// An order belonging to another customer is indistinguishable from a
    /// missing one.
    async fn find_owned_order(&self, customer_id: &str, order_id: &str) -> ServiceResult<Order> {
        let order = self
            .order_repository
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::OrderNotFound {
                id: order_id.to_string(),
            })?;

        if order.customer_id != customer_id {
            warn!("Order belongs to another customer");
            return Err(ServiceError::OrderNotFound {
                id: order_id.to_string(),
            });
        }

        Ok(order)
    }
}
