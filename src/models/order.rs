use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Address, Cart, OrderStatus};

/// Order placed by a customer from the contents of their cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub customer_id: String,
    pub date: NaiveDate,
    pub order_status: OrderStatus,
    pub card_number: String,
    pub shipping_address: Address,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of a cart line item at order time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub order_item_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Request model for placing an order from the current cart
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub card_number: String,
    pub shipping_address: Address,
}

/// Request model for amending a pending order
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub card_number: Option<String>,
    pub shipping_address: Option<Address>,
}

impl Order {
    /// Create an order by snapshotting the cart; product names are joined
    /// in by the caller since the cart stores only product ids.
    pub fn from_cart(
        cart: &Cart,
        item_names: &[(String, String)],
        request: PlaceOrderRequest,
    ) -> Self {
        let now = Utc::now();
        let items: Vec<OrderItem> = cart
            .items
            .iter()
            .map(|item| OrderItem {
                order_item_id: format!(
                    "OI{}",
                    Uuid::new_v4()
                        .simple()
                        .to_string()
                        .get(0..8)
                        .unwrap_or("00000000")
                ),
                product_id: item.product_id.clone(),
                product_name: item_names
                    .iter()
                    .find(|(id, _)| *id == item.product_id)
                    .map(|(_, name)| name.clone())
                    .unwrap_or_default(),
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();

        let total = items
            .iter()
            .map(|item| item.unit_price * Decimal::from(item.quantity))
            .sum();

        Self {
            order_id: format!(
                "O{}",
                Uuid::new_v4()
                    .simple()
                    .to_string()
                    .get(0..8)
                    .unwrap_or("00000000")
            ),
            customer_id: cart.customer_id.clone(),
            date: now.date_naive(),
            order_status: OrderStatus::Pending,
            card_number: request.card_number,
            shipping_address: request.shipping_address,
            items,
            total,
            created_at: now,
            updated_at: now,
        }
    }

    /// Amend card/address details; only pending orders are editable
    pub fn apply_update(&mut self, request: UpdateOrderRequest) {
        if let Some(card_number) = request.card_number {
            self.card_number = card_number;
        }
        if let Some(address) = request.shipping_address {
            self.shipping_address = address;
        }
        self.updated_at = Utc::now();
    }

    pub fn cancel(&mut self) {
        self.order_status = OrderStatus::Cancelled;
        self.updated_at = Utc::now();
    }

    pub fn is_editable(&self) -> bool {
        self.order_status == OrderStatus::Pending
    }

    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}
