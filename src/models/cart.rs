use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shopping cart for a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub cart_id: String,
    pub customer_id: String,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Individual line item in a shopping cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub cart_item_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub added_at: DateTime<Utc>,
}

/// Request model for adding a product to the cart
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

/// Request model for removing a product from the cart
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCartItemRequest {
    pub product_id: String,
}

/// Response model for cart operations, with product details joined in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub cart_id: String,
    pub customer_id: String,
    pub cart_items: Vec<CartItemResponse>,
    pub total_items: u32,
    pub total_price: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Cart line item enriched with catalog details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub cart_item_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub is_available: bool,
    pub added_at: DateTime<Utc>,
}

impl Cart {
    /// Create a new empty cart for a customer
    pub fn new(customer_id: String) -> Self {
        let now = Utc::now();
        Self {
            cart_id: format!(
                "CT{}",
                Uuid::new_v4()
                    .simple()
                    .to_string()
                    .get(0..8)
                    .unwrap_or("00000000")
            ),
            customer_id,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a product or bump the quantity of an existing line item
    pub fn add_item(&mut self, product_id: String, quantity: u32, unit_price: Decimal) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            existing.quantity += quantity;
        } else {
            self.items.push(CartItem::new(product_id, quantity, unit_price));
        }
        self.updated_at = Utc::now();
    }

    /// Remove a line item; returns false when the product was not in the cart
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        let original_len = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        let removed = self.items.len() != original_len;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Clear all line items
    pub fn clear(&mut self) {
        self.items.clear();
        self.updated_at = Utc::now();
    }

    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartItem::total_price).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get_item(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    pub fn contains_item(&self, product_id: &str) -> bool {
        self.items.iter().any(|item| item.product_id == product_id)
    }
}

impl CartItem {
    pub fn new(product_id: String, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            cart_item_id: format!(
                "CI{}",
                Uuid::new_v4()
                    .simple()
                    .to_string()
                    .get(0..8)
                    .unwrap_or("00000000")
            ),
            product_id,
            quantity,
            unit_price,
            added_at: Utc::now(),
        }
    }

    /// Line total (unit_price * quantity)
    pub fn total_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
