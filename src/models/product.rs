use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ProductStatus;

/// Catalog product listed by a seller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: String,
    pub seller_id: String,
    pub product_name: String,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub quantity: u32,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request model for listing a new product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub product_name: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price: Decimal,
    pub quantity: u32,
}

/// Request model for updating an existing product.
/// The web client PUTs the whole product, so `product_id` rides in the body.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub product_id: String,
    pub product_name: Option<String>,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<u32>,
    pub status: Option<ProductStatus>,
}

/// Response model for product listings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total_count: usize,
}

impl Product {
    /// Create a new product attributed to a seller
    pub fn new(seller_id: String, request: CreateProductRequest) -> Self {
        let now = Utc::now();
        Self {
            product_id: format!(
                "P{}",
                Uuid::new_v4()
                    .simple()
                    .to_string()
                    .get(0..8)
                    .unwrap_or("00000000")
            ),
            seller_id,
            product_name: request.product_name,
            manufacturer: request.manufacturer,
            description: request.description,
            category: request.category,
            price: request.price,
            quantity: request.quantity,
            status: if request.quantity > 0 {
                ProductStatus::Available
            } else {
                ProductStatus::OutOfStock
            },
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an update request, keeping status in sync with stock
    pub fn update(&mut self, request: UpdateProductRequest) {
        if let Some(name) = request.product_name {
            self.product_name = name;
        }
        if let Some(manufacturer) = request.manufacturer {
            self.manufacturer = Some(manufacturer);
        }
        if let Some(description) = request.description {
            self.description = Some(description);
        }
        if let Some(category) = request.category {
            self.category = Some(category);
        }
        if let Some(price) = request.price {
            self.price = price;
        }
        if let Some(status) = request.status {
            self.status = status;
        }
        if let Some(quantity) = request.quantity {
            self.set_stock(quantity);
        }
        self.updated_at = Utc::now();
    }

    /// Adjust stock, flipping availability at the zero boundary
    pub fn set_stock(&mut self, quantity: u32) {
        self.quantity = quantity;
        if quantity == 0 && self.status == ProductStatus::Available {
            self.status = ProductStatus::OutOfStock;
        } else if quantity > 0 && self.status == ProductStatus::OutOfStock {
            self.status = ProductStatus::Available;
        }
        self.updated_at = Utc::now();
    }

    /// Check whether the product can currently be purchased
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Available && self.quantity > 0
    }
}
