use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account types that can hold a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Customer,
    Seller,
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserType::Customer => write!(f, "customer"),
            UserType::Seller => write!(f, "seller"),
        }
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "customer" => Ok(UserType::Customer),
            "seller" => Ok(UserType::Seller),
            _ => Err(format!("Invalid user type: {}", s)),
        }
    }
}

/// Catalog availability for a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Available,
    OutOfStock,
    Discontinued,
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductStatus::Available => write!(f, "available"),
            ProductStatus::OutOfStock => write!(f, "out_of_stock"),
            ProductStatus::Discontinued => write!(f, "discontinued"),
        }
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(ProductStatus::Available),
            "out_of_stock" => Ok(ProductStatus::OutOfStock),
            "discontinued" => Ok(ProductStatus::Discontinued),
            _ => Err(format!("Invalid product status: {}", s)),
        }
    }
}

/// Lifecycle of a placed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Dispatched,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// An order can be cancelled until it has been delivered
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Dispatched)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Dispatched => write!(f, "dispatched"),
            OrderStatus::Delivered => write!(f, "delivered"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "dispatched" => Ok(OrderStatus::Dispatched),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_type_string_conversion() {
        assert_eq!(UserType::Customer.to_string(), "customer");
        assert_eq!(UserType::Seller.to_string(), "seller");

        assert_eq!("customer".parse::<UserType>().unwrap(), UserType::Customer);
        assert_eq!("SELLER".parse::<UserType>().unwrap(), UserType::Seller);

        assert!("admin".parse::<UserType>().is_err());
    }

    #[test]
    fn test_product_status_string_conversion() {
        assert_eq!(ProductStatus::Available.to_string(), "available");
        assert_eq!(ProductStatus::OutOfStock.to_string(), "out_of_stock");

        assert_eq!(
            "out_of_stock".parse::<ProductStatus>().unwrap(),
            ProductStatus::OutOfStock
        );
        assert!("gone".parse::<ProductStatus>().is_err());
    }

    #[test]
    fn test_order_status_cancellable() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Dispatched.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_serde_serialization() {
        let status = OrderStatus::Pending;
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, "\"pending\"");

        let deserialized: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, OrderStatus::Pending);
    }
}
