use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::models::{
    AddCartItemRequest, Cart, CartItem, CartItemResponse, CartResponse, Product,
    RemoveCartItemRequest, ServiceError, ServiceResult,
};
use crate::repositories::{CartRepository, ProductRepository};

/// Service for managing shopping carts
pub struct CartService {
    cart_repository: Arc<dyn CartRepository>,
    product_repository: Arc<dyn ProductRepository>,
}

impl CartService {
    /// Create a new CartService
    pub fn new(
        cart_repository: Arc<dyn CartRepository>,
        product_repository: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            cart_repository,
            product_repository,
        }
    }

    /// Get a customer's cart, materializing an empty one when none exists
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn get_cart(&self, customer_id: &str) -> ServiceResult<CartResponse> {
        info!("Getting cart");

        let cart = match self.cart_repository.find_by_customer(customer_id).await? {
            Some(cart) => cart,
            None => {
                info!("No cart yet, returning empty cart");
                Cart::new(customer_id.to_string())
            }
        };

        let response = self.cart_to_response(cart).await?;
        info!("Cart retrieved with {} items", response.cart_items.len());
        Ok(response)
    }

    /// Add a product to the cart, bumping the quantity of an existing line
    #[instrument(skip(self, request), fields(customer_id = %customer_id, product_id = %request.product_id, quantity = request.quantity))]
    pub async fn add_product(
        &self,
        customer_id: &str,
        request: AddCartItemRequest,
    ) -> ServiceResult<CartResponse> {
        info!("Adding product to cart");

        self.validate_quantity(request.quantity)?;

        let product = self
            .product_repository
            .find_by_id(&request.product_id)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound {
                id: request.product_id.clone(),
            })?;

        if !product.is_available() {
            return Err(ServiceError::ProductUnavailable {
                product_id: product.product_id,
            });
        }

        let mut cart = match self.cart_repository.find_by_customer(customer_id).await? {
            Some(cart) => cart,
            None => Cart::new(customer_id.to_string()),
        };

        // Stock check covers the line total, not only the increment
        let in_cart = cart
            .get_item(&request.product_id)
            .map(|item| item.quantity)
            .unwrap_or(0);
        if product.quantity < in_cart + request.quantity {
            return Err(ServiceError::InsufficientStock {
                requested: in_cart + request.quantity,
                available: product.quantity,
            });
        }

        cart.add_item(request.product_id, request.quantity, product.price);

        let saved = self.cart_repository.save(cart).await?;
        let response = self.cart_to_response(saved).await?;

        info!("Product added to cart");
        Ok(response)
    }

    /// Remove a line item from the cart
    #[instrument(skip(self, request), fields(customer_id = %customer_id, product_id = %request.product_id))]
    pub async fn remove_product(
        &self,
        customer_id: &str,
        request: RemoveCartItemRequest,
    ) -> ServiceResult<CartResponse> {
        info!("Removing product from cart");

        let mut cart = self
            .cart_repository
            .find_by_customer(customer_id)
            .await?
            .ok_or_else(|| ServiceError::CartItemNotFound {
                product_id: request.product_id.clone(),
            })?;

        if !cart.remove_item(&request.product_id) {
            warn!("Product not in cart");
            return Err(ServiceError::CartItemNotFound {
                product_id: request.product_id,
            });
        }

        let saved = self.cart_repository.save(cart).await?;
        let response = self.cart_to_response(saved).await?;

        info!("Product removed from cart");
        Ok(response)
    }

    /// Empty the cart. Clearing a cart that was never created is a no-op.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn clear_cart(&self, customer_id: &str) -> ServiceResult<()> {
        info!("Clearing cart");

        let mut cart = match self.cart_repository.find_by_customer(customer_id).await? {
            Some(cart) => cart,
            None => {
                info!("No cart to clear");
                return Ok(());
            }
        };

        cart.clear();
        self.cart_repository.save(cart).await?;

        info!("Cart cleared");
        Ok(())
    }

    /// Convert a Cart to a CartResponse with catalog details joined in
    async fn cart_to_response(&self, cart: Cart) -> ServiceResult<CartResponse> {
        let mut cart_items = Vec::with_capacity(cart.items.len());

        for item in &cart.items {
            match self.product_repository.find_by_id(&item.product_id).await? {
                Some(product) => cart_items.push(Self::item_response(item, &product)),
                None => {
                    warn!(product_id = %item.product_id, "Product missing for cart item");
                    cart_items.push(CartItemResponse {
                        cart_item_id: item.cart_item_id.clone(),
                        product_id: item.product_id.clone(),
                        product_name: "Product no longer listed".to_string(),
                        quantity: item.quantity,
                        unit_price: item.unit_price,
                        total_price: item.total_price(),
                        is_available: false,
                        added_at: item.added_at,
                    });
                }
            }
        }

        Ok(CartResponse {
            cart_id: cart.cart_id.clone(),
            customer_id: cart.customer_id.clone(),
            total_items: cart.total_items(),
            total_price: cart.total_price(),
            updated_at: cart.updated_at,
            cart_items,
        })
    }

    fn item_response(item: &CartItem, product: &Product) -> CartItemResponse {
        CartItemResponse {
            cart_item_id: item.cart_item_id.clone(),
            product_id: item.product_id.clone(),
            product_name: product.product_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price: item.total_price(),
            is_available: product.is_available(),
            added_at: item.added_at,
        }
    }

    fn validate_quantity(&self, quantity: u32) -> ServiceResult<()> {
        if quantity == 0 {
            return Err(ServiceError::ValidationError {
                message: "Quantity must be at least 1".to_string(),
            });
        }
        if quantity > 100 {
            return Err(ServiceError::ValidationError {
                message: "Quantity cannot exceed 100".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateProductRequest, RepositoryError};
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;

    mock! {
        TestCartRepository {}

        #[async_trait]
        impl CartRepository for TestCartRepository {
            async fn find_by_customer(&self, customer_id: &str) -> Result<Option<Cart>, RepositoryError>;
            async fn save(&self, cart: Cart) -> Result<Cart, RepositoryError>;
            async fn delete_by_customer(&self, customer_id: &str) -> Result<(), RepositoryError>;
        }
    }

    mock! {
        TestProductRepository {}

        #[async_trait]
        impl ProductRepository for TestProductRepository {
            async fn create(&self, product: Product) -> Result<Product, RepositoryError>;
            async fn find_by_id(&self, product_id: &str) -> Result<Option<Product>, RepositoryError>;
            async fn find_all(&self) -> Result<Vec<Product>, RepositoryError>;
            async fn find_by_seller(&self, seller_id: &str) -> Result<Vec<Product>, RepositoryError>;
            async fn update(&self, product: Product) -> Result<Product, RepositoryError>;
            async fn delete(&self, product_id: &str) -> Result<(), RepositoryError>;
        }
    }

    fn test_product() -> Product {
        let mut product = Product::new(
            "S00000001".to_string(),
            CreateProductRequest {
                product_name: "Wireless Mouse".to_string(),
                manufacturer: None,
                description: None,
                category: None,
                price: dec!(799.00),
                quantity: 10,
            },
        );
        product.product_id = "P00000001".to_string();
        product
    }

    fn test_cart() -> Cart {
        let mut cart = Cart::new("C00000001".to_string());
        cart.add_item("P00000001".to_string(), 2, dec!(799.00));
        cart
    }

    #[tokio::test]
    async fn test_get_cart_when_none_exists() {
        let mut carts = MockTestCartRepository::new();
        carts
            .expect_find_by_customer()
            .with(eq("C00000001"))
            .times(1)
            .returning(|_| Ok(None));

        let service = CartService::new(Arc::new(carts), Arc::new(MockTestProductRepository::new()));

        let response = service.get_cart("C00000001").await.unwrap();
        assert_eq!(response.customer_id, "C00000001");
        assert!(response.cart_items.is_empty());
        assert_eq!(response.total_items, 0);
    }

    #[tokio::test]
    async fn test_add_product_creates_cart() {
        let mut carts = MockTestCartRepository::new();
        carts
            .expect_find_by_customer()
            .times(1)
            .returning(|_| Ok(None));
        carts.expect_save().times(1).returning(Ok);

        let mut products = MockTestProductRepository::new();
        products
            .expect_find_by_id()
            .with(eq("P00000001"))
            .returning(|_| Ok(Some(test_product())));

        let service = CartService::new(Arc::new(carts), Arc::new(products));

        let response = service
            .add_product(
                "C00000001",
                AddCartItemRequest {
                    product_id: "P00000001".to_string(),
                    quantity: 2,
                },
            )
            .await
            .unwrap();

        assert_eq!(response.total_items, 2);
        assert_eq!(response.total_price, dec!(1598.00));
        assert_eq!(response.cart_items[0].product_name, "Wireless Mouse");
    }

    #[tokio::test]
    async fn test_add_product_insufficient_stock() {
        let mut carts = MockTestCartRepository::new();
        carts
            .expect_find_by_customer()
            .times(1)
            .returning(|_| Ok(Some(test_cart())));

        let mut products = MockTestProductRepository::new();
        products
            .expect_find_by_id()
            .returning(|_| Ok(Some(test_product())));

        let service = CartService::new(Arc::new(carts), Arc::new(products));

        // 2 already in the cart, stock is 10, asking for 9 more
        let result = service
            .add_product(
                "C00000001",
                AddCartItemRequest {
                    product_id: "P00000001".to_string(),
                    quantity: 9,
                },
            )
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::InsufficientStock {
                requested: 11,
                available: 10
            }
        ));
    }

    #[tokio::test]
    async fn test_add_unknown_product() {
        let mut products = MockTestProductRepository::new();
        products.expect_find_by_id().returning(|_| Ok(None));

        let service = CartService::new(
            Arc::new(MockTestCartRepository::new()),
            Arc::new(products),
        );

        let result = service
            .add_product(
                "C00000001",
                AddCartItemRequest {
                    product_id: "P99999999".to_string(),
                    quantity: 1,
                },
            )
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::ProductNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_add_zero_quantity_rejected() {
        let service = CartService::new(
            Arc::new(MockTestCartRepository::new()),
            Arc::new(MockTestProductRepository::new()),
        );

        let result = service
            .add_product(
                "C00000001",
                AddCartItemRequest {
                    product_id: "P00000001".to_string(),
                    quantity: 0,
                },
            )
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::ValidationError { .. }
        ));
    }

    #[tokio::test]
    async fn test_remove_product_not_in_cart() {
        let mut carts = MockTestCartRepository::new();
        carts
            .expect_find_by_customer()
            .times(1)
            .returning(|_| Ok(Some(test_cart())));

        let service = CartService::new(Arc::new(carts), Arc::new(MockTestProductRepository::new()));

        let result = service
            .remove_product(
                "C00000001",
                RemoveCartItemRequest {
                    product_id: "P99999999".to_string(),
                },
            )
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::CartItemNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_remove_product_success() {
        let mut carts = MockTestCartRepository::new();
        carts
            .expect_find_by_customer()
            .times(1)
            .returning(|_| Ok(Some(test_cart())));
        carts.expect_save().times(1).returning(Ok);

        let service = CartService::new(Arc::new(carts), Arc::new(MockTestProductRepository::new()));

        let response = service
            .remove_product(
                "C00000001",
                RemoveCartItemRequest {
                    product_id: "P00000001".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(response.cart_items.is_empty());
        assert_eq!(response.total_items, 0);
    }

    #[tokio::test]
    async fn test_clear_missing_cart_is_noop() {
        let mut carts = MockTestCartRepository::new();
        carts
            .expect_find_by_customer()
            .times(1)
            .returning(|_| Ok(None));

        let service = CartService::new(Arc::new(carts), Arc::new(MockTestProductRepository::new()));

        assert!(service.clear_cart("C00000001").await.is_ok());
    }
}
