use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::models::{
    CreateProductRequest, Product, ProductListResponse, ServiceError, ServiceResult,
    UpdateProductRequest,
};
use crate::repositories::ProductRepository;

/// Service for catalog management
pub struct ProductService {
    product_repository: Arc<dyn ProductRepository>,
}

impl ProductService {
    /// Create a new ProductService
    pub fn new(product_repository: Arc<dyn ProductRepository>) -> Self {
        Self { product_repository }
    }

    /// List the whole catalog. An empty catalog is an error, matching the
    /// storefront's contract.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> ServiceResult<ProductListResponse> {
        info!("Listing products");

        let products = self.product_repository.find_all().await?;
        if products.is_empty() {
            warn!("Catalog is empty");
            return Err(ServiceError::EmptyCatalog);
        }

        let total_count = products.len();
        info!("Found {} products", total_count);
        Ok(ProductListResponse {
            products,
            total_count,
        })
    }

    /// Fetch a single product
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: &str) -> ServiceResult<Product> {
        self.product_repository
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound {
                id: product_id.to_string(),
            })
    }

    /// List a seller's products; an empty list is fine here
    #[instrument(skip(self), fields(seller_id = %seller_id))]
    pub async fn list_by_seller(&self, seller_id: &str) -> ServiceResult<ProductListResponse> {
        info!("Listing products for seller");

        let products = self.product_repository.find_by_seller(seller_id).await?;
        let total_count = products.len();
        Ok(ProductListResponse {
            products,
            total_count,
        })
    }

    /// Create a product attributed to the given seller
    #[instrument(skip(self, request), fields(seller_id = %seller_id, product_name = %request.product_name))]
    pub async fn create_product(
        &self,
        seller_id: &str,
        request: CreateProductRequest,
    ) -> ServiceResult<Product> {
        info!("Creating product");

        self.validate_create_request(&request)?;

        let product = self
            .product_repository
            .create(Product::new(seller_id.to_string(), request))
            .await?;

        info!(product_id = %product.product_id, "Product created");
        Ok(product)
    }

    /// Apply an update request to an existing product. Only the listing
    /// seller may change it.
    #[instrument(skip(self, request), fields(seller_id = %seller_id, product_id = %request.product_id))]
    pub async fn update_product(
        &self,
        seller_id: &str,
        request: UpdateProductRequest,
    ) -> ServiceResult<Product> {
        info!("Updating product");

        if let Some(price) = request.price {
            self.validate_price(price)?;
        }

        let mut product = self.get_product(&request.product_id).await?;

        if product.seller_id != seller_id {
            warn!("Product belongs to another seller");
            return Err(ServiceError::ProductNotFound {
                id: request.product_id,
            });
        }

        product.update(request);
        let updated = self.product_repository.update(product).await?;

        info!("Product updated");
        Ok(updated)
    }

    /// Delete a product. Only the listing seller may remove it.
    #[instrument(skip(self), fields(seller_id = %seller_id, product_id = %product_id))]
    pub async fn delete_product(&self, seller_id: &str, product_id: &str) -> ServiceResult<()> {
        info!("Deleting product");

        let product = self.get_product(product_id).await?;
        if product.seller_id != seller_id {
            warn!("Product belongs to another seller");
            return Err(ServiceError::ProductNotFound {
                id: product_id.to_string(),
            });
        }

        self.product_repository.delete(product_id).await?;

        info!("Product deleted");
        Ok(())
    }

    fn validate_create_request(&self, request: &CreateProductRequest) -> ServiceResult<()> {
        if request.product_name.trim().is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Product name cannot be empty".to_string(),
            });
        }
        self.validate_price(request.price)
    }

    fn validate_price(&self, price: Decimal) -> ServiceResult<()> {
        if price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError {
                message: "Price must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
