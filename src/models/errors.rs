use thiserror::Error;

/// Service-level errors that can occur in business logic
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Customer not found: {id}")]
    CustomerNotFound { id: String },

    #[error("Seller not found: {id}")]
    SellerNotFound { id: String },

    #[error("Product not found: {id}")]
    ProductNotFound { id: String },

    #[error("No products in catalog")]
    EmptyCatalog,

    #[error("Cart item not found: product_id={product_id}")]
    CartItemNotFound { product_id: String },

    #[error("Order not found: {id}")]
    OrderNotFound { id: String },

    #[error("Order error: {message}")]
    OrderError { message: String },

    #[error("Login error: {source}")]
    Login {
        #[from]
        source: LoginError,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Mobile number already registered: {mobile}")]
    DuplicateMobile { mobile: String },

    #[error("Insufficient stock: requested={requested}, available={available}")]
    InsufficientStock { requested: u32, available: u32 },

    #[error("Product unavailable: {product_id}")]
    ProductUnavailable { product_id: String },

    #[error("Repository error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },
}

/// Authentication and session failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("Invalid mobile number or password")]
    InvalidCredentials,

    #[error("No session found for token, please login first")]
    NotLoggedIn,

    #[error("Session expired, please login again")]
    SessionExpired,

    #[error("User already logged in with an active session")]
    AlreadyLoggedIn,

    #[error("Token header missing from request")]
    MissingToken,
}

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Row not found")]
    NotFound,

    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Timeout occurred during operation")]
    Timeout,
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::ConstraintViolation {
                    message: db_err.to_string(),
                }
            }
            sqlx::Error::PoolTimedOut => RepositoryError::Timeout,
            other => RepositoryError::Database {
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;
