use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::models::{
    CreateCustomerRequest, CreateSellerRequest, Customer, CustomerLoginRequest, CustomerResponse,
    LoginError, RepositoryError, Seller, SellerLoginRequest, SellerResponse, ServiceError,
    ServiceResult, UserSession, UserType,
};
use crate::repositories::{CustomerRepository, SellerRepository, SessionRepository};

/// Service for account registration, login/logout and token validation
pub struct AuthService {
    customer_repository: Arc<dyn CustomerRepository>,
    seller_repository: Arc<dyn SellerRepository>,
    session_repository: Arc<dyn SessionRepository>,
    session_ttl_seconds: i64,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        customer_repository: Arc<dyn CustomerRepository>,
        seller_repository: Arc<dyn SellerRepository>,
        session_repository: Arc<dyn SessionRepository>,
        session_ttl_seconds: i64,
    ) -> Self {
        Self {
            customer_repository,
            seller_repository,
            session_repository,
            session_ttl_seconds,
        }
    }

    /// Register a new customer account
    #[instrument(skip(self, request), fields(mobile_no = %request.mobile_no))]
    pub async fn register_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> ServiceResult<CustomerResponse> {
        info!("Registering customer");

        self.validate_registration(
            &request.first_name,
            &request.mobile_no,
            &request.email_id,
            &request.password,
        )?;

        if self
            .customer_repository
            .find_by_mobile(&request.mobile_no)
            .await?
            .is_some()
        {
            warn!("Mobile number already registered");
            return Err(ServiceError::DuplicateMobile {
                mobile: request.mobile_no,
            });
        }

        let customer = match self.customer_repository.create(Customer::new(request)).await {
            Ok(customer) => customer,
            // Unique index on mobile_no backstops the pre-check under races
            Err(RepositoryError::ConstraintViolation { .. }) => {
                return Err(ServiceError::ValidationError {
                    message: "Mobile number already registered".to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        info!(customer_id = %customer.customer_id, "Customer registered");
        Ok(customer.to_response())
    }

    /// Register a new seller account
    #[instrument(skip(self, request), fields(mobile = %request.mobile))]
    pub async fn register_seller(
        &self,
        request: CreateSellerRequest,
    ) -> ServiceResult<SellerResponse> {
        info!("Registering seller");

        self.validate_registration(
            &request.first_name,
            &request.mobile,
            &request.email_id,
            &request.password,
        )?;

        if self
            .seller_repository
            .find_by_mobile(&request.mobile)
            .await?
            .is_some()
        {
            warn!("Mobile number already registered");
            return Err(ServiceError::DuplicateMobile {
                mobile: request.mobile,
            });
        }

        let seller = match self.seller_repository.create(Seller::new(request)).await {
            Ok(seller) => seller,
            Err(RepositoryError::ConstraintViolation { .. }) => {
                return Err(ServiceError::ValidationError {
                    message: "Mobile number already registered".to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        info!(seller_id = %seller.seller_id, "Seller registered");
        Ok(seller.to_response())
    }

    /// Authenticate a customer and mint a session token
    #[instrument(skip(self, request), fields(mobile_no = %request.mobile_no))]
    pub async fn login_customer(
        &self,
        request: CustomerLoginRequest,
    ) -> ServiceResult<UserSession> {
        info!("Customer login attempt");

        let customer = self
            .customer_repository
            .find_by_mobile(&request.mobile_no)
            .await?
            .ok_or(LoginError::InvalidCredentials)?;

        if customer.password != request.password {
            warn!("Password mismatch");
            return Err(LoginError::InvalidCredentials.into());
        }

        self.open_session(customer.customer_id, UserType::Customer)
            .await
    }

    /// Authenticate a seller and mint a session token
    #[instrument(skip(self, request), fields(mobile = %request.mobile))]
    pub async fn login_seller(&self, request: SellerLoginRequest) -> ServiceResult<UserSession> {
        info!("Seller login attempt");

        let seller = self
            .seller_repository
            .find_by_mobile(&request.mobile)
            .await?
            .ok_or(LoginError::InvalidCredentials)?;

        if seller.password != request.password {
            warn!("Password mismatch");
            return Err(LoginError::InvalidCredentials.into());
        }

        self.open_session(seller.seller_id, UserType::Seller).await
    }

    /// Delete the session behind a token; unknown tokens are NotLoggedIn
    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &str) -> ServiceResult<()> {
        info!("Logout");

        match self.session_repository.delete_by_token(token).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(LoginError::NotLoggedIn.into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a token to its session. Missing tokens and tokens of the
    /// wrong audience are NotLoggedIn; expired sessions are deleted on
    /// detection so a retry behaves like a missing token.
    #[instrument(skip(self, token), fields(expected = %expected))]
    pub async fn validate_token(
        &self,
        token: &str,
        expected: UserType,
    ) -> ServiceResult<UserSession> {
        let session = self
            .session_repository
            .find_by_token(token)
            .await?
            .ok_or(LoginError::NotLoggedIn)?;

        if session.is_expired() {
            warn!("Session expired, deleting");
            self.session_repository.delete_by_token(token).await?;
            return Err(LoginError::SessionExpired.into());
        }

        if session.user_type != expected {
            warn!("Token audience mismatch");
            return Err(LoginError::NotLoggedIn.into());
        }

        Ok(session)
    }

    /// Delete every session past its end time; returns the purged count
    #[instrument(skip(self))]
    pub async fn purge_expired_sessions(&self) -> ServiceResult<u64> {
        let purged = self
            .session_repository
            .delete_expired(&Utc::now().to_rfc3339())
            .await?;
        Ok(purged)
    }

    /// Profile of the customer behind a token
    #[instrument(skip(self, token))]
    pub async fn get_customer_profile(&self, token: &str) -> ServiceResult<CustomerResponse> {
        let session = self.validate_token(token, UserType::Customer).await?;

        let customer = self
            .customer_repository
            .find_by_id(&session.user_id)
            .await?
            .ok_or_else(|| ServiceError::CustomerNotFound {
                id: session.user_id.clone(),
            })?;

        Ok(customer.to_response())
    }

    /// Profile of the seller behind a token
    #[instrument(skip(self, token))]
    pub async fn get_seller_profile(&self, token: &str) -> ServiceResult<SellerResponse> {
        let session = self.validate_token(token, UserType::Seller).await?;

        let seller = self
            .seller_repository
            .find_by_id(&session.user_id)
            .await?
            .ok_or_else(|| ServiceError::SellerNotFound {
                id: session.user_id.clone(),
            })?;

        Ok(seller.to_response())
    }

    /// Mint and persist a session, rejecting a second concurrent login.
    /// Stale sessions for the user are purged first so an old login does
    /// not block a new one forever.
    async fn open_session(
        &self,
        user_id: String,
        user_type: UserType,
    ) -> ServiceResult<UserSession> {
        self.purge_expired_sessions().await?;

        if let Some(existing) = self.session_repository.find_by_user(&user_id).await? {
            if !existing.is_expired() {
                warn!("User already has a live session");
                return Err(LoginError::AlreadyLoggedIn.into());
            }
        }

        let session = self
            .session_repository
            .create(UserSession::new(user_id, user_type, self.session_ttl_seconds))
            .await?;

        info!(session_id = %session.session_id, "Session opened");
        Ok(session)
    }

    fn validate_registration(
        &self,
        first_name: &str,
        mobile: &str,
        email: &str,
        password: &str,
    ) -> ServiceResult<()> {
        if first_name.trim().is_empty() {
            return Err(ServiceError::ValidationError {
                message: "First name cannot be empty".to_string(),
            });
        }
        if mobile.len() != 10 || !mobile.chars().all(|c| c.is_ascii_digit()) {
            return Err(ServiceError::ValidationError {
                message: "Mobile number must be 10 digits".to_string(),
            });
        }
        if !email.contains('@') {
            return Err(ServiceError::ValidationError {
                message: "Email address is invalid".to_string(),
            });
        }
        if password.len() < 6 {
            return Err(ServiceError::ValidationError {
                message: "Password must be at least 6 characters".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RepositoryError, Seller};
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        TestCustomerRepository {}

        #[async_trait]
        impl CustomerRepository for TestCustomerRepository {
            async fn create(&self, customer: Customer) -> Result<Customer, RepositoryError>;
            async fn find_by_id(&self, customer_id: &str) -> Result<Option<Customer>, RepositoryError>;
            async fn find_by_mobile(&self, mobile_no: &str) -> Result<Option<Customer>, RepositoryError>;
        }
    }

    mock! {
        TestSellerRepository {}

        #[async_trait]
        impl SellerRepository for TestSellerRepository {
            async fn create(&self, seller: Seller) -> Result<Seller, RepositoryError>;
            async fn find_by_id(&self, seller_id: &str) -> Result<Option<Seller>, RepositoryError>;
            async fn find_by_mobile(&self, mobile: &str) -> Result<Option<Seller>, RepositoryError>;
        }
    }

    mock! {
        TestSessionRepository {}

        #[async_trait]
        impl SessionRepository for TestSessionRepository {
            async fn create(&self, session: UserSession) -> Result<UserSession, RepositoryError>;
            async fn find_by_token(&self, token: &str) -> Result<Option<UserSession>, RepositoryError>;
            async fn find_by_user(&self, user_id: &str) -> Result<Option<UserSession>, RepositoryError>;
            async fn delete_by_token(&self, token: &str) -> Result<(), RepositoryError>;
            async fn delete_expired(&self, now: &str) -> Result<u64, RepositoryError>;
        }
    }

    fn service(
        customers: MockTestCustomerRepository,
        sellers: MockTestSellerRepository,
        sessions: MockTestSessionRepository,
    ) -> AuthService {
        AuthService::new(
            Arc::new(customers),
            Arc::new(sellers),
            Arc::new(sessions),
            3600,
        )
    }

    fn test_customer() -> Customer {
        let mut customer = Customer::new(CreateCustomerRequest {
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            mobile_no: "9876543210".to_string(),
            email_id: "asha@example.com".to_string(),
            password: "secret123".to_string(),
            address: None,
        });
        customer.customer_id = "C00000001".to_string();
        customer
    }

    #[tokio::test]
    async fn test_register_customer_success() {
        let mut customers = MockTestCustomerRepository::new();
        customers
            .expect_find_by_mobile()
            .with(eq("9876543210"))
            .times(1)
            .returning(|_| Ok(None));
        customers
            .expect_create()
            .times(1)
            .returning(|customer| Ok(customer));

        let service = service(
            customers,
            MockTestSellerRepository::new(),
            MockTestSessionRepository::new(),
        );

        let response = service
            .register_customer(CreateCustomerRequest {
                first_name: "Asha".to_string(),
                last_name: "Rao".to_string(),
                mobile_no: "9876543210".to_string(),
                email_id: "asha@example.com".to_string(),
                password: "secret123".to_string(),
                address: None,
            })
            .await
            .unwrap();

        assert!(response.customer_id.starts_with('C'));
        assert_eq!(response.mobile_no, "9876543210");
    }

    #[tokio::test]
    async fn test_register_customer_duplicate_mobile() {
        let mut customers = MockTestCustomerRepository::new();
        customers
            .expect_find_by_mobile()
            .times(1)
            .returning(|_| Ok(Some(test_customer())));

        let service = service(
            customers,
            MockTestSellerRepository::new(),
            MockTestSessionRepository::new(),
        );

        let result = service
            .register_customer(CreateCustomerRequest {
                first_name: "Asha".to_string(),
                last_name: "Rao".to_string(),
                mobile_no: "9876543210".to_string(),
                email_id: "asha@example.com".to_string(),
                password: "secret123".to_string(),
                address: None,
            })
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::DuplicateMobile { .. }
        ));
    }

    #[tokio::test]
    async fn test_register_customer_bad_mobile() {
        let service = service(
            MockTestCustomerRepository::new(),
            MockTestSellerRepository::new(),
            MockTestSessionRepository::new(),
        );

        let result = service
            .register_customer(CreateCustomerRequest {
                first_name: "Asha".to_string(),
                last_name: "Rao".to_string(),
                mobile_no: "12345".to_string(),
                email_id: "asha@example.com".to_string(),
                password: "secret123".to_string(),
                address: None,
            })
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::ValidationError { .. }
        ));
    }

    #[tokio::test]
    async fn test_login_customer_success() {
        let mut customers = MockTestCustomerRepository::new();
        customers
            .expect_find_by_mobile()
            .with(eq("9876543210"))
            .times(1)
            .returning(|_| Ok(Some(test_customer())));

        let mut sessions = MockTestSessionRepository::new();
        sessions.expect_delete_expired().times(1).returning(|_| Ok(0));
        sessions
            .expect_find_by_user()
            .with(eq("C00000001"))
            .times(1)
            .returning(|_| Ok(None));
        sessions
            .expect_create()
            .times(1)
            .returning(|session| Ok(session));

        let service = service(customers, MockTestSellerRepository::new(), sessions);

        let session = service
            .login_customer(CustomerLoginRequest {
                mobile_no: "9876543210".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(session.user_id, "C00000001");
        assert!(session.token.starts_with("customer_"));
        assert!(!session.is_expired());
    }

    #[tokio::test]
    async fn test_login_customer_wrong_password() {
        let mut customers = MockTestCustomerRepository::new();
        customers
            .expect_find_by_mobile()
            .times(1)
            .returning(|_| Ok(Some(test_customer())));

        let service = service(
            customers,
            MockTestSellerRepository::new(),
            MockTestSessionRepository::new(),
        );

        let result = service
            .login_customer(CustomerLoginRequest {
                mobile_no: "9876543210".to_string(),
                password: "wrong".to_string(),
            })
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::Login {
                source: LoginError::InvalidCredentials
            }
        ));
    }

    #[tokio::test]
    async fn test_login_rejects_concurrent_session() {
        let mut customers = MockTestCustomerRepository::new();
        customers
            .expect_find_by_mobile()
            .times(1)
            .returning(|_| Ok(Some(test_customer())));

        let mut sessions = MockTestSessionRepository::new();
        sessions.expect_delete_expired().times(1).returning(|_| Ok(0));
        sessions.expect_find_by_user().times(1).returning(|_| {
            Ok(Some(UserSession::new(
                "C00000001".to_string(),
                UserType::Customer,
                3600,
            )))
        });

        let service = service(customers, MockTestSellerRepository::new(), sessions);

        let result = service
            .login_customer(CustomerLoginRequest {
                mobile_no: "9876543210".to_string(),
                password: "secret123".to_string(),
            })
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::Login {
                source: LoginError::AlreadyLoggedIn
            }
        ));
    }

    #[tokio::test]
    async fn test_logout_unknown_token() {
        let mut sessions = MockTestSessionRepository::new();
        sessions
            .expect_delete_by_token()
            .times(1)
            .returning(|_| Err(RepositoryError::NotFound));

        let service = service(
            MockTestCustomerRepository::new(),
            MockTestSellerRepository::new(),
            sessions,
        );

        let result = service.logout("customer_deadbeef").await;
        assert!(matches!(
            result.unwrap_err(),
            ServiceError::Login {
                source: LoginError::NotLoggedIn
            }
        ));
    }

    #[tokio::test]
    async fn test_validate_token_expired_deletes_session() {
        let expired = UserSession::new("C00000001".to_string(), UserType::Customer, -60);
        let token = expired.token.clone();

        let mut sessions = MockTestSessionRepository::new();
        sessions
            .expect_find_by_token()
            .times(1)
            .returning(move |_| Ok(Some(expired.clone())));
        sessions
            .expect_delete_by_token()
            .with(eq(token.clone()))
            .times(1)
            .returning(|_| Ok(()));

        let service = service(
            MockTestCustomerRepository::new(),
            MockTestSellerRepository::new(),
            sessions,
        );

        let result = service.validate_token(&token, UserType::Customer).await;
        assert!(matches!(
            result.unwrap_err(),
            ServiceError::Login {
                source: LoginError::SessionExpired
            }
        ));
    }

    #[tokio::test]
    async fn test_validate_token_wrong_audience() {
        let session = UserSession::new("C00000001".to_string(), UserType::Customer, 3600);
        let token = session.token.clone();

        let mut sessions = MockTestSessionRepository::new();
        sessions
            .expect_find_by_token()
            .times(1)
            .returning(move |_| Ok(Some(session.clone())));

        let service = service(
            MockTestCustomerRepository::new(),
            MockTestSellerRepository::new(),
            sessions,
        );

        let result = service.validate_token(&token, UserType::Seller).await;
        assert!(matches!(
            result.unwrap_err(),
            ServiceError::Login {
                source: LoginError::NotLoggedIn
            }
        ));
    }
}
