use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::{info, instrument};

use super::database::DbPool;
use crate::models::{Address, Customer, RepositoryError, RepositoryResult};

/// Trait defining the interface for customer data access operations
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Persist a new customer
    async fn create(&self, customer: Customer) -> RepositoryResult<Customer>;

    /// Find a customer by ID
    async fn find_by_id(&self, customer_id: &str) -> RepositoryResult<Option<Customer>>;

    /// Find a customer by mobile number (the login key)
    async fn find_by_mobile(&self, mobile_no: &str) -> RepositoryResult<Option<Customer>>;
}

/// SQLite implementation of the CustomerRepository trait
pub struct SqliteCustomerRepository {
    pool: DbPool,
}

impl SqliteCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct CustomerRow {
    customer_id: String,
    first_name: String,
    last_name: String,
    mobile_no: String,
    email_id: String,
    password: String,
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    pincode: Option<String>,
    created_at: String,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let address = match (row.street, row.city, row.state, row.pincode) {
            (Some(street), Some(city), Some(state), Some(pincode)) => Some(Address {
                street,
                city,
                state,
                pincode,
            }),
            _ => None,
        };

        Ok(Customer {
            customer_id: row.customer_id,
            first_name: row.first_name,
            last_name: row.last_name,
            mobile_no: row.mobile_no,
            email_id: row.email_id,
            password: row.password,
            address,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Serialization {
            message: format!("invalid timestamp {value:?}: {e}"),
        })
}

const SELECT_COLUMNS: &str = "customer_id, first_name, last_name, mobile_no, email_id, \
                              password, street, city, state, pincode, created_at";

#[async_trait]
impl CustomerRepository for SqliteCustomerRepository {
    #[instrument(skip(self, customer), fields(customer_id = %customer.customer_id))]
    async fn create(&self, customer: Customer) -> RepositoryResult<Customer> {
        sqlx::query(
            r#"
            INSERT INTO customers (customer_id, first_name, last_name, mobile_no, email_id,
                                   password, street, city, state, pincode, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&customer.customer_id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.mobile_no)
        .bind(&customer.email_id)
        .bind(&customer.password)
        .bind(customer.address.as_ref().map(|a| a.street.clone()))
        .bind(customer.address.as_ref().map(|a| a.city.clone()))
        .bind(customer.address.as_ref().map(|a| a.state.clone()))
        .bind(customer.address.as_ref().map(|a| a.pincode.clone()))
        .bind(customer.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        info!("Customer created");
        Ok(customer)
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn find_by_id(&self, customer_id: &str) -> RepositoryResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM customers WHERE customer_id = ?"
        ))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_mobile(&self, mobile_no: &str) -> RepositoryResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM customers WHERE mobile_no = ?"
        ))
        .bind(mobile_no)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }
}
