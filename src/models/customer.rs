use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registered customer account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub mobile_no: String,
    pub email_id: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub address: Option<Address>,
    pub created_at: DateTime<Utc>,
}

/// Shipping address attached to a customer or an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

/// Request model for customer registration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub first_name: String,
    pub last_name: String,
    pub mobile_no: String,
    pub email_id: String,
    pub password: String,
    #[serde(default)]
    pub address: Option<Address>,
}

/// Request model for customer login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLoginRequest {
    #[serde(alias = "mobileId")]
    pub mobile_no: String,
    pub password: String,
}

/// Customer profile as returned by the API (no credentials)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub customer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub mobile_no: String,
    pub email_id: String,
    pub address: Option<Address>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Create a new customer with a generated ID
    pub fn new(request: CreateCustomerRequest) -> Self {
        Self {
            customer_id: format!(
                "C{}",
                Uuid::new_v4()
                    .simple()
                    .to_string()
                    .get(0..8)
                    .unwrap_or("00000000")
            ),
            first_name: request.first_name,
            last_name: request.last_name,
            mobile_no: request.mobile_no,
            email_id: request.email_id,
            password: request.password,
            address: request.address,
            created_at: Utc::now(),
        }
    }

    pub fn to_response(&self) -> CustomerResponse {
        CustomerResponse {
            customer_id: self.customer_id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            mobile_no: self.mobile_no.clone(),
            email_id: self.email_id.clone(),
            address: self.address.clone(),
            created_at: self.created_at,
        }
    }
}
