use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registered seller account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub seller_id: String,
    pub first_name: String,
    pub last_name: String,
    pub mobile: String,
    pub email_id: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
}

/// Request model for seller registration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSellerRequest {
    pub first_name: String,
    pub last_name: String,
    pub mobile: String,
    pub email_id: String,
    pub password: String,
}

/// Request model for seller login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerLoginRequest {
    pub mobile: String,
    pub password: String,
}

/// Seller profile as returned by the API (no credentials)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerResponse {
    pub seller_id: String,
    pub first_name: String,
    pub last_name: String,
    pub mobile: String,
    pub email_id: String,
    pub created_at: DateTime<Utc>,
}

impl Seller {
    /// Create a new seller with a generated ID
    pub fn new(request: CreateSellerRequest) -> Self {
        Self {
            seller_id: format!(
                "S{}",
                Uuid::new_v4()
                    .simple()
                    .to_string()
                    .get(0..8)
                    .unwrap_or("00000000")
            ),
            first_name: request.first_name,
            last_name: request.last_name,
            mobile: request.mobile,
            email_id: request.email_id,
            password: request.password,
            created_at: Utc::now(),
        }
    }

    pub fn to_response(&self) -> SellerResponse {
        SellerResponse {
            seller_id: self.seller_id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            mobile: self.mobile.clone(),
            email_id: self.email_id.clone(),
            created_at: self.created_at,
        }
    }
}
