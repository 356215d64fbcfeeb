use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserType;

/// Live session for an authenticated user. The token is an opaque
/// credential sent back by clients in the `token` request header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub session_id: String,
    pub user_id: String,
    pub user_type: UserType,
    pub token: String,
    pub session_start: DateTime<Utc>,
    pub session_end: DateTime<Utc>,
}

/// Login response handed back to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: String,
    pub user_type: UserType,
    pub token: String,
    pub session_end_time: DateTime<Utc>,
}

/// Request/response body carrying only a session token (logout flow)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokenRequest {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UserSession {
    /// Mint a new session valid for `ttl_seconds` from now. The token is
    /// prefixed with the user type so its audience is visible in logs.
    pub fn new(user_id: String, user_type: UserType, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            session_id: format!(
                "SE{}",
                Uuid::new_v4()
                    .simple()
                    .to_string()
                    .get(0..8)
                    .unwrap_or("00000000")
            ),
            user_id,
            user_type,
            token: format!("{}_{}", user_type, Uuid::new_v4().simple()),
            session_start: now,
            session_end: now + Duration::seconds(ttl_seconds),
        }
    }

    /// An expired session behaves like a missing one once purged
    pub fn is_expired(&self) -> bool {
        self.session_end < Utc::now()
    }

    pub fn to_response(&self) -> SessionResponse {
        SessionResponse {
            user_id: self.user_id.clone(),
            user_type: self.user_type,
            token: self.token.clone(),
            session_end_time: self.session_end,
        }
    }
}
