use std::str::FromStr;

use async_trait::async_trait;
use sqlx::FromRow;
use tracing::{debug, info, instrument};

use super::customer_repository::parse_timestamp;
use super::database::DbPool;
use crate::models::{RepositoryError, RepositoryResult, UserSession, UserType};

/// Trait defining the interface for session data access operations
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a freshly minted session
    async fn create(&self, session: UserSession) -> RepositoryResult<UserSession>;

    /// Find a session by its token
    async fn find_by_token(&self, token: &str) -> RepositoryResult<Option<UserSession>>;

    /// Find a user's live session, if any
    async fn find_by_user(&self, user_id: &str) -> RepositoryResult<Option<UserSession>>;

    /// Delete a session by token; NotFound when no such session exists
    async fn delete_by_token(&self, token: &str) -> RepositoryResult<()>;

    /// Delete every session that ended before `now`; returns the count
    async fn delete_expired(&self, now: &str) -> RepositoryResult<u64>;
}

/// SQLite implementation of the SessionRepository trait
pub struct SqliteSessionRepository {
    pool: DbPool,
}

impl SqliteSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SessionRow {
    session_id: String,
    user_id: String,
    user_type: String,
    token: String,
    session_start: String,
    session_end: String,
}

impl TryFrom<SessionRow> for UserSession {
    type Error = RepositoryError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(UserSession {
            session_id: row.session_id,
            user_id: row.user_id,
            user_type: UserType::from_str(&row.user_type)
                .map_err(|e| RepositoryError::Serialization { message: e })?,
            token: row.token,
            session_start: parse_timestamp(&row.session_start)?,
            session_end: parse_timestamp(&row.session_end)?,
        })
    }
}

const SELECT_COLUMNS: &str =
    "session_id, user_id, user_type, token, session_start, session_end";

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    async fn create(&self, session: UserSession) -> RepositoryResult<UserSession> {
        sqlx::query(
            r#"
            INSERT INTO user_sessions (session_id, user_id, user_type, token, session_start, session_end)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.session_id)
        .bind(&session.user_id)
        .bind(session.user_type.to_string())
        .bind(&session.token)
        .bind(session.session_start.to_rfc3339())
        .bind(session.session_end.to_rfc3339())
        .execute(&self.pool)
        .await?;

        info!("Session created");
        Ok(session)
    }

    #[instrument(skip(self, token))]
    async fn find_by_token(&self, token: &str) -> RepositoryResult<Option<UserSession>> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM user_sessions WHERE token = ?"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserSession::try_from).transpose()
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn find_by_user(&self, user_id: &str) -> RepositoryResult<Option<UserSession>> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM user_sessions WHERE user_id = ? ORDER BY session_end DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserSession::try_from).transpose()
    }

    #[instrument(skip(self, token))]
    async fn delete_by_token(&self, token: &str) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        info!("Session deleted");
        Ok(())
    }

    #[instrument(skip(self, now))]
    async fn delete_expired(&self, now: &str) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE session_end < ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            info!(purged, "Expired sessions purged");
        } else {
            debug!("No expired sessions");
        }
        Ok(purged)
    }
}
