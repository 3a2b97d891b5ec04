//! User database operations

use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::Result;

/// User record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
}

/// User repository
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert the user and issue a fresh session token.
    ///
    /// Signing in again rotates the token; older sessions are invalidated.
    pub async fn login(&self, email: &str, full_name: &str) -> Result<String> {
        let session_token = Uuid::new_v4().simple().to_string();

        sqlx::query(
            r#"
            INSERT INTO users (email, full_name, session_token)
            VALUES (?, ?, ?)
            ON CONFLICT (email) DO UPDATE SET session_token = excluded.session_token
            "#,
        )
        .bind(email)
        .bind(full_name)
        .bind(&session_token)
        .execute(self.pool)
        .await?;

        Ok(session_token)
    }

    /// Resolve a session token to its user
    pub async fn find_by_session(&self, session_token: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, full_name
            FROM users
            WHERE session_token = ?
            "#,
        )
        .bind(session_token)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }
}
