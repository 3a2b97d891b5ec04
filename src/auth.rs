//! Request authentication
//!
//! Resolves the opaque session token in the `Authorization` header to a
//! user row. Every receipt and category route extracts [`AuthUser`]; a
//! missing or stale token rejects the request before any handler runs.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::db::{User, UserRepository};
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated user for the current request
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|val| val.to_str().ok())
            .map(|val| val.strip_prefix("Bearer ").unwrap_or(val))
            .filter(|val| !val.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Missing session token".to_string()))?;

        let user = UserRepository::new(state.db())
            .find_by_session(token)
            .await?;

        match user {
            Some(user) => Ok(AuthUser(user)),
            None => {
                warn!("Rejected request with unknown session token");
                Err(AppError::Unauthorized("Invalid session token".to_string()))
            }
        }
    }
}
