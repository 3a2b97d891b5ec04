//! Authentication routes
//!
//! Exchanges a Google ID token for an opaque session token. Token
//! verification is delegated to Google's tokeninfo endpoint; this server
//! only checks the audience and that the email is verified.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Create the auth router
pub fn router() -> Router<AppState> {
    Router::new().route("/google/token", post(google_token))
}

#[derive(Deserialize)]
struct TokenRequest {
    #[serde(rename = "idToken")]
    id_token: String,
}

#[derive(Serialize)]
struct SessionResponse {
    session: String,
}

/// Claims of interest from Google's tokeninfo response
#[derive(Deserialize)]
struct TokenInfo {
    aud: String,
    email: String,
    // Google reports booleans as strings here
    email_verified: String,
    #[serde(default)]
    name: String,
}

/// POST /auth/google/token
async fn google_token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<SessionResponse>> {
    let info = verify_id_token(&request.id_token).await?;

    if info.aud != state.config().auth.google_client_id {
        return Err(AppError::Unauthorized(
            "Token issued for a different client".to_string(),
        ));
    }

    if info.email_verified != "true" {
        return Err(AppError::Unauthorized("Email not verified".to_string()));
    }

    let session = UserRepository::new(state.db())
        .login(&info.email, &info.name)
        .await?;

    tracing::info!(email = %info.email, "Issued session");

    Ok(Json(SessionResponse { session }))
}

async fn verify_id_token(id_token: &str) -> Result<TokenInfo> {
    let client = reqwest::Client::new();
    let response = client
        .get(TOKENINFO_URL)
        .query(&[("id_token", id_token)])
        .send()
        .await
        .map_err(|e| AppError::Internal(format!("tokeninfo request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::Unauthorized("Invalid ID token".to_string()));
    }

    response
        .json::<TokenInfo>()
        .await
        .map_err(|e| AppError::Internal(format!("tokeninfo response malformed: {}", e)))
}
