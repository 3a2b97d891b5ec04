//! Budget category API endpoints
//!
//! - `GET /categories?year=&month=` — categories with in-period spend
//! - `POST /categories`
//! - `PATCH /categories/{id}`
//! - `DELETE /categories/{id}`

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::{CategoryRepository, CategorySummary, CreateCategory, UpdateCategory};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the categories router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:id", patch(update_category).delete(delete_category))
}

#[derive(Deserialize)]
struct PeriodQuery {
    year: Option<i32>,
    month: Option<u32>,
}

#[derive(Serialize)]
struct CategoryListResponse {
    categories: Vec<CategorySummary>,
}

#[derive(Serialize)]
struct CreatedResponse {
    id: i64,
}

/// GET /categories
async fn list_categories(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(period): Query<PeriodQuery>,
) -> Result<Json<CategoryListResponse>> {
    let categories = CategoryRepository::new(state.db())
        .list(user.id, period.year, period.month)
        .await?;

    Ok(Json(CategoryListResponse { categories }))
}

/// POST /categories
async fn create_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(data): Json<CreateCategory>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let id = CategoryRepository::new(state.db())
        .create(user.id, &data)
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// PATCH /categories/:id
async fn update_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(data): Json<UpdateCategory>,
) -> Result<StatusCode> {
    let updated = CategoryRepository::new(state.db())
        .update(id, user.id, &data)
        .await?;

    if !updated {
        return Err(AppError::NotFound(format!("Category {} not found", id)));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /categories/:id
async fn delete_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let deleted = CategoryRepository::new(state.db())
        .delete(id, user.id)
        .await?;

    if !deleted {
        return Err(AppError::NotFound(format!("Category {} not found", id)));
    }

    Ok(StatusCode::NO_CONTENT)
}
