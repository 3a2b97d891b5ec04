//! Receipt item API endpoints
//!
//! Nested under `/receipts/{id}`:
//! - `POST /receipts/{id}/items` — add a manual item
//! - `PATCH /receipts/{id}/items/{item_id}` — edit (drops the bbox)
//! - `DELETE /receipts/{id}/items/{item_id}`
//! - `GET /receipts/{id}/items/{item_id}/scan.png` — crop of the source
//!   image to the item's bounding box; auto items only.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::db::{CreateItem, ItemRepository, ReceiptRepository, UpdateItem};
use crate::error::{AppError, Result};
use crate::ocr::BoundingBox;
use crate::state::AppState;

/// Create the items router (merged into the receipts router)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/items", post(create_item))
        .route("/:id/items/:item_id", patch(update_item).delete(delete_item))
        .route("/:id/items/:item_id/scan.png", get(get_item_scan))
}

#[derive(Serialize)]
struct ItemResponse {
    id: i64,
    description: String,
    price: f64,
    category: Option<i64>,
    auto: bool,
}

impl From<crate::db::ReceiptItem> for ItemResponse {
    fn from(item: crate::db::ReceiptItem) -> Self {
        Self {
            id: item.id,
            auto: item.is_auto(),
            description: item.description,
            price: item.price,
            category: item.category_id,
        }
    }
}

async fn require_receipt(state: &AppState, id: i64, owner_id: i64) -> Result<()> {
    ReceiptRepository::new(state.db())
        .get(id, owner_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Receipt {} not found", id)))?;
    Ok(())
}

/// POST /receipts/:id/items
async fn create_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(data): Json<CreateItem>,
) -> Result<(StatusCode, Json<ItemResponse>)> {
    require_receipt(&state, id, user.id).await?;

    let item = ItemRepository::new(state.db()).create(id, &data).await?;

    Ok((StatusCode::CREATED, Json(item.into())))
}

/// PATCH /receipts/:id/items/:item_id
async fn update_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, item_id)): Path<(i64, i64)>,
    Json(data): Json<UpdateItem>,
) -> Result<Json<ItemResponse>> {
    require_receipt(&state, id, user.id).await?;

    let item = ItemRepository::new(state.db())
        .update(item_id, id, &data)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {} not found", item_id)))?;

    Ok(Json(item.into()))
}

/// DELETE /receipts/:id/items/:item_id
async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, item_id)): Path<(i64, i64)>,
) -> Result<StatusCode> {
    require_receipt(&state, id, user.id).await?;

    let deleted = ItemRepository::new(state.db()).delete(item_id, id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Item {} not found", item_id)));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /receipts/:id/items/:item_id/scan.png
async fn get_item_scan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, item_id)): Path<(i64, i64)>,
) -> Result<Response> {
    require_receipt(&state, id, user.id).await?;

    let item = ItemRepository::new(state.db())
        .get(item_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {} not found", item_id)))?;

    // Manual or edited items have no crop
    let bounds = item.bounds().ok_or_else(|| {
        AppError::NotFound(format!("Item {} has no stored scan region", item_id))
    })?;

    let data = state.scans().get(id).await?;
    let png = crop_to_png(&data, &bounds)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// Re-encode the stored scan as PNG without cropping
pub(super) fn encode_png(data: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::Internal(format!("Failed to decode stored scan: {}", e)))?;

    let mut buffer = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| AppError::Internal(format!("Failed to encode scan: {}", e)))?;

    Ok(buffer)
}

/// Crop the stored scan to an item's bounding box and encode as PNG.
///
/// The box is clamped to the image: OCR coordinates occasionally overshoot
/// the edge by a pixel or two.
pub(super) fn crop_to_png(data: &[u8], bounds: &BoundingBox) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::Internal(format!("Failed to decode stored scan: {}", e)))?;

    let (img_width, img_height) = (img.width() as i64, img.height() as i64);

    let left = bounds.left.clamp(0, img_width);
    let top = bounds.top.clamp(0, img_height);
    let right = bounds.right.clamp(left, img_width);
    let bottom = bounds.bottom.clamp(top, img_height);

    if right == left || bottom == top {
        return Err(AppError::Internal("Empty scan region".to_string()));
    }

    let cropped = img.crop_imm(
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    );

    let mut buffer = Vec::new();
    cropped
        .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| AppError::Internal(format!("Failed to encode scan region: {}", e)))?;

    Ok(buffer)
}
