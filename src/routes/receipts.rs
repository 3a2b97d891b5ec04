//! Receipt API endpoints
//!
//! - `POST /receipts/auto` — ingest a scanned image
//! - `GET /receipts` — list previews
//! - `GET /receipts/{id}` — full details
//! - `PATCH /receipts/{id}` — merchant/date correction
//! - `DELETE /receipts/{id}` — delete receipt, items and stored scan
//! - `GET /receipts/{id}/scan.png` — the stored source image

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::db::{ItemRepository, Receipt, ReceiptPreview, ReceiptRepository, UpdateReceipt};
use crate::error::{AppError, Result};
use crate::pipeline::{ingest_receipt, IngestContext};
use crate::state::AppState;

/// Create the receipts router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_receipts))
        .route("/auto", post(ingest))
        .route(
            "/:id",
            get(get_receipt).patch(update_receipt).delete(delete_receipt),
        )
        .route("/:id/scan.png", get(get_scan))
        // Phone camera JPEGs; 20MB leaves headroom
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
}

#[derive(Serialize)]
struct ScanResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    receipt_id: Option<i64>,
}

#[derive(Serialize)]
struct ReceiptListResponse {
    receipts: Vec<ReceiptPreview>,
}

#[derive(Serialize)]
struct MerchantResponse {
    name: String,
    address: String,
    domain: String,
}

#[derive(Serialize)]
struct ItemResponse {
    id: i64,
    description: String,
    price: f64,
    category: Option<i64>,
    auto: bool,
}

#[derive(Serialize)]
struct ReceiptDetailsResponse {
    id: i64,
    owner_id: i64,
    clean: bool,
    date: String,
    merchant: MerchantResponse,
    payment_method: String,
    items: Vec<ItemResponse>,
    tax: f64,
}

impl ReceiptDetailsResponse {
    fn from_parts(receipt: Receipt, items: Vec<crate::db::ReceiptItem>) -> Self {
        Self {
            id: receipt.id,
            owner_id: receipt.owner_id,
            clean: receipt.clean,
            date: receipt.date,
            merchant: MerchantResponse {
                name: receipt.merchant_name,
                address: receipt.merchant_address,
                domain: receipt.merchant_domain,
            },
            payment_method: receipt.payment_method,
            items: items
                .into_iter()
                .map(|item| ItemResponse {
                    id: item.id,
                    auto: item.is_auto(),
                    description: item.description,
                    price: item.price,
                    category: item.category_id,
                })
                .collect(),
            tax: receipt.tax,
        }
    }
}

/// POST /receipts/auto
///
/// Body is the raw image. Answers `{success, receipt_id}` with HTTP 200
/// either way; the failure kind only reaches the logs.
async fn ingest(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Bytes,
) -> Json<ScanResult> {
    let ctx = IngestContext {
        db: state.db(),
        scans: state.scans(),
        ocr: state.ocr(),
        extractor: state.extractor(),
    };

    match ingest_receipt(&ctx, user.id, &body).await {
        Ok(receipt_id) => Json(ScanResult {
            success: true,
            receipt_id: Some(receipt_id),
        }),
        Err(e) => {
            tracing::error!(user_id = user.id, error = %e, "Receipt ingestion failed");
            Json(ScanResult {
                success: false,
                receipt_id: None,
            })
        }
    }
}

/// GET /receipts
async fn list_receipts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ReceiptListResponse>> {
    let receipts = ReceiptRepository::new(state.db()).list(user.id).await?;
    Ok(Json(ReceiptListResponse { receipts }))
}

/// GET /receipts/:id
async fn get_receipt(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ReceiptDetailsResponse>> {
    let receipt = ReceiptRepository::new(state.db())
        .get(id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Receipt {} not found", id)))?;

    let items = ItemRepository::new(state.db()).list(id).await?;

    Ok(Json(ReceiptDetailsResponse::from_parts(receipt, items)))
}

/// PATCH /receipts/:id
async fn update_receipt(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(data): Json<UpdateReceipt>,
) -> Result<Json<ReceiptDetailsResponse>> {
    // Monthly rollups substr this format; reject anything else up front.
    if let Some(ref date) = data.date {
        if chrono::NaiveDate::parse_from_str(date, "%m-%d-%Y").is_err() {
            return Err(AppError::BadRequest(format!(
                "date must be MM-DD-YYYY: {}",
                date
            )));
        }
    }

    let receipt = ReceiptRepository::new(state.db())
        .update(id, user.id, &data)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Receipt {} not found", id)))?;

    let items = ItemRepository::new(state.db()).list(id).await?;

    Ok(Json(ReceiptDetailsResponse::from_parts(receipt, items)))
}

/// DELETE /receipts/:id
async fn delete_receipt(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<axum::http::StatusCode> {
    let deleted = ReceiptRepository::new(state.db()).delete(id, user.id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Receipt {} not found", id)));
    }

    // Scan removal is best-effort; the row is already gone.
    if let Err(e) = state.scans().delete(id).await {
        tracing::warn!(receipt_id = id, error = %e, "Failed to delete stored scan");
    }

    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// GET /receipts/:id/scan.png
async fn get_scan(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    // Ownership check before touching storage
    ReceiptRepository::new(state.db())
        .get(id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Receipt {} not found", id)))?;

    let data = state.scans().get(id).await?;

    let png = super::items::encode_png(&data)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}
