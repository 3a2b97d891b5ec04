//! Receipt ingestion
//!
//! Runs the full chain for one scanned image: OCR, line aggregation, noise
//! filtering, structured extraction, arithmetic verification, spatial
//! backmapping, and the final transactional write. Every stage fails with
//! its own `IngestError` kind; nothing is persisted on a fatal failure.

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{AutoItem, NewReceipt, ReceiptRepository};
use crate::error::IngestError;
use crate::extraction::ExtractionClient;
use crate::ocr::OcrEngine;
use crate::storage::ScanStore;

use super::lines::{aggregate_lines, filter_noise, numbered_text, Line};
use super::verify::{is_clean, round2, tax};

/// Collaborators of one ingestion run. Held by reference so tests can wire
/// in doubles for the OCR engine and the extraction client.
pub struct IngestContext<'a> {
    pub db: &'a SqlitePool,
    pub scans: &'a ScanStore,
    pub ocr: &'a dyn OcrEngine,
    pub extractor: &'a dyn ExtractionClient,
}

/// Ingest one scanned receipt image for the given owner.
///
/// Returns the new receipt id. The source image is stored only after the
/// receipt row and all items are committed, so a failed extraction never
/// leaves an orphan image behind. An arithmetic mismatch is advisory: the
/// receipt persists with `clean = false`.
pub async fn ingest_receipt(
    ctx: &IngestContext<'_>,
    owner_id: i64,
    image: &[u8],
) -> Result<i64, IngestError> {
    let tokens = ctx.ocr.scan(image).await?;
    let lines = filter_noise(aggregate_lines(&tokens));

    info!(tokens = tokens.len(), lines = lines.len(), "Aggregated receipt lines");

    let draft = ctx
        .extractor
        .extract(&numbered_text(&lines))
        .await?
        .validate()?;

    let clean = is_clean(&draft);
    if !clean {
        warn!(
            subtotal = draft.subtotal,
            "Declared subtotal does not match item sum"
        );
    }

    let items = backmap_items(&draft, &lines)?;

    let receipt_id = ReceiptRepository::new(ctx.db)
        .create_ingested(
            &NewReceipt {
                owner_id,
                date: draft.date.clone(),
                merchant_name: draft.name.clone(),
                merchant_address: draft.merchant_address.clone(),
                merchant_domain: draft.merchant_website.clone(),
                payment_method: draft.payment_method.clone(),
                tax: tax(&draft),
                clean,
            },
            &items,
        )
        .await?;

    ctx.scans.put(receipt_id, image).await?;

    info!(receipt_id, clean, items = items.len(), "Receipt ingested");

    Ok(receipt_id)
}

/// Resolve each draft item's line reference to that line's bounding box.
///
/// Line numbers index the *filtered* sequence. A reference past its end
/// (including one that pointed at a filtered-out line) rejects the whole
/// ingestion rather than persisting an item with a wrong crop.
fn backmap_items(
    draft: &crate::extraction::ReceiptDraft,
    lines: &[Line],
) -> Result<Vec<AutoItem>, IngestError> {
    draft
        .items
        .iter()
        .map(|item| {
            let line = lines
                .get(item.line_number)
                .ok_or(IngestError::LineOutOfRange {
                    line: item.line_number,
                    lines: lines.len(),
                })?;
            Ok(AutoItem {
                description: item.description.clone(),
                price: round2(item.cost),
                bounds: line.bounds,
            })
        })
        .collect()
}
