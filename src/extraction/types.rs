//! Extraction Types
//!
//! The extraction service answers with a loosely-typed JSON payload. That
//! payload is checked exactly once, at this boundary: a `RawDraft` either
//! validates into a `ReceiptDraft` or the whole ingestion is rejected.

use serde::Deserialize;

/// Extraction error types
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("extraction API error: {0}")]
    Api(String),

    #[error("extraction result malformed: {0}")]
    Shape(String),
}

/// Unvalidated payload as returned by the extraction service.
///
/// Everything is optional here; required-field checks happen in
/// [`RawDraft::validate`] so that a missing field surfaces as one
/// well-defined shape error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDraft {
    pub name: Option<String>,
    pub date: Option<String>,
    pub merchant_address: Option<String>,
    pub merchant_website: Option<String>,
    pub payment_method: Option<String>,
    pub items: Option<Vec<RawDraftItem>>,
    pub subtotal: Option<f64>,
    pub total: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDraftItem {
    pub description: Option<String>,
    pub cost: Option<f64>,
    pub line_number: Option<u64>,
}

impl RawDraft {
    /// Parse a raw JSON string from the extraction service.
    pub fn from_json(payload: &str) -> Result<Self, ExtractionError> {
        serde_json::from_str(payload)
            .map_err(|e| ExtractionError::Shape(format!("unparseable payload: {}", e)))
    }

    /// Check required fields and produce a typed draft.
    ///
    /// The service contract requires `items`, `subtotal` and `total`; the
    /// caller additionally requires `date` and `name` before accepting the
    /// result. Each item must carry a numeric cost and a line reference.
    pub fn validate(self) -> Result<ReceiptDraft, ExtractionError> {
        let name = self
            .name
            .ok_or_else(|| ExtractionError::Shape("missing field: name".into()))?;
        let date = self
            .date
            .ok_or_else(|| ExtractionError::Shape("missing field: date".into()))?;
        let subtotal = self
            .subtotal
            .ok_or_else(|| ExtractionError::Shape("missing field: subtotal".into()))?;
        let total = self
            .total
            .ok_or_else(|| ExtractionError::Shape("missing field: total".into()))?;
        let raw_items = self
            .items
            .ok_or_else(|| ExtractionError::Shape("missing field: items".into()))?;

        // The service is instructed to answer with MM-DD-YYYY dates.
        if chrono::NaiveDate::parse_from_str(&date, "%m-%d-%Y").is_err() {
            return Err(ExtractionError::Shape(format!(
                "unrecognized date: {}",
                date
            )));
        }

        let mut items = Vec::with_capacity(raw_items.len());
        for (i, item) in raw_items.into_iter().enumerate() {
            let cost = item
                .cost
                .ok_or_else(|| ExtractionError::Shape(format!("item {} missing cost", i)))?;
            let line_number = item
                .line_number
                .ok_or_else(|| ExtractionError::Shape(format!("item {} missing line_number", i)))?;
            items.push(DraftItem {
                description: item.description.unwrap_or_default(),
                cost,
                line_number: line_number as usize,
            });
        }

        Ok(ReceiptDraft {
            name,
            date,
            merchant_address: self.merchant_address.unwrap_or_default(),
            merchant_website: self.merchant_website.unwrap_or_default(),
            payment_method: self.payment_method.unwrap_or_default(),
            items,
            subtotal,
            total,
        })
    }
}

/// Validated receipt draft. Never persisted directly; the pipeline verifies
/// and backmaps it first.
#[derive(Debug, Clone)]
pub struct ReceiptDraft {
    pub name: String,
    pub date: String,
    pub merchant_address: String,
    pub merchant_website: String,
    pub payment_method: String,
    pub items: Vec<DraftItem>,
    pub subtotal: f64,
    pub total: f64,
}

/// One extracted line item, still carrying its source line reference.
#[derive(Debug, Clone)]
pub struct DraftItem {
    pub description: String,
    pub cost: f64,
    pub line_number: usize,
}
