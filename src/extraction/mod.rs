//! Structured extraction module
//!
//! Turns filtered, numbered receipt lines into a typed draft by calling a
//! schema-constrained language-model service.

mod client;
mod types;

pub use client::{ExtractionClient, OpenAiExtractor};
pub use types::{DraftItem, ExtractionError, RawDraft, RawDraftItem, ReceiptDraft};

#[cfg(test)]
pub use client::MockExtractor;
