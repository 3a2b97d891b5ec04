//! Receipt ingestion pipeline
//!
//! The algorithmic core of the server: line aggregation, noise filtering,
//! structured extraction, consistency verification, spatial backmapping,
//! and the transactional write.

mod ingest;
mod lines;
mod verify;

pub use ingest::{ingest_receipt, IngestContext};
pub use lines::{aggregate_lines, filter_noise, numbered_text, Line};
pub use verify::{is_clean, round2, tax};
