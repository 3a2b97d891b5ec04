//! OCR module
//!
//! Token-level text recognition for receipt scans. The engine itself is an
//! external service; this module owns its contract and the geometry types
//! the pipeline builds on.

mod engine;
mod types;

pub use engine::{HttpOcrEngine, OcrEngine};
pub use types::{BoundingBox, OcrError, OcrToken};

#[cfg(test)]
pub use engine::MockOcrEngine;
