//! Receipt Server Library
//!
//! Ingests photographed paper receipts: OCR tokens are grouped into lines,
//! a schema-constrained extraction service turns them into a typed draft,
//! the draft is arithmetically verified and spatially backmapped, and the
//! result is committed together with the source image.
//!
//! # Modules
//!
//! - `pipeline`: the ingestion pipeline (aggregation, filtering,
//!   extraction, verification, backmapping, persistence)
//! - `ocr` / `extraction`: contracts for the two external services
//! - `db`: SQLite repositories for users, receipts, items and categories
//! - `storage`: keyed scan-image storage (S3 or in-memory)
//! - `routes`: the HTTP surface

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extraction;
pub mod ocr;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod storage;
