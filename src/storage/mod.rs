//! Storage module for receipt scan images
//!
//! S3-compatible backends (MinIO, Cloudflare R2, AWS S3) in production,
//! in-memory for tests.

mod s3_client;
mod scan_store;

pub use s3_client::S3Client;
pub use scan_store::{ScanStorage, ScanStore};
