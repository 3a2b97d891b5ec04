//! Scan Store
//!
//! Keyed storage for receipt source images. One image per receipt,
//! overwrite-by-key, written only after the receipt row is committed.
//! Supports an S3 backend for production and an in-memory backend for tests.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::StorageError;

use super::s3_client::S3Client;

/// Trait for scan storage backends
#[async_trait::async_trait]
pub trait ScanStorage: Send + Sync {
    async fn put(&self, receipt_id: i64, data: &[u8]) -> Result<(), StorageError>;
    async fn get(&self, receipt_id: i64) -> Result<Vec<u8>, StorageError>;
    async fn delete(&self, receipt_id: i64) -> Result<(), StorageError>;
}

/// Scan store with pluggable backend
#[derive(Clone)]
pub struct ScanStore {
    backend: Arc<dyn ScanStorage>,
}

impl ScanStore {
    /// Create with S3 storage under the given key prefix
    pub fn with_s3(client: S3Client, prefix: impl Into<String>) -> Self {
        Self {
            backend: Arc::new(S3ScanStorage {
                client,
                prefix: prefix.into(),
            }),
        }
    }

    /// Create with in-memory storage
    pub fn in_memory() -> Self {
        Self {
            backend: Arc::new(MemoryScanStorage::default()),
        }
    }

    pub async fn put(&self, receipt_id: i64, data: &[u8]) -> Result<(), StorageError> {
        self.backend.put(receipt_id, data).await
    }

    pub async fn get(&self, receipt_id: i64) -> Result<Vec<u8>, StorageError> {
        self.backend.get(receipt_id).await
    }

    pub async fn delete(&self, receipt_id: i64) -> Result<(), StorageError> {
        self.backend.delete(receipt_id).await
    }
}

struct S3ScanStorage {
    client: S3Client,
    prefix: String,
}

impl S3ScanStorage {
    fn key(&self, receipt_id: i64) -> String {
        format!("{}/{}.jpg", self.prefix, receipt_id)
    }
}

#[async_trait::async_trait]
impl ScanStorage for S3ScanStorage {
    async fn put(&self, receipt_id: i64, data: &[u8]) -> Result<(), StorageError> {
        self.client
            .put_object(&self.key(receipt_id), data.to_vec(), "image/jpeg")
            .await
    }

    async fn get(&self, receipt_id: i64) -> Result<Vec<u8>, StorageError> {
        self.client.get_object(&self.key(receipt_id)).await
    }

    async fn delete(&self, receipt_id: i64) -> Result<(), StorageError> {
        self.client.delete_object(&self.key(receipt_id)).await
    }
}

#[derive(Default)]
struct MemoryScanStorage {
    objects: RwLock<HashMap<i64, Vec<u8>>>,
}

#[async_trait::async_trait]
impl ScanStorage for MemoryScanStorage {
    async fn put(&self, receipt_id: i64, data: &[u8]) -> Result<(), StorageError> {
        self.objects.write().await.insert(receipt_id, data.to_vec());
        Ok(())
    }

    async fn get(&self, receipt_id: i64) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .await
            .get(&receipt_id)
            .cloned()
            .ok_or_else(|| StorageError::ObjectNotFound(receipt_id.to_string()))
    }

    async fn delete(&self, receipt_id: i64) -> Result<(), StorageError> {
        self.objects.write().await.remove(&receipt_id);
        Ok(())
    }
}
