//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::extraction::ExtractionClient;
use crate::ocr::OcrEngine;
use crate::storage::ScanStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: SqlitePool,
    scans: ScanStore,
    ocr: Arc<dyn OcrEngine>,
    extractor: Arc<dyn ExtractionClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// OCR and extraction are taken as trait objects so tests can wire in
    /// doubles for both external services.
    pub fn new(
        config: Config,
        db: SqlitePool,
        scans: ScanStore,
        ocr: Arc<dyn OcrEngine>,
        extractor: Arc<dyn ExtractionClient>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                scans,
                ocr,
                extractor,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the scan store
    pub fn scans(&self) -> &ScanStore {
        &self.inner.scans
    }

    /// Get the OCR engine
    pub fn ocr(&self) -> &dyn OcrEngine {
        self.inner.ocr.as_ref()
    }

    /// Get the extraction client
    pub fn extractor(&self) -> &dyn ExtractionClient {
        self.inner.extractor.as_ref()
    }
}
