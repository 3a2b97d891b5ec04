//! OCR Engines
//!
//! Defines the engine trait and the HTTP-backed implementation used in
//! production. The engine contract is deliberately narrow: raw image bytes
//! in, positioned tokens out.

use async_trait::async_trait;
use serde::Deserialize;

use super::types::{OcrError, OcrToken};

/// OCR engine trait
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Check if the engine is reachable
    async fn is_available(&self) -> bool;

    /// Recognize tokens on an image
    async fn scan(&self, image_data: &[u8]) -> Result<Vec<OcrToken>, OcrError>;
}

/// Token payload returned by the remote OCR service
#[derive(Debug, Deserialize)]
struct ScanResponse {
    tokens: Vec<OcrToken>,
}

/// HTTP OCR engine
///
/// Posts the image to a vision service that returns word-level tokens with
/// pixel bounds and an assigned line index.
pub struct HttpOcrEngine {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpOcrEngine {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl OcrEngine for HttpOcrEngine {
    async fn is_available(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn scan(&self, image_data: &[u8]) -> Result<Vec<OcrToken>, OcrError> {
        let url = format!("{}/v1/recognize", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/octet-stream")
            .body(image_data.to_vec())
            .send()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to call OCR service: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(format!(
                "OCR service returned {}: {}",
                status, body
            )));
        }

        let result: ScanResponse = response
            .json()
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Failed to parse response: {}", e)))?;

        Ok(result.tokens)
    }
}

/// Mock engine for testing
#[cfg(test)]
pub struct MockOcrEngine {
    pub tokens: Vec<OcrToken>,
}

#[cfg(test)]
#[async_trait]
impl OcrEngine for MockOcrEngine {
    async fn is_available(&self) -> bool {
        true
    }

    async fn scan(&self, _image_data: &[u8]) -> Result<Vec<OcrToken>, OcrError> {
        Ok(self.tokens.clone())
    }
}
