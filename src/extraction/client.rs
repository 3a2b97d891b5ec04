//! Extraction Client
//!
//! Submits numbered receipt text to a language-model extraction service and
//! returns the raw draft payload. The service is invoked with a strict JSON
//! schema so the answer can be parsed without free-form text handling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::types::{ExtractionError, RawDraft};

const SYSTEM_PROMPT: &str = "You are a receipt parsing service. You are given \
the text of a scanned receipt, one numbered line per row. Infer the merchant \
name, the purchase date in MM-DD-YYYY format, the merchant street address, \
the merchant website domain, and the payment method. List every purchased \
item in the order it appears, with a normalized description (correct \
capitalization, no stray tokens), its cost, and the number of the line it \
was read from. Report the printed subtotal and total, each rounded to two \
decimals.";

/// Extraction client trait
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Request a structured draft for the given numbered line text.
    async fn extract(&self, numbered_lines: &str) -> Result<RawDraft, ExtractionError>;
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// OpenAI-compatible extraction client using structured outputs.
pub struct OpenAiExtractor {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiExtractor {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// Output-shape constraint sent alongside every request.
    ///
    /// `items`, `subtotal` and `total` are required by the schema; `date`
    /// and `name` are enforced by the caller before acceptance.
    fn response_schema() -> serde_json::Value {
        json!({
            "type": "json_schema",
            "json_schema": {
                "name": "receipt_draft",
                "strict": true,
                "schema": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "date": { "type": "string" },
                        "merchant_address": { "type": "string" },
                        "merchant_website": { "type": "string" },
                        "payment_method": { "type": "string" },
                        "items": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "description": { "type": "string" },
                                    "cost": { "type": "number" },
                                    "line_number": { "type": "integer" }
                                },
                                "required": ["description", "cost", "line_number"]
                            }
                        },
                        "subtotal": { "type": "number" },
                        "total": { "type": "number" }
                    },
                    "required": ["items", "subtotal", "total"]
                }
            }
        })
    }
}

#[async_trait]
impl ExtractionClient for OpenAiExtractor {
    async fn extract(&self, numbered_lines: &str) -> Result<RawDraft, ExtractionError> {
        let body = json!({
            "model": self.model,
            "messages": [
                ChatMessage { role: "system", content: SYSTEM_PROMPT.to_string() },
                ChatMessage { role: "user", content: numbered_lines.to_string() },
            ],
            "response_format": Self::response_schema(),
            "temperature": 0.0,
        });

        debug!(model = %self.model, "Requesting receipt extraction");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractionError::Api(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Api(format!(
                "extraction service returned {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Api(format!("invalid response body: {}", e)))?;

        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ExtractionError::Shape("no choices in response".into()))?;

        RawDraft::from_json(content)
    }
}

/// Mock client for testing
#[cfg(test)]
pub struct MockExtractor {
    pub draft: std::sync::Mutex<Option<Result<RawDraft, ExtractionError>>>,
}

#[cfg(test)]
impl MockExtractor {
    pub fn returning(draft: RawDraft) -> Self {
        Self {
            draft: std::sync::Mutex::new(Some(Ok(draft))),
        }
    }

    pub fn failing(error: ExtractionError) -> Self {
        Self {
            draft: std::sync::Mutex::new(Some(Err(error))),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl ExtractionClient for MockExtractor {
    async fn extract(&self, _numbered_lines: &str) -> Result<RawDraft, ExtractionError> {
        self.draft
            .lock()
            .unwrap()
            .take()
            .expect("mock extractor called more than once")
    }
}
