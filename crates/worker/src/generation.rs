//! Generation collaborator: turns decrypted child summaries into prose.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use rollup_core::{Error, Layer, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use telemetry::health;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::GenerationConfig;

/// One child summary in plaintext, as sent to the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptedChild {
    pub id: Uuid,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub content: String,
}

/// Request for one parent summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub owner_id: String,
    pub layer: Layer,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Chronological
    pub children: Vec<DecryptedChild>,
    pub personalization: serde_json::Value,
}

/// Generated plaintext.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    #[serde(default)]
    pub content: String,
    /// Optional encouraging / reflective narrative
    #[serde(default)]
    pub supplementary_content: Option<String>,
    /// The service knows this period is already summarized
    #[serde(default)]
    pub already_exists: bool,
}

impl GeneratedContent {
    pub fn already_exists() -> Self {
        Self {
            already_exists: true,
            ..Self::default()
        }
    }
}

/// Produces parent summary prose from child summaries.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedContent>;
}

/// Generation service over HTTP.
///
/// `POST {url}/v1/summaries/{layer}` with a JSON `GenerationRequest`.
/// A `409 Conflict` means the period was already summarized elsewhere.
#[derive(Clone)]
pub struct HttpContentGenerator {
    base_url: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl HttpContentGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http_client,
        })
    }

    fn endpoint(&self, layer: Layer) -> String {
        format!("{}/v1/summaries/{}", self.base_url, layer)
    }
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedContent> {
        let url = self.endpoint(request.layer);
        debug!(url = %url, children = request.children.len(), "Calling generation service");

        let mut builder = self.http_client.post(&url).json(request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Generation request failed");
            health().generator.set_unhealthy(e.to_string());
            Error::generation(format!("Generation service unavailable: {}", e))
        })?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            health().generator.set_healthy();
            return Ok(GeneratedContent::already_exists());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Generation service returned error");
            if status.is_server_error() {
                health().generator.set_unhealthy(format!("HTTP {}", status));
            }
            return Err(Error::generation(format!(
                "Generation service returned {}: {}",
                status, body
            )));
        }

        let generated: GeneratedContent = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse generation response");
            Error::generation(format!("Invalid generation response: {}", e))
        })?;

        health().generator.set_healthy();

        if !generated.already_exists && generated.content.trim().is_empty() {
            return Err(Error::generation("Generation service returned empty content"));
        }

        Ok(generated)
    }
}
