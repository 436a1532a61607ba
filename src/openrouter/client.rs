use async_trait::async_trait;
use tracing::{debug, warn};

use super::api::ChatBackend;
use super::types::{ChatRequest, ChatResponse};
use crate::config::OpenRouterConfig;
use crate::error::TransportError;

const MAX_ERROR_BODY: usize = 500;

pub struct OpenRouterClient {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
    referer: String,
    title: String,
}

#[async_trait]
impl ChatBackend for OpenRouterClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, TransportError> {
        debug!("POST {} (model {})", self.api_url, request.model);

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("OpenRouter error response ({}): {}", status, truncate(&body));
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate(&body).to_string(),
            });
        }

        let envelope: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::MalformedEnvelope(format!("{}: {}", e, truncate(&body))))?;

        envelope
            .into_first_content()
            .ok_or_else(|| TransportError::MalformedEnvelope(format!("missing choices[0].message.content: {}", truncate(&body))))
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl OpenRouterClient {
    pub fn new(config: &OpenRouterConfig) -> Self {
        // Per-attempt deadlines are enforced by the caller; only the connect phase is bounded here
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            referer: config.referer.clone(),
            title: config.title.clone(),
        }
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
