use async_trait::async_trait;

use super::types::ChatRequest;
use crate::error::TransportError;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one chat completion and return `choices[0].message.content`
    async fn complete(&self, request: &ChatRequest) -> Result<String, TransportError>;

    /// Whether credentials are present. Probes skip the network when this is false.
    fn is_configured(&self) -> bool {
        true
    }
}
