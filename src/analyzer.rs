use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::analysis::prompt::{build_insight_prompt, build_request_prompt, PROBE_PROMPT};
use crate::analysis::{parse_analysis, AnalysisRequest, ChartAnalysis};
use crate::config::OpenRouterConfig;
use crate::error::{AnalysisError, TransportError};
use crate::openrouter::{ChatBackend, ChatRequest, OpenRouterClient};

pub const INSIGHT_UNAVAILABLE: &str = "Unable to fetch market insight at this time.";

const PROBE_MAX_TOKENS: u32 = 50;
const PROBE_TEMPERATURE: f32 = 0.1;
const INSIGHT_MAX_TOKENS: u32 = 500;
const INSIGHT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    /// Tried in order until one answers at the transport level.
    pub analysis_models: Vec<String>,
    pub probe_models: Vec<String>,
    pub insight_model: String,
    pub attempt_timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl From<&OpenRouterConfig> for AnalyzerSettings {
    fn from(config: &OpenRouterConfig) -> Self {
        Self {
            analysis_models: config.analysis_models.clone(),
            probe_models: config.probe_models.clone(),
            insight_model: config.insight_model.clone(),
            attempt_timeout: config.request_timeout(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Every model in the chain failed at the network/HTTP level.
    ModelsExhausted,
    /// A model answered but its reply held no usable analysis.
    Unparseable { model: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisSource {
    Model(String),
    Fallback(FallbackReason),
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub analysis: ChartAnalysis,
    pub source: AnalysisSource,
    pub attempts: usize,
}

impl AnalysisOutcome {
    fn fallback(reason: FallbackReason, attempts: usize) -> Self {
        Self {
            analysis: ChartAnalysis::fallback(),
            source: AnalysisSource::Fallback(reason),
            attempts,
        }
    }
}

/// Turns chart screenshots into trading signals via a chain of multimodal models.
///
/// Holds no mutable state; every call is independent. Callers should not run
/// two `analyze` calls for the same user action concurrently.
pub struct ChartAnalyzer {
    backend: Arc<dyn ChatBackend>,
    settings: AnalyzerSettings,
}

impl ChartAnalyzer {
    pub fn new(backend: Arc<dyn ChatBackend>, settings: AnalyzerSettings) -> Self {
        Self { backend, settings }
    }

    pub fn from_config(config: &OpenRouterConfig) -> Self {
        info!("🤖 Initializing chart analyzer with OpenRouter key: {}", config.masked_key());
        Self::new(Arc::new(OpenRouterClient::new(config)), AnalyzerSettings::from(config))
    }

    /// Analyze a chart. Upstream failures never surface as errors: they end in the
    /// fallback record. Only a request without an image is rejected.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<ChartAnalysis, AnalysisError> {
        self.analyze_detailed(request).await.map(|outcome| outcome.analysis)
    }

    /// Same as [`ChartAnalyzer::analyze`], also reporting where the result came from.
    pub async fn analyze_detailed(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        if !request.has_image() {
            return Err(AnalysisError::EmptyImage);
        }

        info!(
            "📈 Analyzing chart: timeframe={}, indicators={:?}, image={} chars",
            request.timeframe,
            request.indicators,
            request.image_base64.len()
        );

        let prompt = build_request_prompt(request);
        let image_url = request.image_data_uri();
        let mut attempts = 0;

        for model in &self.settings.analysis_models {
            attempts += 1;
            let chat = ChatRequest::vision(
                model,
                prompt.clone(),
                image_url.clone(),
                self.settings.max_tokens,
                self.settings.temperature,
            );

            let text = match self.attempt(&chat).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("⚠️ Model {} failed: {}", model, e);
                    continue;
                }
            };

            info!("✅ Model {} replied ({} chars)", model, text.len());

            // A reply that arrived but cannot be parsed is final: no further models
            return Ok(match parse_analysis(&text, request) {
                Ok(analysis) => AnalysisOutcome {
                    analysis,
                    source: AnalysisSource::Model(model.clone()),
                    attempts,
                },
                Err(e) => {
                    error!("❌ Could not parse reply from {}: {}", model, e);
                    AnalysisOutcome::fallback(FallbackReason::Unparseable { model: model.clone() }, attempts)
                }
            });
        }

        error!("❌ All {} models failed, returning fallback analysis", attempts);
        Ok(AnalysisOutcome::fallback(FallbackReason::ModelsExhausted, attempts))
    }

    /// Connectivity probe: true as soon as one probe model returns non-empty content.
    pub async fn test_connection(&self) -> bool {
        if !self.backend.is_configured() {
            warn!("⚠️ No API key configured, skipping connectivity probe");
            return false;
        }

        for model in &self.settings.probe_models {
            let chat = ChatRequest::text(model, PROBE_PROMPT.to_string(), PROBE_MAX_TOKENS, PROBE_TEMPERATURE);
            match self.attempt(&chat).await {
                Ok(text) if !text.trim().is_empty() => {
                    info!("✅ Probe model {} responded: {}", model, text.trim());
                    return true;
                }
                Ok(_) => warn!("⚠️ Probe model {} returned empty content", model),
                Err(e) => warn!("⚠️ Probe model {} failed: {}", model, e),
            }
        }

        error!("❌ Connectivity probe failed on every model");
        false
    }

    /// Short narrative outlook for a symbol from a single model, no retries.
    pub async fn get_insight(&self, symbol: &str) -> String {
        let chat = ChatRequest::text(
            &self.settings.insight_model,
            build_insight_prompt(symbol),
            INSIGHT_MAX_TOKENS,
            INSIGHT_TEMPERATURE,
        );

        match self.attempt(&chat).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("⚠️ Empty market insight for {}", symbol);
                INSIGHT_UNAVAILABLE.to_string()
            }
            Err(e) => {
                error!("❌ Error getting market insight for {}: {}", symbol, e);
                INSIGHT_UNAVAILABLE.to_string()
            }
        }
    }

    /// One upstream call raced against the attempt timeout. On timeout the call is dropped.
    async fn attempt(&self, chat: &ChatRequest) -> Result<String, TransportError> {
        match tokio::time::timeout(self.settings.attempt_timeout, self.backend.complete(chat)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.settings.attempt_timeout)),
        }
    }
}
