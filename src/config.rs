use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_ANALYSIS_MODELS: [&str; 2] = [
    "google/gemma-3-27b-it:free",
    "meta-llama/llama-3.2-11b-vision-instruct:free",
];
pub const DEFAULT_PROBE_MODELS: [&str; 2] = ["google/gemma-3-27b-it:free", "mistralai/mistral-7b-instruct:free"];
pub const DEFAULT_INSIGHT_MODEL: &str = "google/gemma-3-27b-it:free";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub openrouter: OpenRouterConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenRouterConfig {
    pub api_key: String,
    pub api_url: String,
    // Attribution headers OpenRouter asks callers to send
    pub referer: String,
    pub title: String,
    pub analysis_models: Vec<String>,
    pub probe_models: Vec<String>,
    pub insight_model: String,
    pub request_timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    pub dir: PathBuf,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            referer: "https://aitrade.app".to_string(),
            title: "AI Trading Assistant".to_string(),
            analysis_models: DEFAULT_ANALYSIS_MODELS.iter().map(|m| m.to_string()).collect(),
            probe_models: DEFAULT_PROBE_MODELS.iter().map(|m| m.to_string()).collect(),
            insight_model: DEFAULT_INSIGHT_MODEL.to_string(),
            request_timeout_secs: 30,
            max_tokens: 2000,
            temperature: 0.7,
        }
    }
}

impl OpenRouterConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Key prefix safe to print in logs.
    pub fn masked_key(&self) -> String {
        if !self.has_api_key() {
            return "NO API KEY".to_string();
        }
        let prefix: String = self.api_key.chars().take(10).collect();
        format!("{}...", prefix)
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = OpenRouterConfig::default();

        let api_url = env::var("OPENROUTER_API_URL").unwrap_or(defaults.api_url);
        url::Url::parse(&api_url).with_context(|| format!("invalid OPENROUTER_API_URL: {}", api_url))?;

        let openrouter = OpenRouterConfig {
            api_key: env::var("OPENROUTER_API_KEY").unwrap_or_default(),
            api_url,
            referer: env::var("OPENROUTER_REFERER").unwrap_or(defaults.referer),
            title: env::var("OPENROUTER_TITLE").unwrap_or(defaults.title),
            analysis_models: env::var("ANALYSIS_MODELS")
                .map(|v| parse_model_list(&v))
                .ok()
                .filter(|models| !models.is_empty())
                .unwrap_or(defaults.analysis_models),
            probe_models: env::var("PROBE_MODELS")
                .map(|v| parse_model_list(&v))
                .ok()
                .filter(|models| !models.is_empty())
                .unwrap_or(defaults.probe_models),
            insight_model: env::var("INSIGHT_MODEL")
                .ok()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.insight_model),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            max_tokens: env::var("ANALYSIS_MAX_TOKENS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .unwrap_or(2000),
            temperature: env::var("ANALYSIS_TEMPERATURE")
                .unwrap_or_else(|_| "0.7".to_string())
                .parse()
                .unwrap_or(0.7),
        };

        let history = HistoryConfig {
            dir: env::var("HISTORY_DIR")
                .unwrap_or_else(|_| ".chart-signal-agent".to_string())
                .into(),
        };

        Ok(Config { openrouter, history })
    }
}

/// Comma separated model identifiers, blanks dropped, order kept.
pub fn parse_model_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}
