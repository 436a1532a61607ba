use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Rejections raised before any upstream call is made.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no chart image supplied, please select a chart image first")]
    EmptyImage,

    #[error("failed to read chart image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single model attempt failed at the network/HTTP level.
///
/// Every variant is recoverable: the analyzer moves on to the next model in its chain.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed response envelope: {0}")]
    MalformedEnvelope(String),
}

/// The upstream replied, but the reply text did not hold a usable analysis.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in response")]
    NoJsonObject,

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("response has no signal.action")]
    MissingAction,

    #[error("unknown signal action: {0}")]
    UnknownAction(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}
