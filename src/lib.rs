pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod history;
pub mod openrouter;

pub use analysis::{AnalysisRequest, ChartAnalysis, RiskLevel, SignalAction, Timeframe, TradingSignal};
pub use analyzer::{AnalysisOutcome, AnalysisSource, AnalyzerSettings, ChartAnalyzer, FallbackReason};
pub use config::Config;
pub use error::{AnalysisError, ParseError, StorageError, TransportError};
