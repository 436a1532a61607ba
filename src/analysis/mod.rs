pub mod extract;
pub mod prompt;
pub mod types;

pub use extract::{extract_json_object, parse_analysis};
pub use prompt::{build_analysis_prompt, build_insight_prompt};
pub use types::{AnalysisRequest, ChartAnalysis, RiskLevel, SignalAction, Timeframe, TradingSignal};
