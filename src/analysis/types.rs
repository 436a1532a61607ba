use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::AnalysisError;

/// Indicators offered to the user when picking what the model should focus on.
pub const INDICATORS: [&str; 20] = [
    "RSI",
    "MACD",
    "Moving Average",
    "Bollinger Bands",
    "Stochastic",
    "Volume",
    "Support/Resistance",
    "Fibonacci",
    "Ichimoku",
    "Williams %R",
    "CCI",
    "ATR",
    "ADX",
    "Parabolic SAR",
    "OBV",
    "Money Flow Index",
    "Aroon",
    "TRIX",
    "Ultimate Oscillator",
    "Rate of Change",
];

pub const DEFAULT_INDICATORS: [&str; 2] = ["RSI", "MACD"];

pub const FALLBACK_REASONING: &str = "Unable to parse AI response. Please try again.";
pub const FALLBACK_MARKET_CONDITION: &str = "Unable to determine";
pub const FALLBACK_SUPPORT_RESISTANCE: &str = "Unable to identify";
pub const FALLBACK_TREND_ANALYSIS: &str = "Unable to analyze";
pub const FALLBACK_VOLUME_ANALYSIS: &str = "Unable to analyze";

pub fn is_known_indicator(name: &str) -> bool {
    INDICATORS.iter().any(|i| i.eq_ignore_ascii_case(name.trim()))
}

/// Normalizes "buy long", "Buy-Long" etc. into the SCREAMING_SNAKE_CASE token.
fn normalize_token(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_uppercase() })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Timeframe {
    Scalping,
    #[default]
    Intraday,
    Swing,
    Position,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::Scalping,
        Timeframe::Intraday,
        Timeframe::Swing,
        Timeframe::Position,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Scalping => "SCALPING",
            Timeframe::Intraday => "INTRADAY",
            Timeframe::Swing => "SWING",
            Timeframe::Position => "POSITION",
        }
    }

    /// Human label shown next to the token in pickers.
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Scalping => "Scalping (1-5 min)",
            Timeframe::Intraday => "Intraday (1-4 hours)",
            Timeframe::Swing => "Swing (1-7 days)",
            Timeframe::Position => "Position (weeks-months)",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = normalize_token(s);
        Timeframe::ALL
            .into_iter()
            .find(|t| t.as_str() == token)
            .ok_or_else(|| format!("unknown timeframe '{}' (expected SCALPING, INTRADAY, SWING or POSITION)", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalAction {
    Hold,
    BuyLong,
    BuyShort,
    Sell,
}

impl SignalAction {
    pub const ALL: [SignalAction; 4] = [
        SignalAction::Hold,
        SignalAction::BuyLong,
        SignalAction::BuyShort,
        SignalAction::Sell,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalAction::Hold => "HOLD",
            SignalAction::BuyLong => "BUY_LONG",
            SignalAction::BuyShort => "BUY_SHORT",
            SignalAction::Sell => "SELL",
        }
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = normalize_token(s);
        SignalAction::ALL
            .into_iter()
            .find(|a| a.as_str() == token)
            .ok_or_else(|| s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            _ => Err(s.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingSignal {
    pub action: SignalAction,
    pub confidence: u8, // 0-100
    pub reasoning: String,
    pub timeframe: Timeframe,
    pub indicators: Vec<String>,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartAnalysis {
    pub signal: TradingSignal,
    pub market_condition: String,
    pub support_resistance: String,
    pub trend_analysis: String,
    pub volume_analysis: String,
}

impl ChartAnalysis {
    /// The record returned whenever no genuine upstream analysis could be obtained.
    pub fn fallback() -> Self {
        Self {
            signal: TradingSignal {
                action: SignalAction::Hold,
                confidence: 50,
                reasoning: FALLBACK_REASONING.to_string(),
                timeframe: Timeframe::Intraday,
                indicators: Vec::new(),
                risk_level: RiskLevel::Medium,
            },
            market_condition: FALLBACK_MARKET_CONDITION.to_string(),
            support_resistance: FALLBACK_SUPPORT_RESISTANCE.to_string(),
            trend_analysis: FALLBACK_TREND_ANALYSIS.to_string(),
            volume_analysis: FALLBACK_VOLUME_ANALYSIS.to_string(),
        }
    }
}

/// One user-triggered analysis: the chart plus the context the model should consider.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image_base64: String,
    pub timeframe: Timeframe,
    pub indicators: Vec<String>,
    pub symbol: Option<String>,
}

impl AnalysisRequest {
    pub fn new(
        image_base64: impl Into<String>,
        timeframe: Timeframe,
        indicators: Vec<String>,
        symbol: Option<String>,
    ) -> Self {
        Self {
            image_base64: image_base64.into(),
            timeframe,
            indicators,
            symbol,
        }
    }

    /// Reads a chart image from disk and base64-encodes it for upload.
    pub fn from_image_file(
        path: impl AsRef<Path>,
        timeframe: Timeframe,
        indicators: Vec<String>,
        symbol: Option<String>,
    ) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| AnalysisError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(Self::new(image_base64, timeframe, indicators, symbol))
    }

    pub fn has_image(&self) -> bool {
        !self.image_base64.trim().is_empty()
    }

    pub fn image_data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.image_base64)
    }
}
