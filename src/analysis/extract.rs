use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::types::{AnalysisRequest, ChartAnalysis, RiskLevel, SignalAction, TradingSignal};
use crate::error::ParseError;

const DEFAULT_CONFIDENCE: u8 = 50;

// Gaps in a genuine reply. Kept distinct from the fallback record's texts.
pub const REASONING_NOT_PROVIDED: &str = "No reasoning provided by the model.";
pub const NOT_PROVIDED: &str = "Not provided by the model";

/// Locate the JSON object embedded in a model reply: first `{` through last `}`.
///
/// This does not balance braces, so prose containing braces around the object
/// widens the span and the decode that follows fails.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

// Loose mirror of the reply shape. Models drift on types (numbers as strings,
// objects where prose was asked for), so fields stay as raw values until normalized.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    signal: Option<RawSignal>,
    market_condition: Option<Value>,
    support_resistance: Option<Value>,
    trend_analysis: Option<Value>,
    volume_analysis: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSignal {
    action: Option<Value>,
    confidence: Option<Value>,
    reasoning: Option<Value>,
    timeframe: Option<Value>,
    indicators: Option<Value>,
    risk_level: Option<Value>,
}

/// Parse a model reply into a fully populated `ChartAnalysis`.
///
/// Only `signal.action` is mandatory. Other gaps are filled from the request
/// (timeframe, indicators) or marked as not provided.
pub fn parse_analysis(text: &str, request: &AnalysisRequest) -> Result<ChartAnalysis, ParseError> {
    let json = extract_json_object(text).ok_or(ParseError::NoJsonObject)?;
    debug!("JSON span found ({} chars)", json.len());

    let raw: RawAnalysis = serde_json::from_str(json)?;
    let signal = raw.signal.ok_or(ParseError::MissingAction)?;

    let action = match signal.action {
        None | Some(Value::Null) => return Err(ParseError::MissingAction),
        Some(Value::String(s)) => s.parse::<SignalAction>().map_err(ParseError::UnknownAction)?,
        Some(other) => return Err(ParseError::UnknownAction(other.to_string())),
    };

    let timeframe = signal
        .timeframe
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(request.timeframe);

    let risk_level = signal
        .risk_level
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<RiskLevel>().ok())
        .unwrap_or_default();

    let indicators = signal
        .indicators
        .as_ref()
        .and_then(indicator_list)
        .unwrap_or_else(|| request.indicators.clone());

    Ok(ChartAnalysis {
        signal: TradingSignal {
            action,
            confidence: signal.confidence.as_ref().map_or(DEFAULT_CONFIDENCE, confidence_value),
            reasoning: text_or(signal.reasoning, REASONING_NOT_PROVIDED),
            timeframe,
            indicators,
            risk_level,
        },
        market_condition: text_or(raw.market_condition, NOT_PROVIDED),
        support_resistance: text_or(raw.support_resistance, NOT_PROVIDED),
        trend_analysis: text_or(raw.trend_analysis, NOT_PROVIDED),
        volume_analysis: text_or(raw.volume_analysis, NOT_PROVIDED),
    })
}

/// Confidence as an integer percentage in [0, 100].
fn confidence_value(value: &Value) -> u8 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };

    match raw {
        Some(x) if x.is_finite() => {
            // 0.85 style fractions
            let pct = if x > 0.0 && x < 1.0 { x * 100.0 } else { x };
            pct.round().clamp(0.0, 100.0) as u8
        }
        _ => DEFAULT_CONFIDENCE,
    }
}

fn text_or(value: Option<Value>, default: &str) -> String {
    let text = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    if text.is_empty() {
        default.to_string()
    } else {
        text
    }
}

fn indicator_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    _ => None,
                })
                .collect(),
        ),
        Value::String(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::Timeframe;

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(
            "aGVsbG8=",
            Timeframe::Swing,
            vec!["RSI".to_string(), "MACD".to_string()],
            None,
        )
    }

    const GOOD_REPLY: &str = r#"Here is my analysis:
```json
{
  "signal": {
    "action": "BUY_LONG",
    "confidence": 72,
    "reasoning": "Higher lows with RSI recovering from 40.",
    "timeframe": "SWING",
    "indicators": ["RSI", "MACD"],
    "riskLevel": "LOW"
  },
  "marketCondition": "Bullish",
  "supportResistance": "Support 41200, resistance 43800",
  "trendAnalysis": "Uptrend, moderate strength",
  "volumeAnalysis": "Rising volume on green candles"
}
```"#;

    #[test]
    fn test_extract_span() {
        assert_eq!(extract_json_object("x {\"a\":1} y"), Some("{\"a\":1}"));
        assert_eq!(extract_json_object("{a} and {b}"), Some("{a} and {b}"));
        assert_eq!(extract_json_object("no braces here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
        assert_eq!(extract_json_object("only open {"), None);
    }

    #[test]
    fn test_parse_genuine_reply() {
        let analysis = parse_analysis(GOOD_REPLY, &request()).unwrap();

        assert_eq!(analysis.signal.action, SignalAction::BuyLong);
        assert_eq!(analysis.signal.confidence, 72);
        assert_eq!(analysis.signal.risk_level, RiskLevel::Low);
        assert_eq!(analysis.signal.timeframe, Timeframe::Swing);
        assert_eq!(analysis.market_condition, "Bullish");
        assert_eq!(analysis.support_resistance, "Support 41200, resistance 43800");
        assert_ne!(analysis, ChartAnalysis::fallback());
    }

    #[test]
    fn test_missing_action_is_error() {
        let reply = r#"{"signal": {"confidence": 80}, "marketCondition": "Bullish"}"#;
        assert!(matches!(parse_analysis(reply, &request()), Err(ParseError::MissingAction)));

        let reply = r#"{"marketCondition": "Bullish"}"#;
        assert!(matches!(parse_analysis(reply, &request()), Err(ParseError::MissingAction)));
    }

    #[test]
    fn test_template_action_is_rejected() {
        let reply = r#"{"signal": {"action": "HOLD|BUY_LONG|BUY_SHORT|SELL"}}"#;
        assert!(matches!(parse_analysis(reply, &request()), Err(ParseError::UnknownAction(_))));
    }

    #[test]
    fn test_no_json_and_bad_json() {
        assert!(matches!(
            parse_analysis("I cannot analyze this image.", &request()),
            Err(ParseError::NoJsonObject)
        ));
        assert!(matches!(
            parse_analysis("{ not json at all }", &request()),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_defaults_fill_gaps() {
        let reply = r#"{"signal": {"action": "sell"}}"#;
        let analysis = parse_analysis(reply, &request()).unwrap();

        assert_eq!(analysis.signal.action, SignalAction::Sell);
        assert_eq!(analysis.signal.confidence, 50);
        assert_eq!(analysis.signal.timeframe, Timeframe::Swing);
        assert_eq!(analysis.signal.indicators, vec!["RSI", "MACD"]);
        assert_eq!(analysis.signal.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.signal.reasoning, REASONING_NOT_PROVIDED);
        assert_eq!(analysis.market_condition, NOT_PROVIDED);
        assert_eq!(analysis.volume_analysis, NOT_PROVIDED);
    }

    #[test]
    fn test_sparse_reply_never_carries_fallback_text() {
        use crate::analysis::types::{
            FALLBACK_MARKET_CONDITION, FALLBACK_REASONING, FALLBACK_SUPPORT_RESISTANCE, FALLBACK_TREND_ANALYSIS,
        };

        let request = AnalysisRequest::new("aGVsbG8=", Timeframe::Intraday, vec![], None);

        let analysis = parse_analysis(r#"{"signal":{"action":"BUY_LONG","confidence":80}}"#, &request).unwrap();
        assert_eq!(analysis.signal.action, SignalAction::BuyLong);
        assert_ne!(analysis.signal.reasoning, FALLBACK_REASONING);
        assert_ne!(analysis.market_condition, FALLBACK_MARKET_CONDITION);
        assert_ne!(analysis.support_resistance, FALLBACK_SUPPORT_RESISTANCE);
        assert_ne!(analysis.trend_analysis, FALLBACK_TREND_ANALYSIS);

        // A bare HOLD with the fallback's timeframe still differs from the fallback record
        let analysis = parse_analysis(r#"{"signal":{"action":"HOLD"}}"#, &request).unwrap();
        assert_eq!(analysis.signal.action, SignalAction::Hold);
        assert_ne!(analysis, ChartAnalysis::fallback());
        assert_eq!(analysis.signal.reasoning, REASONING_NOT_PROVIDED);
    }

    #[test]
    fn test_confidence_normalization() {
        assert_eq!(confidence_value(&serde_json::json!(85)), 85);
        assert_eq!(confidence_value(&serde_json::json!(72.6)), 73);
        assert_eq!(confidence_value(&serde_json::json!(0.85)), 85);
        assert_eq!(confidence_value(&serde_json::json!(150)), 100);
        assert_eq!(confidence_value(&serde_json::json!(-5)), 0);
        assert_eq!(confidence_value(&serde_json::json!("64%")), 64);
        assert_eq!(confidence_value(&serde_json::json!("high")), 50);
    }

    #[test]
    fn test_structured_narrative_is_kept() {
        let reply = r#"{
            "signal": {"action": "HOLD", "indicators": "RSI, Volume"},
            "supportResistance": {"support": 100, "resistance": 120}
        }"#;
        let analysis = parse_analysis(reply, &request()).unwrap();

        assert_eq!(analysis.signal.indicators, vec!["RSI", "Volume"]);
        assert!(analysis.support_resistance.contains("\"support\":100"));
    }
}
