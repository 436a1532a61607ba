use super::types::{AnalysisRequest, Timeframe};

pub const PROBE_PROMPT: &str = "Hello, respond with 'API working'";

/// Build the chart analysis instruction.
///
/// The reply is expected to be a single JSON object in the `ChartAnalysis` shape,
/// with the enum values spelled exactly as listed.
pub fn build_analysis_prompt(timeframe: Timeframe, indicators: &[String], symbol: Option<&str>) -> String {
    let symbol = symbol.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("Unknown");

    format!(
        r#"
You are an expert trading analyst. Analyze this trading chart image and provide a comprehensive trading recommendation.

CHART ANALYSIS REQUIREMENTS:
1. Analyze the chart pattern, trend, and price action
2. Consider the following indicators: {indicators}
3. Timeframe context: {timeframe}
4. Symbol: {symbol}

RESPONSE FORMAT (return as JSON):
{{
  "signal": {{
    "action": "HOLD|BUY_LONG|BUY_SHORT|SELL",
    "confidence": 85,
    "reasoning": "Detailed explanation of the analysis",
    "timeframe": "{timeframe}",
    "indicators": ["RSI", "MACD", "Moving Average"],
    "riskLevel": "LOW|MEDIUM|HIGH"
  }},
  "marketCondition": "Bullish/Bearish/Sideways market conditions",
  "supportResistance": "Key support and resistance levels identified",
  "trendAnalysis": "Current trend direction and strength",
  "volumeAnalysis": "Volume analysis and its significance"
}}

ANALYSIS GUIDELINES:
- Be conservative with confidence levels
- Consider risk management
- Provide clear reasoning for your recommendation
- Focus on technical analysis from the chart
- Consider the timeframe context for the recommendation

Return only the JSON response, no additional text.
"#,
        indicators = indicators.join(", "),
        timeframe = timeframe.as_str(),
        symbol = symbol,
    )
}

pub fn build_request_prompt(request: &AnalysisRequest) -> String {
    build_analysis_prompt(request.timeframe, &request.indicators, request.symbol.as_deref())
}

pub fn build_insight_prompt(symbol: &str) -> String {
    format!(
        r#"
Provide a brief market insight for {} based on current market conditions.
Focus on:
- Key market drivers
- Recent price action
- Important levels to watch
- Risk factors

Keep it concise and actionable.
"#,
        symbol.trim()
    )
}
