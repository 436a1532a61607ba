use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chart_signal_agent::analysis::types::{is_known_indicator, DEFAULT_INDICATORS, INDICATORS};
use chart_signal_agent::analyzer::{AnalysisSource, FallbackReason};
use chart_signal_agent::config::Config;
use chart_signal_agent::history::{FileStore, HistoryItem, HistoryStore};
use chart_signal_agent::{AnalysisError, AnalysisRequest, ChartAnalysis, ChartAnalyzer, Timeframe};

#[derive(Parser, Debug)]
#[command(author, version, about = "AI trading signals from chart screenshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a chart image and print the trading signal
    Analyze {
        /// Chart screenshot (PNG)
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value_t = Timeframe::Intraday)]
        timeframe: Timeframe,
        /// Repeat for several indicators (default: RSI, MACD)
        #[arg(long = "indicator")]
        indicators: Vec<String>,
        #[arg(long)]
        symbol: Option<String>,
        /// Do not record the result in history
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// Browse or delete past analyses
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
    /// Check that the API key and upstream are usable
    Probe,
    /// Short market insight for a symbol
    Insight { symbol: String },
    /// List available indicators and timeframes
    Indicators,
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    List,
    Show { id: String },
    Remove { id: String },
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chart_signal_agent=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Analyze {
            image,
            timeframe,
            indicators,
            symbol,
            no_save,
        } => run_analyze(&config, image, timeframe, indicators, symbol, no_save).await,
        Command::History { action } => run_history(&config, action),
        Command::Probe => {
            print_banner(&config);
            let analyzer = ChartAnalyzer::from_config(&config.openrouter);
            if analyzer.test_connection().await {
                println!("✅ OpenRouter reachable");
                Ok(())
            } else {
                println!("❌ OpenRouter probe failed (check OPENROUTER_API_KEY)");
                std::process::exit(1);
            }
        }
        Command::Insight { symbol } => {
            let analyzer = ChartAnalyzer::from_config(&config.openrouter);
            println!("{}", analyzer.get_insight(&symbol).await);
            Ok(())
        }
        Command::Indicators => {
            println!("Timeframes:");
            for timeframe in Timeframe::ALL {
                println!("   • {:<9} {}", timeframe.as_str(), timeframe.label());
            }
            println!("Indicators:");
            for indicator in INDICATORS {
                println!("   • {}", indicator);
            }
            Ok(())
        }
    }
}

async fn run_analyze(
    config: &Config,
    image: PathBuf,
    timeframe: Timeframe,
    indicators: Vec<String>,
    symbol: Option<String>,
    no_save: bool,
) -> Result<()> {
    print_banner(config);

    let indicators = if indicators.is_empty() {
        DEFAULT_INDICATORS.iter().map(|i| i.to_string()).collect()
    } else {
        indicators
    };
    for indicator in indicators.iter().filter(|i| !is_known_indicator(i)) {
        warn!("⚠️ Unknown indicator '{}', sending it as-is", indicator);
    }

    let request = AnalysisRequest::from_image_file(&image, timeframe, indicators, symbol)?;
    let analyzer = ChartAnalyzer::from_config(&config.openrouter);

    let outcome = match analyzer.analyze_detailed(&request).await {
        Ok(outcome) => outcome,
        Err(AnalysisError::EmptyImage) => {
            anyhow::bail!("No Image: please select a chart image first ({} is empty)", image.display())
        }
        Err(e) => return Err(e.into()),
    };

    match &outcome.source {
        AnalysisSource::Model(model) => info!("Analysis produced by {}", model),
        AnalysisSource::Fallback(FallbackReason::ModelsExhausted) => {
            warn!("⚠️ No model answered, showing fallback analysis")
        }
        AnalysisSource::Fallback(FallbackReason::Unparseable { model }) => {
            warn!("⚠️ Reply from {} was not usable, showing fallback analysis", model)
        }
    }

    print_analysis(&outcome.analysis);

    if !no_save {
        let mut history = HistoryStore::load(FileStore::new(&config.history.dir))
            .context("failed to open analysis history")?;
        let item = history.append(
            outcome.analysis,
            request.image_base64,
            request.timeframe,
            request.indicators,
        )?;
        println!("💾 Saved to history as {}", item.id);
    }

    Ok(())
}

fn run_history(config: &Config, action: HistoryCommand) -> Result<()> {
    let mut history =
        HistoryStore::load(FileStore::new(&config.history.dir)).context("failed to open analysis history")?;

    match action {
        HistoryCommand::List => {
            if history.is_empty() {
                println!("No analyses yet. Run `analyze --image <PATH>` to create one.");
            }
            for item in history.items() {
                print_history_row(item);
            }
        }
        HistoryCommand::Show { id } => {
            let item = history
                .get(&id)
                .with_context(|| format!("no history item with id {}", id))?;
            print_history_row(item);
            println!("Indicators requested: {}", item.indicators.join(", "));
            print_analysis(&item.analysis);
        }
        HistoryCommand::Remove { id } => {
            if history.remove(&id)? {
                println!("🗑️ Removed {}", id);
            } else {
                anyhow::bail!("no history item with id {}", id);
            }
        }
        HistoryCommand::Clear => {
            let count = history.len();
            history.clear()?;
            println!("🗑️ Cleared {} analyses", count);
        }
    }

    Ok(())
}

fn print_history_row(item: &HistoryItem) {
    let local = item.timestamp.with_timezone(&chrono::Local);
    println!(
        "{}  {}  {:<9} {:>3}%  {}",
        item.id,
        local.format("%Y-%m-%d %H:%M:%S"),
        item.analysis.signal.action.as_str(),
        item.analysis.signal.confidence,
        item.timeframe
    );
}

fn print_analysis(analysis: &ChartAnalysis) {
    let signal = &analysis.signal;
    println!();
    println!("═══════════════════════════════════════════════════════════");
    println!("📊 Signal:     {}", signal.action);
    println!("🎯 Confidence: {}%", signal.confidence);
    println!("⚠️  Risk Level: {}", signal.risk_level);
    println!("⏱️  Timeframe:  {} ({})", signal.timeframe, signal.timeframe.label());
    if !signal.indicators.is_empty() {
        println!("📐 Indicators: {}", signal.indicators.join(", "));
    }
    println!("═══════════════════════════════════════════════════════════");
    println!("Reasoning:\n   {}", signal.reasoning);
    println!("Market Condition:\n   {}", analysis.market_condition);
    println!("Support & Resistance:\n   {}", analysis.support_resistance);
    println!("Trend Analysis:\n   {}", analysis.trend_analysis);
    println!("Volume Analysis:\n   {}", analysis.volume_analysis);
    println!();
}

fn print_banner(config: &Config) {
    println!("\n╔═══════════════════════════════════════════════════════════╗");
    println!("║          AI Trading Assistant with OpenRouter             ║");
    println!("╚═══════════════════════════════════════════════════════════╝");
    println!();
    println!("🔑 API Key: {}", config.openrouter.masked_key());
    println!("🤖 Model chain:");
    for model in &config.openrouter.analysis_models {
        println!("   • {}", model);
    }
    println!("⏱️  Timeout per model: {} seconds", config.openrouter.request_timeout_secs);
    println!("📚 History: {}", config.history.dir.display());
    println!("═══════════════════════════════════════════════════════════");
    println!();
}
