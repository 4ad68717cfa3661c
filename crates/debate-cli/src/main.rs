//! Command-line interface for debate-rs
//!
//! # Usage
//!
//! ```bash
//! # Credentials are read from the environment or a .env file
//! export GEMINI_API_KEY="..."
//!
//! debate analyze NVDA                 # SSE-framed progress events
//! debate analyze NVDA --format json   # final result only
//! debate chart NVDA --period 5d --interval 15m
//! debate quick-stats NVDA
//! debate search nvidia
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use debate_llm::LLMProvider;
use debate_llm::providers::{GeminiConfig, GeminiProvider, OpenAIConfig, OpenAIProvider};
use debate_stock::{
    AnalysisEvent, DebateConfig, DebateOrchestrator, FileResultCache, LlmBackend,
    MemoryResultCache, ResultCache, YahooFinanceClient,
};
use debate_utils::LogFormat;
use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "debate")]
#[command(about = "Multi-agent equity research verdicts", long_about = None)]
struct Args {
    /// Log output format (pretty or json); logs go to stderr
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    /// Directory for cached analyses (overrides DEBATE_CACHE_DIR)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full debate for a ticker
    Analyze {
        ticker: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Sse)]
        format: OutputFormat,
    },
    /// Price history for a period and interval
    Chart {
        ticker: String,

        #[arg(long, default_value = "1mo")]
        period: String,

        #[arg(long, default_value = "1d")]
        interval: String,
    },
    /// Quote card with a one-month chart
    QuickStats { ticker: String },
    /// Ticker suggestions for a free-text query
    Search { query: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// `data: <json>` frames, one per event
    Sse,
    /// Final result as pretty-printed JSON
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    debate_utils::init_tracing(args.log_format);

    let mut config = DebateConfig::from_env()?;
    if let Some(dir) = args.cache_dir {
        config.cache_dir = Some(dir);
    }
    debug!(backend = ?config.backend, model = %config.model, "Configuration loaded");

    let market = Arc::new(YahooFinanceClient::new()?);

    match args.command {
        Command::Analyze { ticker, format } => analyze(config, market, &ticker, format).await,
        Command::Chart {
            ticker,
            period,
            interval,
        } => {
            let points = debate_stock::history_chart(market.as_ref(), &ticker, &period, &interval).await?;
            println!("{}", serde_json::to_string_pretty(&points)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::QuickStats { ticker } => {
            let stats = debate_stock::quick_stats(market.as_ref(), &ticker).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Search { query } => {
            let suggestions = debate_stock::search_tickers(market.as_ref(), &query).await;
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn analyze(
    config: DebateConfig,
    market: Arc<YahooFinanceClient>,
    ticker: &str,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    // Without a credential no provider can be built; report it like any other failed run
    if let Err(e) = config.validate() {
        let event = AnalysisEvent::error(e.to_string());
        match format {
            OutputFormat::Sse => print!("{}", event.to_sse()?),
            OutputFormat::Json => eprintln!("Error: {e}"),
        }
        return Ok(ExitCode::FAILURE);
    }

    let llm = build_provider(&config)?;
    let cache = build_cache(&config);
    info!(ticker, backend = ?config.backend, "Starting analysis");
    let orchestrator = DebateOrchestrator::new(config, market, llm, cache)?;

    match format {
        OutputFormat::Json => {
            let result = orchestrator.run_analysis(ticker).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::SUCCESS)
        }
        OutputFormat::Sse => {
            let mut stdout = std::io::stdout().lock();
            let mut failed = false;
            let mut events = orchestrator.analyze(ticker);
            while let Some(event) = events.next().await {
                failed |= matches!(event, AnalysisEvent::Error { .. });
                write!(stdout, "{}", event.to_sse()?)?;
                stdout.flush()?;
            }
            Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
        }
    }
}

fn build_provider(config: &DebateConfig) -> anyhow::Result<Arc<dyn LLMProvider>> {
    let api_key = config.api_key.clone().unwrap_or_default();
    let timeout = config.request_timeout.as_secs();

    let provider: Arc<dyn LLMProvider> = match config.backend {
        LlmBackend::Gemini => {
            let mut gemini = GeminiConfig::new(api_key).with_timeout(timeout);
            if let Some(base) = &config.api_base {
                gemini = gemini.with_api_base(base);
            }
            Arc::new(GeminiProvider::with_config(gemini).context("failed to create Gemini provider")?)
        }
        LlmBackend::OpenAi => {
            let mut openai = OpenAIConfig::new(api_key).with_timeout(timeout);
            if let Some(base) = &config.api_base {
                openai = openai.with_api_base(base);
            }
            Arc::new(OpenAIProvider::with_config(openai).context("failed to create OpenAI provider")?)
        }
    };
    Ok(provider)
}

fn build_cache(config: &DebateConfig) -> Arc<dyn ResultCache> {
    match &config.cache_dir {
        Some(dir) => Arc::new(FileResultCache::new(dir, config.cache_ttl)),
        None => Arc::new(MemoryResultCache::new(config.cache_ttl)),
    }
}
