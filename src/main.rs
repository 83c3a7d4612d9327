//! DEALSCAN: picks the best-described, clearly priced deals.
//!
//! Entry point. Loads `.env` and configuration, initialises structured
//! logging, runs exactly one scan over the configured deal source, and
//! prints the resulting selection to stdout (nothing if there was no input).

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use dealscan::config::AppConfig;
use dealscan::engine::scanner::DealScanner;
use dealscan::llm::openai::OpenAiClient;
use dealscan::sources;

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let cfg = AppConfig::load_or_default(CONFIG_PATH)?;

    let client = OpenAiClient::from_config(&cfg.llm)?;
    info!(
        provider = ?cfg.llm.provider,
        model = %client.model_name(),
        "Model client ready"
    );
    let client = Arc::new(client);

    let source = sources::from_config(&cfg.source)?;
    let scanner = DealScanner::new(client.clone());

    let selection = scanner.scan_source(source.as_ref()).await?;
    info!(calls = client.total_calls(), tokens = client.total_tokens(), "Model usage");

    if let Some(selection) = selection {
        println!("{selection}");
    }

    Ok(())
}

/// Initialise the `tracing` subscriber. Logs go to stderr so stdout only
/// carries the selection.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dealscan=info"));

    let json_logging = std::env::var("DEALSCAN_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
