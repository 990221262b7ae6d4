//! HTTP server for slide-deck inconsistency analysis.

mod routes;

use anyhow::{Context, Result};
use clap::Parser;
use deckcheck_core::ReportStore;
use deckcheck_gemini::{GeminiConfig, DEFAULT_API_BASE, DEFAULT_MODEL};
use routes::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Upload a deck, stream analysis progress, download the report.
#[derive(Parser, Debug)]
#[command(name = "deckcheck-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "DECKCHECK_BIND", default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Gemini API base URL
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Timeout of a single model call, in seconds
    #[arg(long, default_value = "120")]
    llm_timeout_secs: u64,

    /// Directory receiving one report per run
    #[arg(long, env = "DECKCHECK_REPORTS_DIR", default_value = "reports")]
    reports_dir: PathBuf,

    /// Directory for temporary run files (default: system temp dir)
    #[arg(long, env = "DECKCHECK_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Largest accepted upload, in megabytes
    #[arg(long, default_value = "100")]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    // Fail before binding if the key is missing.
    let gemini = GeminiConfig::new(args.api_key.as_str())
        .context("Invalid Gemini configuration")?
        .with_model(args.model.as_str())
        .with_api_base(args.api_base.as_str())
        .with_timeout(Duration::from_secs(args.llm_timeout_secs));
    log::info!("Using {:?}", gemini);

    let state = AppState {
        gemini,
        reports: Arc::new(ReportStore::new(args.reports_dir.clone())),
        work_dir: args
            .work_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("deckcheck")),
    };
    let app = routes::router(state, args.max_upload_mb.saturating_mul(1024 * 1024));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;

    log::info!("Server listening on http://{}", args.bind);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
