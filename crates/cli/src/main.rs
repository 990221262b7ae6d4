//! CLI tool for finding inconsistencies between the slides of a deck.

use anyhow::{Context, Result};
use clap::Parser;
use deckcheck_core::{Analysis, ProgressEvent, ReportStore, RunId, RunWorkspace, Upload};
use deckcheck_gemini::{GeminiClient, GeminiConfig, DEFAULT_API_BASE, DEFAULT_MODEL};
use deckcheck_pptx::PptxExtractor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Compare every pair of slides in a deck and report inconsistencies.
#[derive(Parser, Debug)]
#[command(name = "deckcheck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file (.pptx)
    #[arg(required = true)]
    input: PathBuf,

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
    #[arg(short, long, default_value = "reports")]
    reports_dir: PathBuf,

    /// Directory for temporary run files (default: system temp dir)
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Print the report to stdout
    #[arg(short, long)]
    print: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = GeminiConfig::new(args.api_key.as_str())?
        .with_model(args.model.as_str())
        .with_api_base(args.api_base.as_str())
        .with_timeout(Duration::from_secs(args.llm_timeout_secs));
    let client = GeminiClient::new(config)?;

    let work_dir = args
        .work_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("deckcheck"));
    let reports = Arc::new(ReportStore::new(args.reports_dir.clone()));
    let workspace = RunWorkspace::create(&work_dir, RunId::new())
        .with_context(|| format!("Failed to create run directory in {}", work_dir.display()))?;

    let upload = Upload {
        display_name: display_name(&args.input),
        path: args.input.clone(),
    };
    let analysis = Analysis::new(upload, workspace, PptxExtractor::new(), client, reports.clone());
    let run_id = analysis.run_id();

    for event in analysis {
        match event {
            ProgressEvent::Status(message) => eprintln!("{}", message),
            ProgressEvent::FinalReport { content, .. } => {
                if args.print {
                    print!("{}", content);
                }
            }
            ProgressEvent::Failed(cause) => {
                anyhow::bail!("Analysis of {} failed: {}", args.input.display(), cause)
            }
            ProgressEvent::EndOfStream => {}
        }
    }

    if let Some(path) = reports.report_path(run_id) {
        eprintln!("Report written to: {}", path.display());
    }

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}
