//! `fetch-reports` command-line entry point.
//!
//! Runs one batch and prints a summary, or with `--serve` starts the REST API.

use clap::{ArgAction, Parser};
use filing_dl::{BatchReport, Config, JobTracker, Pipeline, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "fetch-reports",
    version,
    about = "Fetch the latest annual filings from SEC EDGAR and convert them to PDF"
)]
struct Cli {
    /// Comma-separated ticker symbols.
    #[arg(long, value_delimiter = ',', default_value = "AAPL,META,GOOGL,AMZN,NFLX,GS")]
    tickers: Vec<String>,

    /// Directory for the generated PDFs [default: ./output_pdfs].
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the wkhtmltopdf binary (otherwise searched on PATH).
    #[arg(long)]
    renderer: Option<PathBuf>,

    /// Delay before every registry request, in milliseconds [default: 100].
    #[arg(long)]
    request_delay_ms: Option<u64>,

    /// Identification sent to the registry, e.g. "Example Corp ops@example.com".
    #[arg(long, env = "FILING_DL_USER_AGENT")]
    user_agent: Option<String>,

    /// Start the REST API instead of running a single batch.
    #[arg(long)]
    serve: bool,

    /// Address the REST API binds to [default: 127.0.0.1:8000].
    #[arg(long, requires = "serve")]
    bind: Option<SocketAddr>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Config file (or defaults) with command-line overrides applied
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    if let Some(user_agent) = &cli.user_agent {
        config.registry.user_agent = user_agent.clone();
    }
    if let Some(ms) = cli.request_delay_ms {
        config.registry.request_delay = Duration::from_millis(ms);
    }
    if let Some(renderer) = &cli.renderer {
        config.tools.renderer_path = Some(renderer.clone());
    }
    if let Some(output_dir) = &cli.output_dir {
        config.output.output_dir = output_dir.clone();
    }
    if let Some(bind) = cli.bind {
        config.api.bind_address = bind;
    }

    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;

    if cli.serve {
        let tracker = JobTracker::from_config(&config)?;
        filing_dl::api::start_api_server(tracker, Arc::new(config)).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let pipeline = Pipeline::from_config(&config)?;
    let report = pipeline
        .run_tickers(&cli.tickers, &config.output.output_dir)
        .await?;

    print_summary(&report);

    Ok(if report.results.is_empty() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_summary(report: &BatchReport) {
    let rule = "=".repeat(60);
    println!("\n{rule}\nProcessing Summary\n{rule}");

    for result in &report.results {
        println!(
            "✓ {}: {}",
            result.company.identifier,
            result.artifact_path.display()
        );
    }
    for failure in &report.failures {
        println!("✗ {} ({}): {}", failure.ticker, failure.stage, failure.reason);
    }
    if !report.unknown.is_empty() {
        println!("\n? unknown ticker(s): {}", report.unknown.join(", "));
    }

    let failed = report.failures.len() + report.unknown.len();
    if failed > 0 {
        println!("\n⚠ {failed} ticker(s) failed to process");
    }
    println!("\n✅ {} ticker(s) successfully processed", report.results.len());
}
