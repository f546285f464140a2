// crates/cli/src/main.rs
//! Threatflow CLI binary.
//!
//! Submits an analysis request, streams stage progress to stderr while the
//! backend pipeline runs, and prints the finished report to stdout. Ctrl-C
//! cancels the in-flight stream without treating the run as failed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use threatflow_client::{run_analysis, ApiClient, Error, RunOutcome, RunRequest, Runner};
use tracing_subscriber::EnvFilter;

mod display;

use display::{board_summary, render_document, RunDisplay};

/// Streaming client for the five-stage threat-modeling pipeline.
#[derive(Parser, Debug)]
#[command(name = "threatflow")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true, default_value = "http://localhost:8000")]
    server: String,

    /// Increase log verbosity (-v: info, -vv: debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an analysis and stream stage progress
    Run {
        /// What to analyze, in natural language
        message: String,

        /// Attach an architecture diagram (png, jpg, gif, webp, svg); repeatable
        #[arg(long = "attach", value_name = "PATH")]
        attachments: Vec<PathBuf>,

        /// User id sent with the request
        #[arg(long, default_value = "cli_user")]
        user: String,

        /// Also write the raw report markdown to this file
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,

        /// Download the generated PDF after the run completes
        #[arg(long)]
        save_pdf: bool,

        /// Disable speculative next-stage activation
        #[arg(long)]
        no_lookahead: bool,

        /// Disable ANSI styling in the rendered output
        #[arg(long)]
        plain: bool,
    },

    /// Download the most recently generated report document
    Report {
        /// Output path; defaults to the server-side filename
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Check backend reachability
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let client = ApiClient::new(&cli.server)?;
    match cli.command {
        Command::Run {
            message,
            attachments,
            user,
            out,
            save_pdf,
            no_lookahead,
            plain,
        } => {
            let mut request = RunRequest::new(user, message);
            request.attachments = attachments;
            request.lookahead = !no_lookahead;
            cmd_run(&client, request, out.as_deref(), save_pdf, !plain).await
        }
        Command::Report { out } => cmd_report(&client, out).await,
        Command::Health => cmd_health(&client).await,
    }
}

/// Logs go to stderr so stdout stays reserved for the report.
fn init_tracing(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "warn",
        1 => "warn,threatflow_core=info,threatflow_client=info,threatflow_cli=info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn cmd_run(
    client: &ApiClient,
    request: RunRequest,
    out: Option<&Path>,
    save_pdf: bool,
    color: bool,
) -> Result<()> {
    let mut runner = Runner::new();
    let cancel = runner.begin();

    // Ctrl-C aborts the stream through the same token as any other cancel.
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    let mut display = RunDisplay::new();
    let result = run_analysis(client, &request, cancel, |update| display.apply(&update)).await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) if err.is_cancelled() => {
            // Cancellation is a user action, not a failure. The partial
            // board shows where the pipeline stopped.
            let stages = display.snapshot();
            display.halt();
            eprintln!("\n{}", board_summary(&stages, color));
            eprintln!("  Run cancelled.");
            return Ok(());
        }
        Err(err) => {
            let stages = display.snapshot();
            display.halt();
            eprintln!("\n{}", board_summary(&stages, color));
            return Err(err.into());
        }
    };
    display.finish();

    eprintln!("\n{}", board_summary(&outcome.stages(), color));
    if let Some(path) = &outcome.artifact_path {
        eprintln!("  Generated document: {path}");
    }
    if outcome.report_markdown.trim().is_empty() {
        eprintln!("  The stream carried no report text.");
    } else {
        println!("{}", render_document(&outcome.report, color));
    }

    if let Some(path) = out {
        std::fs::write(path, &outcome.report_markdown)
            .with_context(|| format!("writing report to {}", path.display()))?;
        eprintln!("  \u{2713} Report markdown saved to {}", path.display());
    }
    if save_pdf {
        save_generated_document(client, &outcome).await?;
    }
    Ok(())
}

/// Fetch the generated PDF for a finished run. When no document can be
/// named, fall back to exporting the accumulated markdown instead of
/// failing.
async fn save_generated_document(client: &ApiClient, outcome: &RunOutcome) -> Result<()> {
    match report_filename(client, outcome).await? {
        Some(filename) => {
            let bytes = client.download_report(&filename).await?;
            let path = output_dir().join(&filename);
            std::fs::write(&path, &bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!("  \u{2713} PDF saved to {} ({} bytes)", path.display(), bytes.len());
        }
        None => {
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            let path = output_dir().join(format!("report_{timestamp}.md"));
            std::fs::write(&path, &outcome.report_markdown)
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!(
                "  No PDF generated yet; raw report exported to {}",
                path.display()
            );
        }
    }
    Ok(())
}

/// Which document to download: the run's own artifact pointer names the
/// exact file, so it wins over the server-wide latest lookup, which can
/// name another run's report when runs overlap.
async fn report_filename(client: &ApiClient, outcome: &RunOutcome) -> Result<Option<String>> {
    if let Some(name) = outcome.artifact_path.as_deref().and_then(document_basename) {
        return Ok(Some(name.to_string()));
    }
    Ok(client.latest_report().await?.map(|latest| latest.filename))
}

/// Filename component of a server-side document path.
fn document_basename(path: &str) -> Option<&str> {
    Path::new(path).file_name().and_then(|name| name.to_str())
}

async fn cmd_report(client: &ApiClient, out: Option<PathBuf>) -> Result<()> {
    match client.latest_report().await? {
        Some(latest) => {
            let bytes = client.download_report(&latest.filename).await?;
            let path = out.unwrap_or_else(|| output_dir().join(&latest.filename));
            std::fs::write(&path, &bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!("  \u{2713} Saved {} ({} bytes)", path.display(), bytes.len());
        }
        None => eprintln!("No report has been generated yet."),
    }
    Ok(())
}

async fn cmd_health(client: &ApiClient) -> Result<()> {
    match client.health().await {
        Ok(health) => {
            println!("backend:      {} ({})", client.base_url(), health.status);
            if let Some(url) = health.orchestrator_url {
                println!("orchestrator: {url}");
            }
            Ok(())
        }
        Err(Error::Http(err)) => {
            eprintln!("  \u{2717} Backend unreachable at {}", client.base_url());
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

/// Where downloaded documents land: the user's download directory when one
/// exists, the working directory otherwise.
fn output_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}
