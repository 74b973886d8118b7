//! shotty: command-line front end for the capture orchestrator
//!
//! Lists windows and captures screenshots through the same backend
//! fallback logic the MCP server uses, without the protocol overhead.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shotty_core::{
    capture::{CaptureOrchestrator, mock_adapters},
    config::Config,
    error::CaptureError,
    model::{CapturePayload, CaptureRequest, CaptureTarget, OutputMode, WindowSummary},
    util::{detect::detect_platform, store::ScreenshotStore},
};

#[derive(Parser)]
#[command(name = "shotty")]
#[command(about = "Capture desktop screenshots through portal, compositor and CLI backends")]
struct Cli {
    /// Use synthetic backends instead of the desktop session
    #[arg(long, global = true)]
    mock: bool,

    /// Override the screenshot directory
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List windows from the first backend that can enumerate them
    ListWindows {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Capture the full screen, or one window with --window-id
    Capture {
        /// Window id from list-windows
        #[arg(long)]
        window_id: Option<String>,
        /// Include the pointer
        #[arg(long)]
        cursor: bool,
        /// Also copy the image to this path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Show platform detection and configured backends
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shotty_cli=info".parse()?)
                .add_directive("shotty_core=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(dir) = cli.dir {
        config.screenshot_dir = dir;
    }
    // The CLI always reports a file path
    config.output_mode = OutputMode::Path;

    let orchestrator = build_orchestrator(&config, cli.mock)?;

    match cli.command {
        Commands::ListWindows { json } => list_windows(&orchestrator, json).await,
        Commands::Capture {
            window_id,
            cursor,
            out,
        } => capture(&orchestrator, window_id, cursor, out.as_deref()).await,
        Commands::Health => health(&orchestrator),
    }
}

fn build_orchestrator(config: &Config, mock: bool) -> Result<CaptureOrchestrator> {
    let orchestrator = if mock {
        let store = ScreenshotStore::open(&config.screenshot_dir)?;
        CaptureOrchestrator::new(mock_adapters(), store, config.output_mode)?
    } else {
        CaptureOrchestrator::from_config(config)?
    };
    Ok(orchestrator)
}

fn explain(error: CaptureError) -> anyhow::Error {
    let mut message = error.to_string();
    for cause in error.causes() {
        message.push_str(&format!("\n  - {}", cause));
    }
    message.push_str(&format!("\n\nHint: {}", error.remediation_hint()));
    anyhow::anyhow!(message)
}

async fn list_windows(orchestrator: &CaptureOrchestrator, json: bool) -> Result<()> {
    let windows = orchestrator.list_windows().await.map_err(explain)?;

    if json {
        let summaries: Vec<WindowSummary> = windows.iter().map(WindowSummary::from).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    let source = windows
        .first()
        .map(|w| w.source_backend.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!("Found {} windows (via {}):\n", windows.len(), source);
    for window in windows {
        println!("  {:>12}  {}", window.id, window.title);
    }

    Ok(())
}

async fn capture(
    orchestrator: &CaptureOrchestrator,
    window_id: Option<String>,
    cursor: bool,
    out: Option<&Path>,
) -> Result<()> {
    let request = CaptureRequest {
        target:         CaptureTarget::from_window_id(window_id),
        include_cursor: cursor,
        area:           None,
    };

    let result = orchestrator.capture(request).await.map_err(explain)?;

    let stored = match &result.payload {
        CapturePayload::Stored(path) => path.clone(),
        CapturePayload::Inline(_) => anyhow::bail!("expected a stored capture in path mode"),
    };

    println!("Backend: {}", result.backend_used);
    println!("Saved:   {}", stored.display());

    if let Some(out) = out {
        std::fs::copy(&stored, out)
            .with_context(|| format!("copying {} to {}", stored.display(), out.display()))?;
        println!("Copied:  {}", out.display());
    }

    Ok(())
}

fn health(orchestrator: &CaptureOrchestrator) -> Result<()> {
    let platform = detect_platform();
    println!("Platform:       {}", platform.os);
    println!("Display:        {}", platform.display.as_str());
    println!("Desktop:        {}", platform.desktop.as_deref().unwrap_or("-"));
    println!("Screenshot dir: {}", orchestrator.screenshot_dir().display());
    println!();
    println!("Backends (highest priority first):");
    for adapter in orchestrator.adapters() {
        let operations: Vec<String> = adapter.operations.iter().map(ToString::to_string).collect();
        println!("  {}. {:<10} {}", adapter.priority, adapter.name, operations.join(", "));
    }
    Ok(())
}
