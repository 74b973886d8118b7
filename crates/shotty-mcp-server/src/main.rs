//! shotty-mcp: screenshot MCP server for Linux desktops
//!
//! Serves MCP over stdio. Pass `--mock` (or set `SHOTTY_MOCK=1`) to run
//! against synthetic backends without a desktop session.

use anyhow::Result;
use rmcp::{ServiceExt, transport::stdio};
use shotty_core::{
    capture::{CaptureOrchestrator, mock_adapters},
    config::Config,
    util::store::ScreenshotStore,
};
use shotty_mcp_server::{logging, mcp::ShottyMcpServer};
use tracing::info;

fn mock_requested() -> bool {
    std::env::args().skip(1).any(|arg| arg == "--mock")
        || matches!(std::env::var("SHOTTY_MOCK").as_deref(), Ok("1") | Ok("true"))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config = Config::from_env();
    let orchestrator = if mock_requested() {
        info!("using mock backends");
        let store = ScreenshotStore::open(&config.screenshot_dir)?;
        CaptureOrchestrator::new(mock_adapters(), store, config.output_mode)?
    } else {
        CaptureOrchestrator::from_config(&config)?
    };

    info!(
        screenshot_dir = %orchestrator.screenshot_dir().display(),
        output_mode = ?config.output_mode,
        "shotty-mcp starting on stdio"
    );

    let server = ShottyMcpServer::new(orchestrator);
    let service = server.serve(stdio()).await?;

    info!("Server info: {:?}", service.peer_info());

    service.waiting().await?;

    info!("shotty-mcp shutting down");
    Ok(())
}
