//! MCP service implementation with tool routing
//!
//! Exposes the capture orchestrator as three tools: `health_check`,
//! `list_windows` and `capture_screenshot`. The handlers only translate
//! parameters and errors; every capture decision lives in `shotty-core`.

use std::path::Path;

use rmcp::{
    ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ErrorData as McpError, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shotty_core::{
    capture::{CaptureOrchestrator, mock_adapters},
    error::{CaptureError, ShotResult},
    model::{
        CapturePayload, CaptureRequest, Geometry, HealthCheckResponse, Operation, OutputMode,
        WindowSummary,
    },
    util::{detect::detect_platform, store::ScreenshotStore},
};
use tracing::{info, warn};

use crate::mcp_content::build_capture_result;

/// Longest window id accepted by `capture_screenshot`
pub const MAX_WINDOW_ID_LEN: usize = 256;

/// Area of the screen to keep, in screen pixels
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema)]
pub struct CaptureArea {
    pub x:      i32,
    pub y:      i32,
    pub width:  u32,
    pub height: u32,
}

impl CaptureArea {
    fn to_geometry(self) -> Geometry {
        Geometry::new(self.x, self.y, self.width, self.height)
    }
}

/// Parameters for the capture_screenshot tool
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptureScreenshotParams {
    /// Window id from `list_windows`. Omit to capture the whole screen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<String>,

    /// Whether to include the pointer in the capture (default: false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_cursor: Option<bool>,

    /// Crop the full-screen capture to this area. Not valid with `windowId`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<CaptureArea>,
}

impl CaptureScreenshotParams {
    /// Validates the raw parameters and builds a core request
    pub fn to_request(&self) -> ShotResult<CaptureRequest> {
        let mut request = match &self.window_id {
            None => CaptureRequest::full_screen(),
            Some(id) => {
                let id = id.trim();
                if id.is_empty() {
                    return Err(invalid("windowId", "must not be empty"));
                }
                if id.len() > MAX_WINDOW_ID_LEN {
                    return Err(invalid(
                        "windowId",
                        &format!("must be at most {} characters", MAX_WINDOW_ID_LEN),
                    ));
                }
                if self.area.is_some() {
                    return Err(invalid("area", "only applies to full-screen captures"));
                }
                CaptureRequest::window(id)
            }
        };

        if let Some(area) = self.area {
            if area.width == 0 || area.height == 0 {
                return Err(invalid("area", "width and height must be greater than zero"));
            }
            request = request.with_area(area.to_geometry());
        }

        Ok(request.with_cursor(self.include_cursor.unwrap_or(false)))
    }
}

fn invalid(parameter: &str, reason: &str) -> CaptureError {
    CaptureError::InvalidParameter {
        parameter: parameter.to_string(),
        reason:    reason.to_string(),
    }
}

/// Converts a CaptureError to an MCP ErrorData
///
/// The message carries the error and its remediation hint; per-backend
/// causes travel in the structured `data` field.
pub fn convert_capture_error_to_mcp(error: CaptureError) -> McpError {
    let message = format!("{}\n\nHint: {}", error, error.remediation_hint());
    let data = if error.causes().is_empty() {
        None
    } else {
        Some(serde_json::json!({ "causes": error.causes() }))
    };

    match error {
        CaptureError::WindowNotFound { .. } | CaptureError::InvalidParameter { .. } => {
            McpError::invalid_params(message, data)
        }
        _ => McpError::internal_error(message, data),
    }
}

/// Screenshot MCP server
///
/// # Tools
///
/// - `health_check`: platform detection and configured backends
/// - `list_windows`: enumerate capturable windows
/// - `capture_screenshot`: capture the screen or one window
#[derive(Clone)]
pub struct ShottyMcpServer {
    /// Note: This field is used by the #[tool_router] macro
    #[allow(dead_code)]
    tool_router:  ToolRouter<Self>,
    orchestrator: CaptureOrchestrator,
}

#[tool_router]
impl ShottyMcpServer {
    /// Creates a server over an orchestrator
    ///
    /// # Examples
    ///
    /// ```
    /// use shotty_core::{
    ///     capture::{CaptureOrchestrator, mock_adapters},
    ///     model::OutputMode,
    ///     util::store::ScreenshotStore,
    /// };
    /// use shotty_mcp_server::mcp::ShottyMcpServer;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = ScreenshotStore::open(dir.path()).unwrap();
    /// let orchestrator =
    ///     CaptureOrchestrator::new(mock_adapters(), store, OutputMode::Inline).unwrap();
    /// let _server = ShottyMcpServer::new(orchestrator);
    /// ```
    pub fn new(orchestrator: CaptureOrchestrator) -> Self {
        Self {
            tool_router: Self::tool_router(),
            orchestrator,
        }
    }

    /// Creates a server over the mock adapter set, storing into `dir`
    pub fn new_with_mock(dir: impl AsRef<Path>, mode: OutputMode) -> ShotResult<Self> {
        let store = ScreenshotStore::open(dir)?;
        let orchestrator = CaptureOrchestrator::new(mock_adapters(), store, mode)?;
        Ok(Self::new(orchestrator))
    }

    /// Underlying orchestrator
    pub fn orchestrator(&self) -> &CaptureOrchestrator {
        &self.orchestrator
    }

    /// Reports platform, screenshot directory and the configured backends
    ///
    /// `ok` is true when at least one backend can capture the full screen.
    #[tool(description = "Check server health, detect the desktop session and list configured capture backends")]
    pub async fn health_check(&self) -> Result<CallToolResult, McpError> {
        let platform = detect_platform();
        let adapters = self.orchestrator.adapters();
        let ok = adapters.iter().any(|a| a.operations.contains(&Operation::CaptureFull));

        let response = HealthCheckResponse {
            platform: platform.os,
            display: platform.display.as_str().to_string(),
            desktop: platform.desktop,
            screenshot_dir: self.orchestrator.screenshot_dir().display().to_string(),
            adapters,
            ok,
        };

        let json_str = serde_json::to_string(&response).map_err(|e| {
            McpError::internal_error(format!("Failed to serialize health check response: {}", e), None)
        })?;

        Ok(CallToolResult::success(vec![Content::text(json_str)]))
    }

    /// Lists windows from the highest-priority backend that can enumerate them
    #[tool(description = "List open windows with their ids and titles. Use an id with capture_screenshot.")]
    pub async fn list_windows(&self) -> Result<CallToolResult, McpError> {
        let windows = self
            .orchestrator
            .list_windows()
            .await
            .map_err(convert_capture_error_to_mcp)?;

        let summaries: Vec<WindowSummary> = windows.iter().map(WindowSummary::from).collect();
        let json_str = serde_json::to_string(&summaries).map_err(|e| {
            McpError::internal_error(format!("Failed to serialize window list: {}", e), None)
        })?;

        Ok(CallToolResult::success(vec![Content::text(json_str)]))
    }

    /// Captures the full screen, or one window when `windowId` is set
    ///
    /// # Examples
    ///
    /// Request:
    /// ```json
    /// {
    ///   "method": "tools/call",
    ///   "params": {
    ///     "name": "capture_screenshot",
    ///     "arguments": { "windowId": "2831474609" }
    ///   }
    /// }
    /// ```
    #[tool(description = "Capture a screenshot of the full screen, or of one window when windowId is given")]
    pub async fn capture_screenshot(
        &self,
        Parameters(params): Parameters<CaptureScreenshotParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.to_request().map_err(convert_capture_error_to_mcp)?;
        info!(?request, "capture_screenshot");

        let result = self
            .orchestrator
            .capture(request)
            .await
            .map_err(convert_capture_error_to_mcp)?;

        let size = match &result.payload {
            CapturePayload::Inline(data) => data.len() as u64,
            CapturePayload::Stored(path) => match tokio::fs::metadata(path).await {
                Ok(meta) => meta.len(),
                Err(e) => {
                    warn!("could not stat {}: {}", path.display(), e);
                    0
                }
            },
        };

        Ok(build_capture_result(&result, size))
    }
}

#[tool_handler]
impl ServerHandler for ShottyMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Screenshot server for Linux desktops. Call list_windows to get window ids, \
                 then capture_screenshot with a windowId, or without one for the full screen."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}
