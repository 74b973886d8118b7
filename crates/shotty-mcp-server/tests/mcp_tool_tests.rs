//! Tool-level tests for the MCP server over mock backends

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use rmcp::{handler::server::wrapper::Parameters, model::ErrorCode};
use shotty_core::{
    capture::{CaptureOrchestrator, MockAdapter},
    model::{OutputMode, WindowSummary},
    util::store::ScreenshotStore,
};
use shotty_mcp_server::mcp::{CaptureArea, CaptureScreenshotParams, ShottyMcpServer};
use tempfile::TempDir;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

fn mock_server(mode: OutputMode) -> (TempDir, ShottyMcpServer) {
    let dir = tempfile::tempdir().unwrap();
    let server = ShottyMcpServer::new_with_mock(dir.path(), mode).unwrap();
    (dir, server)
}

fn window(id: &str) -> Parameters<CaptureScreenshotParams> {
    Parameters(CaptureScreenshotParams {
        window_id: Some(id.to_string()),
        ..Default::default()
    })
}

#[tokio::test]
async fn test_list_windows_returns_summaries() {
    let (_dir, server) = mock_server(OutputMode::Inline);

    let result = server.list_windows().await.unwrap();
    let text = &result.content[0].as_text().unwrap().text;
    let windows: Vec<WindowSummary> = serde_json::from_str(text).unwrap();

    let ids: Vec<_> = windows.iter().map(|w| w.id.as_str()).collect();
    assert_eq!(ids, vec!["1001", "1002"]);
    assert_eq!(windows[0].title, "Editor");
}

#[tokio::test]
async fn test_full_screen_inline_capture() {
    let (dir, server) = mock_server(OutputMode::Inline);

    let result = server
        .capture_screenshot(Parameters(CaptureScreenshotParams::default()))
        .await
        .unwrap();

    assert_eq!(result.content.len(), 2);
    let image = result.content[0].as_image().unwrap();
    assert_eq!(image.mime_type, "image/png");
    let bytes = STANDARD.decode(&image.data).unwrap();
    assert!(bytes.starts_with(PNG_MAGIC));

    let metadata = &result.content[1].as_text().unwrap().text;
    assert!(metadata.contains(r#""backend_used": "cli""#), "{}", metadata);
    assert!(!metadata.contains("file_path"));

    // The stored copy lives under the screenshot dir
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_window_capture_reports_activation_path() {
    let (_dir, server) = mock_server(OutputMode::Inline);

    let result = server.capture_screenshot(window("1001")).await.unwrap();

    let metadata = &result.content[1].as_text().unwrap().text;
    assert!(metadata.contains("cli-via-extension-activation"), "{}", metadata);
}

#[tokio::test]
async fn test_path_mode_returns_reference_only() {
    let (_dir, server) = mock_server(OutputMode::Path);

    let result = server.capture_screenshot(window("1002")).await.unwrap();

    assert!(result.content[0].as_image().is_none());
    let reference = &result.content[0].as_text().unwrap().text;
    assert!(reference.contains("file://"));
    assert!(reference.contains("screenshot_window_1002_"));

    let metadata = &result.content[1].as_text().unwrap().text;
    assert!(metadata.contains("file_path"));
}

#[tokio::test]
async fn test_unknown_window_is_invalid_params() {
    let (_dir, server) = mock_server(OutputMode::Inline);

    let error = server.capture_screenshot(window("4242")).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::INVALID_PARAMS);
    assert!(error.message.contains("4242"));
    assert!(error.message.contains("list_windows"));
}

#[tokio::test]
async fn test_area_with_window_is_rejected_before_capture() {
    let (dir, server) = mock_server(OutputMode::Inline);

    let params = CaptureScreenshotParams {
        window_id: Some("1001".to_string()),
        area: Some(CaptureArea { x: 0, y: 0, width: 10, height: 10 }),
        ..Default::default()
    };
    let error = server.capture_screenshot(Parameters(params)).await.unwrap_err();

    assert_eq!(error.code, ErrorCode::INVALID_PARAMS);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_exhausted_backends_carry_causes() {
    let dir = tempfile::tempdir().unwrap();
    let store = ScreenshotStore::open(dir.path()).unwrap();
    let adapters: Vec<Arc<dyn shotty_core::capture::DesktopAdapter>> = vec![
        Arc::new(MockAdapter::portal().permission_denied("user cancelled")),
        Arc::new(MockAdapter::extension().with_windows(&[("1", "One")])),
        Arc::new(MockAdapter::cli().unavailable("grim: not found")),
    ];
    let orchestrator = CaptureOrchestrator::new(adapters, store, OutputMode::Inline).unwrap();
    let server = ShottyMcpServer::new(orchestrator);

    let error = server
        .capture_screenshot(Parameters(CaptureScreenshotParams::default()))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::INTERNAL_ERROR);
    assert!(error.message.contains("Hint:"));
    let causes = error.data.unwrap()["causes"].as_array().unwrap().clone();
    assert_eq!(causes.len(), 3);
    assert_eq!(causes[0]["backend"], "portal");
    assert_eq!(causes[0]["permission_denied"], true);
}

#[tokio::test]
async fn test_health_check_points_at_screenshot_dir() {
    let (dir, server) = mock_server(OutputMode::Inline);

    let result = server.health_check().await.unwrap();
    let text = &result.content[0].as_text().unwrap().text;
    let canonical = dir.path().canonicalize().unwrap();
    assert!(text.contains(&*canonical.to_string_lossy()), "{}", text);
}
