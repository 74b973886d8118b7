//! Integration tests for capture-strategy resolution
//!
//! Drives the orchestrator end to end with mock adapters standing in for
//! the portal, the compositor extension and the screenshot tools.

mod common;

use std::{collections::HashSet, sync::Arc, time::Duration};

use shotty_core::{
    capture::{
        MockAdapter,
        mock::{MockCall, MockOutput},
    },
    error::CaptureError,
    model::{BackendCapability, BackendKind, CaptureRequest, Geometry, OutputMode},
};

use crate::common::{Harness, orchestrator_over};

fn lister(kind: BackendKind, ids: &[(&str, &str)], available: bool) -> MockAdapter {
    let capability = BackendCapability {
        list:           true,
        capture_full:   false,
        capture_window: false,
        activate:       false,
        native_region:  false,
        priority:       kind.priority(),
    };
    let mock = MockAdapter::new(kind).with_capability(capability).with_windows(ids);
    if available { mock } else { mock.unavailable("not running") }
}

// ============================================================================
// Window listing
// ============================================================================

#[tokio::test]
async fn test_listing_comes_from_highest_priority_available_adapter() {
    let sets: [&[(&str, &str)]; 3] = [
        &[("p1", "Portal window")],
        &[("e1", "Editor"), ("e2", "Terminal")],
        &[("c1", "Cli window")],
    ];
    let kinds = [BackendKind::Portal, BackendKind::Extension, BackendKind::Cli];

    for mask in 0u8..8 {
        let available: Vec<bool> = (0..3).map(|i| mask & (1 << i) != 0).collect();
        let tmp = tempfile::tempdir().unwrap();
        let adapters = (0..3)
            .map(|i| Arc::new(lister(kinds[i], sets[i], available[i])))
            .collect();
        let orch = orchestrator_over(tmp.path(), adapters, OutputMode::Inline);

        match available.iter().position(|a| *a) {
            Some(winner) => {
                let ids: Vec<String> = orch.list_windows().await.unwrap().into_iter().map(|w| w.id).collect();
                let expected: Vec<String> = sets[winner].iter().map(|(id, _)| id.to_string()).collect();
                assert_eq!(ids, expected, "availability {:?}", available);
            }
            None => {
                let err = orch.list_windows().await.unwrap_err();
                assert!(matches!(err, CaptureError::NoWindowSourceAvailable { .. }));
                assert_eq!(err.causes().len(), 3);
            }
        }
    }
}

#[tokio::test]
async fn test_listing_is_idempotent() {
    let h = Harness::editor_and_terminal();

    let first: HashSet<String> = h.orchestrator.list_windows().await.unwrap().into_iter().map(|w| w.id).collect();
    let second: HashSet<String> = h.orchestrator.list_windows().await.unwrap().into_iter().map(|w| w.id).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn test_listing_has_no_side_effects() {
    let h = Harness::editor_and_terminal();
    h.orchestrator.list_windows().await.unwrap();

    assert!(h.extension.activations().is_empty());
    assert_eq!(h.cli.capture_count(), 0);
    assert_eq!(h.stored_files(), 0);
}

// ============================================================================
// Full-screen capture
// ============================================================================

#[tokio::test]
async fn test_full_screen_never_touches_windows() {
    let h = Harness::editor_and_terminal();

    let result = h.orchestrator.capture(CaptureRequest::full_screen().with_cursor(true)).await.unwrap();
    assert_eq!(result.backend_used, "cli");
    assert!(h.extension.calls().is_empty());
    assert_eq!(h.cli.calls(), vec![MockCall::CaptureFull { region: None }]);
}

#[tokio::test]
async fn test_full_screen_prefers_portal() {
    let h = Harness::new(MockAdapter::portal(), MockAdapter::extension(), MockAdapter::cli());

    let result = h.orchestrator.capture(CaptureRequest::full_screen()).await.unwrap();
    assert_eq!(result.backend_used, "portal");
    assert_eq!(result.mime_type, "image/png");
    assert_eq!(h.cli.capture_count(), 0);
    assert_eq!(h.stored_files(), 1);
}

#[tokio::test]
async fn test_permission_denied_falls_back_to_cli() {
    let h = Harness::new(
        MockAdapter::portal().permission_denied("Response: Cancelled"),
        MockAdapter::extension(),
        MockAdapter::cli(),
    );

    let result = h.orchestrator.capture(CaptureRequest::full_screen()).await.unwrap();
    assert_eq!(result.backend_used, "cli");
    assert_eq!(h.portal.capture_count(), 1);
}

#[tokio::test]
async fn test_garbage_output_falls_back_to_cli() {
    let h = Harness::new(
        MockAdapter::portal().with_output(MockOutput::Data(b"GIF89a-but-not-really".to_vec())),
        MockAdapter::extension(),
        MockAdapter::cli(),
    );

    let result = h.orchestrator.capture(CaptureRequest::full_screen()).await.unwrap();
    assert_eq!(result.backend_used, "cli");
    assert_eq!(h.portal.capture_count(), 1);
    assert!(image::load_from_memory(result.image_bytes().unwrap()).is_ok());
}

#[tokio::test]
async fn test_garbage_output_with_area_falls_back_to_cli() {
    let h = Harness::new(
        MockAdapter::portal().with_output(MockOutput::Data(b"not an image".to_vec())),
        MockAdapter::extension(),
        MockAdapter::cli(),
    );

    let request = CaptureRequest::full_screen().with_area(Geometry::new(0, 0, 16, 12));
    let result = h.orchestrator.capture(request).await.unwrap();

    assert_eq!(result.backend_used, "cli");
    let img = image::load_from_memory(result.image_bytes().unwrap()).unwrap();
    assert_eq!((img.width(), img.height()), (16, 12));
}

#[tokio::test]
async fn test_garbage_direct_window_capture_falls_back_to_activation() {
    let h = Harness::new(
        MockAdapter::portal()
            .with_window_capture()
            .with_output(MockOutput::Data(vec![0xFF; 32])),
        MockAdapter::extension().with_windows(&[("101", "Editor")]),
        MockAdapter::cli(),
    );

    let result = h.orchestrator.capture(CaptureRequest::window("101")).await.unwrap();
    assert_eq!(result.backend_used, "cli-via-extension-activation");
}

#[tokio::test]
async fn test_all_adapters_unavailable_reports_three_causes() {
    let h = Harness::new(
        MockAdapter::portal().permission_denied("Response: Cancelled"),
        MockAdapter::extension().unavailable("extension not installed"),
        MockAdapter::cli().unavailable("grim: not found; gnome-screenshot: not found"),
    );

    let err = h.orchestrator.capture(CaptureRequest::full_screen()).await.unwrap_err();
    assert!(matches!(err, CaptureError::CaptureUnavailable { .. }));

    let causes = err.causes();
    assert_eq!(causes.len(), 3);
    let backends: Vec<BackendKind> = causes.iter().map(|c| c.backend).collect();
    assert_eq!(backends, vec![BackendKind::Portal, BackendKind::Extension, BackendKind::Cli]);
    assert!(causes[0].permission_denied);

    let msg = err.to_string();
    assert!(msg.contains("portal: Response: Cancelled (permission denied)"), "{}", msg);
    assert!(msg.contains("cli: grim: not found"), "{}", msg);
    assert!(err.remediation_hint().contains("consent"));
}

// ============================================================================
// Window capture
// ============================================================================

#[tokio::test]
async fn test_end_to_end_window_capture_through_cli() {
    let h = Harness::editor_and_terminal();

    let windows = h.orchestrator.list_windows().await.unwrap();
    let titles: Vec<&str> = windows.iter().map(|w| w.title.as_str()).collect();
    assert_eq!(titles, vec!["Editor", "Terminal"]);
    assert!(windows.iter().all(|w| w.source_backend == BackendKind::Extension));

    let editor = windows.iter().find(|w| w.title == "Editor").unwrap();
    let result = h.orchestrator.capture(CaptureRequest::window(editor.id.clone())).await.unwrap();

    assert_eq!(result.backend_used, "cli-via-extension-activation");
    assert!(result.image_bytes().is_some());
    assert_eq!(h.extension.activations(), vec!["101".to_string(), "102".to_string()]);
    assert_eq!(h.extension.focused(), Some("102".to_string()));
    assert_eq!(h.cli.capture_count(), 1);
    assert_eq!(h.portal.capture_count(), 1);
}

#[tokio::test]
async fn test_activation_happens_before_capture_and_restore_after() {
    let h = Harness::editor_and_terminal();
    h.orchestrator.capture(CaptureRequest::window("101")).await.unwrap();

    let calls = h.extension.calls();
    let activate = calls.iter().position(|c| *c == MockCall::Activate("101".into())).unwrap();
    let restore = calls.iter().rposition(|c| *c == MockCall::Activate("102".into())).unwrap();
    assert!(activate < restore);
    assert!(calls[..activate].contains(&MockCall::ActiveWindow));
}

#[tokio::test]
async fn test_focus_restored_once_when_capture_fails() {
    let h = Harness::new(
        MockAdapter::portal().unavailable("no portal"),
        MockAdapter::extension()
            .with_windows(&[("101", "Editor"), ("102", "Terminal")])
            .with_focused("102"),
        MockAdapter::cli().unavailable("grim: not found"),
    );

    let err = h.orchestrator.capture(CaptureRequest::window("101")).await.unwrap_err();
    assert!(matches!(err, CaptureError::CaptureUnavailable { .. }));
    assert_eq!(err.causes().len(), 3);
    assert_eq!(h.extension.activations(), vec!["101".to_string(), "102".to_string()]);
    assert_eq!(h.stored_files(), 0);
}

#[tokio::test]
async fn test_no_restore_when_target_already_focused() {
    let h = Harness::new(
        MockAdapter::portal().unavailable("no portal"),
        MockAdapter::extension().with_windows(&[("101", "Editor")]).with_focused("101"),
        MockAdapter::cli(),
    );

    h.orchestrator.capture(CaptureRequest::window("101")).await.unwrap();
    assert_eq!(h.extension.activations(), vec!["101".to_string()]);
}

#[tokio::test]
async fn test_unknown_window_id() {
    let h = Harness::editor_and_terminal();

    let err = h.orchestrator.capture(CaptureRequest::window("999")).await.unwrap_err();
    assert!(matches!(
        err,
        CaptureError::WindowNotFound { ref window_id, listed_by: BackendKind::Extension } if window_id == "999"
    ));
    assert!(h.extension.activations().is_empty());
    assert_eq!(h.cli.capture_count(), 0);
}

#[tokio::test]
async fn test_window_capture_without_window_source() {
    let h = Harness::new(
        MockAdapter::portal(),
        MockAdapter::extension().unavailable("extension not installed"),
        MockAdapter::cli(),
    );

    let err = h.orchestrator.capture(CaptureRequest::window("101")).await.unwrap_err();
    assert!(matches!(err, CaptureError::NoWindowSourceAvailable { .. }));
    assert_eq!(h.portal.capture_count(), 0);
}

#[tokio::test]
async fn test_process_listed_window_is_captured_unfocused() {
    let dir = tempfile::tempdir().unwrap();
    let extension = Arc::new(MockAdapter::extension().unavailable("extension not installed"));
    let processes = Arc::new(
        MockAdapter::processes().with_windows(&[("firefox-4182", "Firefox"), ("code-6100", "Code")]),
    );
    let cli = Arc::new(MockAdapter::cli());
    let orch = orchestrator_over(dir.path(), vec![extension.clone(), processes, cli], OutputMode::Inline);

    let windows = orch.list_windows().await.unwrap();
    assert!(windows.iter().all(|w| w.source_backend == BackendKind::Processes));

    let result = orch.capture(CaptureRequest::window("code-6100")).await.unwrap();
    assert_eq!(result.backend_used, "cli-unfocused");
}

#[tokio::test]
async fn test_window_ids_are_re_resolved_every_call() {
    let h = Harness::editor_and_terminal();
    h.orchestrator.capture(CaptureRequest::window("101")).await.unwrap();
    h.orchestrator.capture(CaptureRequest::window("102")).await.unwrap();

    let lists = h.extension.calls().iter().filter(|c| **c == MockCall::List).count();
    assert_eq!(lists, 2);
}

// ============================================================================
// Cancellation and concurrency
// ============================================================================

#[tokio::test]
async fn test_cancelled_request_still_restores_focus() {
    let h = Harness::new(
        MockAdapter::portal().unavailable("no portal"),
        MockAdapter::extension()
            .with_windows(&[("101", "Editor"), ("102", "Terminal")])
            .with_focused("102"),
        MockAdapter::cli().with_delay(Duration::from_millis(200)),
    );

    let cancelled = tokio::time::timeout(
        Duration::from_millis(50),
        h.orchestrator.capture(CaptureRequest::window("101")),
    )
    .await;
    assert!(cancelled.is_err(), "capture should still be running");

    // The detached capture finishes on its own and restores focus
    let mut restored = false;
    for _ in 0..50 {
        if h.extension.activations().len() == 2 {
            restored = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(restored, "focus was not restored: {:?}", h.extension.calls());
    assert_eq!(h.extension.focused(), Some("102".to_string()));
}

#[tokio::test]
async fn test_concurrent_window_captures_do_not_interleave() {
    let h = Harness::new(
        MockAdapter::portal().unavailable("no portal"),
        MockAdapter::extension()
            .with_windows(&[("101", "Editor"), ("102", "Terminal"), ("103", "Browser")])
            .with_focused("103"),
        MockAdapter::cli().with_delay(Duration::from_millis(20)),
    );

    let (a, b) = tokio::join!(
        h.orchestrator.capture(CaptureRequest::window("101")),
        h.orchestrator.capture(CaptureRequest::window("102")),
    );
    a.unwrap();
    b.unwrap();

    // Each capture is an activate/restore pair, never split by the other
    let activations = h.extension.activations();
    assert_eq!(activations.len(), 4);
    assert_eq!(activations[1], "103");
    assert_eq!(activations[3], "103");
    assert_eq!(h.extension.focused(), Some("103".to_string()));
}

// ============================================================================
// Output modes
// ============================================================================

#[tokio::test]
async fn test_path_mode_returns_stored_file() {
    let h = Harness::with_mode(
        MockAdapter::portal(),
        MockAdapter::extension(),
        MockAdapter::cli(),
        OutputMode::Path,
    );

    let result = h.orchestrator.capture(CaptureRequest::full_screen()).await.unwrap();
    assert!(result.image_bytes().is_none());
    let path = result.file_path().unwrap();
    assert!(path.starts_with(h.root()));
    assert!(path.exists());
    assert!(path.file_name().unwrap().to_string_lossy().starts_with("screenshot_full_"));
}

#[tokio::test]
async fn test_window_capture_file_name_carries_window_id() {
    let h = Harness::with_mode(
        MockAdapter::portal().unavailable("no portal"),
        MockAdapter::extension().with_windows(&[("101", "Editor")]),
        MockAdapter::cli(),
        OutputMode::Path,
    );

    let result = h.orchestrator.capture(CaptureRequest::window("101")).await.unwrap();
    let name = result.file_path().unwrap().file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("screenshot_window_101_"), "{}", name);
}
