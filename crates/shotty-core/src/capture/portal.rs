//! XDG desktop portal adapter (`org.freedesktop.portal.Screenshot`)
//!
//! The portal is the only sanctioned way to grab pixels on a Wayland
//! session. It may block on a consent dialog the first time, so every
//! request runs under the (long) portal timeout. The portal writes the
//! image to a file of its own choosing and answers with a `file://` URI;
//! the adapter reads the bytes and removes that file, so the only persisted
//! artifact is the one the encoder writes into the screenshot directory.
//!
//! The portal has no window or cursor selection in non-interactive mode:
//! it only provides full-screen capture.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use url::Url;

use super::traits::DesktopAdapter;
use crate::{
    error::{CaptureError, ShotResult},
    model::{BackendCapability, BackendKind, CaptureOptions, Captured},
};

/// One screenshot round-trip with the portal service
#[async_trait]
pub trait ScreenshotPortal: fmt::Debug + Send + Sync {
    /// Asks for a non-interactive screenshot and returns the image URI
    async fn request(&self) -> ShotResult<Url>;
}

/// `org.freedesktop.portal.Screenshot` on the session bus
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopPortal;

#[cfg(target_os = "linux")]
#[async_trait]
impl ScreenshotPortal for DesktopPortal {
    async fn request(&self) -> ShotResult<Url> {
        use ashpd::desktop::screenshot::Screenshot;

        let request = Screenshot::request()
            .interactive(false)
            .modal(true)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Screenshot portal request failed: {}", e);
                classify_portal_error(&e.to_string())
            })?;

        let response = request.response().map_err(|e| {
            tracing::warn!("Screenshot portal returned no image: {}", e);
            classify_portal_error(&e.to_string())
        })?;

        let uri = response.uri().to_string();
        Url::parse(&uri).map_err(|e| {
            CaptureError::unavailable(BackendKind::Portal, format!("portal returned a malformed URI {}: {}", uri, e))
        })
    }
}

#[cfg(not(target_os = "linux"))]
#[async_trait]
impl ScreenshotPortal for DesktopPortal {
    async fn request(&self) -> ShotResult<Url> {
        Err(CaptureError::unavailable(
            BackendKind::Portal,
            "org.freedesktop.portal.Screenshot only exists on Linux desktops",
        ))
    }
}

/// Portal-backed full-screen capture
#[derive(Debug, Clone)]
pub struct PortalAdapter {
    portal:  Arc<dyn ScreenshotPortal>,
    timeout: Duration,
}

impl PortalAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self::with_portal(Arc::new(DesktopPortal), timeout)
    }

    /// Uses `portal` instead of the session-bus service
    pub fn with_portal(portal: Arc<dyn ScreenshotPortal>, timeout: Duration) -> Self {
        Self { portal, timeout }
    }
}

/// Maps a portal error message to the adapter taxonomy
///
/// The portal reports user refusal as a cancelled response; everything else
/// (no portal service, no session bus, backend crash) means unavailable.
fn classify_portal_error(message: &str) -> CaptureError {
    let lower = message.to_lowercase();
    if lower.contains("cancel") || lower.contains("denied") {
        CaptureError::PermissionDenied {
            backend: BackendKind::Portal,
            reason:  message.to_string(),
        }
    } else {
        CaptureError::unavailable(BackendKind::Portal, message.to_string())
    }
}

/// Local path behind a `file://` URI
fn uri_to_path(uri: &Url) -> ShotResult<PathBuf> {
    if uri.scheme() != "file" {
        return Err(CaptureError::unavailable(
            BackendKind::Portal,
            format!("portal returned a non-file URI: {}", uri),
        ));
    }
    uri.to_file_path().map_err(|()| {
        CaptureError::unavailable(BackendKind::Portal, format!("portal returned a remote file URI: {}", uri))
    })
}

#[async_trait]
impl DesktopAdapter for PortalAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Portal
    }

    fn capability(&self) -> BackendCapability {
        BackendCapability {
            list:           false,
            capture_full:   true,
            capture_window: false,
            activate:       false,
            native_region:  false,
            priority:       BackendKind::Portal.priority(),
        }
    }

    async fn capture_full_screen(&self, _dest: &Path, opts: &CaptureOptions) -> ShotResult<Captured> {
        if opts.include_cursor {
            tracing::debug!("Portal screenshots cannot include the cursor, ignoring");
        }

        let uri = tokio::time::timeout(self.timeout, self.portal.request())
            .await
            .map_err(|_| {
                tracing::error!("Portal request timed out after {}s", self.timeout.as_secs());
                CaptureError::unavailable(
                    BackendKind::Portal,
                    format!("no answer within {}s (consent dialog left open?)", self.timeout.as_secs()),
                )
            })??;

        let source = uri_to_path(&uri)?;
        let data = tokio::fs::read(&source).await.map_err(|e| {
            CaptureError::unavailable(
                BackendKind::Portal,
                format!("cannot read portal image {}: {}", source.display(), e),
            )
        })?;

        if let Err(e) = tokio::fs::remove_file(&source).await {
            tracing::debug!("Could not remove portal image {}: {}", source.display(), e);
        }

        if data.is_empty() {
            return Err(CaptureError::unavailable(BackendKind::Portal, "portal returned an empty image"));
        }

        Ok(Captured::bytes(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Portal stand-in answering with a fixed outcome
    #[derive(Debug)]
    enum FakePortal {
        Answer(Url),
        Refuse(&'static str),
        Silent,
    }

    #[async_trait]
    impl ScreenshotPortal for FakePortal {
        async fn request(&self) -> ShotResult<Url> {
            match self {
                FakePortal::Answer(uri) => Ok(uri.clone()),
                FakePortal::Refuse(message) => Err(classify_portal_error(message)),
                FakePortal::Silent => std::future::pending().await,
            }
        }
    }

    fn adapter(portal: FakePortal, timeout: Duration) -> PortalAdapter {
        PortalAdapter::with_portal(Arc::new(portal), timeout)
    }

    async fn capture(adapter: &PortalAdapter) -> ShotResult<Captured> {
        adapter.capture_full_screen(Path::new("/unused"), &CaptureOptions::default()).await
    }

    #[test]
    fn test_uri_to_path() {
        let uri = Url::parse("file:///home/u/Pictures/Screenshot.png").unwrap();
        assert_eq!(uri_to_path(&uri).unwrap(), PathBuf::from("/home/u/Pictures/Screenshot.png"));

        let uri = Url::parse("file:///tmp/Screenshot%20from%202024.png").unwrap();
        assert_eq!(uri_to_path(&uri).unwrap(), PathBuf::from("/tmp/Screenshot from 2024.png"));
    }

    #[test]
    fn test_uri_to_path_rejects_other_schemes() {
        let https = Url::parse("https://example.com/a.png").unwrap();
        assert!(matches!(uri_to_path(&https), Err(CaptureError::AdapterUnavailable { .. })));

        let remote = Url::parse("file://otherhost/a.png").unwrap();
        assert!(matches!(uri_to_path(&remote), Err(CaptureError::AdapterUnavailable { .. })));
    }

    #[test]
    fn test_classify_portal_error() {
        assert!(matches!(
            classify_portal_error("Response: Cancelled"),
            CaptureError::PermissionDenied { .. }
        ));
        assert!(matches!(
            classify_portal_error("org.freedesktop.DBus.Error.ServiceUnknown"),
            CaptureError::AdapterUnavailable { .. }
        ));
    }

    #[tokio::test]
    async fn test_answer_is_read_and_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let image = tmp.path().join("Screenshot from today.png");
        std::fs::write(&image, b"\x89PNG fake").unwrap();

        let uri = Url::from_file_path(&image).unwrap();
        let captured = capture(&adapter(FakePortal::Answer(uri), Duration::from_secs(5))).await.unwrap();

        assert_eq!(captured, Captured::bytes(b"\x89PNG fake".to_vec()));
        assert!(!image.exists());
    }

    #[tokio::test]
    async fn test_refusal_is_permission_denied() {
        let err = capture(&adapter(FakePortal::Refuse("Response: Cancelled"), Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::PermissionDenied { backend: BackendKind::Portal, .. }));
    }

    #[tokio::test]
    async fn test_non_file_answer_is_unavailable() {
        let uri = Url::parse("https://example.com/shot.png").unwrap();
        let err = capture(&adapter(FakePortal::Answer(uri), Duration::from_secs(5))).await.unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("non-file URI"), "{}", err);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_portal_times_out() {
        let start = tokio::time::Instant::now();
        let err = capture(&adapter(FakePortal::Silent, Duration::from_secs(30))).await.unwrap_err();

        assert!(matches!(err, CaptureError::AdapterUnavailable { backend: BackendKind::Portal, .. }));
        assert!(err.to_string().contains("no answer within 30s"), "{}", err);
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[test]
    fn test_capability_is_full_screen_only() {
        let caps = PortalAdapter::new(Duration::from_secs(1)).capability();
        assert!(caps.capture_full);
        assert!(!caps.list && !caps.activate && !caps.capture_window);
        assert_eq!(caps.priority, 0);
    }
}
