//! Mock desktop adapter for testing and development
//!
//! [`MockAdapter`] can impersonate any of the backends. It keeps a
//! fake focus state, generates synthetic PNG captures and records every call
//! so tests can assert on ordering (activation before capture, restore after)
//! without a desktop session.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use shotty_core::capture::{DesktopAdapter, mock::MockAdapter};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let extension = Arc::new(
//!     MockAdapter::extension()
//!         .with_windows(&[("1", "Editor"), ("2", "Terminal")])
//!         .with_focused("2"),
//! );
//!
//! let windows = extension.list_windows().await.unwrap();
//! assert_eq!(windows.len(), 2);
//!
//! extension.activate_window("1").await.unwrap();
//! assert_eq!(extension.active_window().await.unwrap(), Some("1".to_string()));
//! # }
//! ```

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use tokio::time::sleep;

use super::traits::DesktopAdapter;
use crate::{
    error::{CaptureError, ShotResult},
    model::{
        BackendCapability, BackendKind, CaptureOptions, Captured, Geometry, Operation,
        WindowHandle,
    },
    util::crop::{crop_encoded, test_pattern_png},
};

/// Screen size used for synthetic full-screen captures
pub const MOCK_SCREEN: (u32, u32) = (320, 200);

/// One recorded adapter call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    List,
    CaptureFull { region: Option<Geometry> },
    CaptureWindow(String),
    Activate(String),
    ActiveWindow,
    Geometry(String),
}

/// Where the mock puts its capture output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutput {
    /// Encoded bytes in memory
    Bytes,
    /// Written to the destination the orchestrator allocated
    File,
    /// Written to a fixed path, ignoring the allocated destination
    FixedPath(PathBuf),
    /// These exact bytes in memory instead of a rendered image
    Data(Vec<u8>),
    /// A path reported without writing anything
    Reported(PathBuf),
}

#[derive(Debug, Clone)]
enum MockFailure {
    Unavailable(String),
    PermissionDenied(String),
}

/// Mock adapter with configurable capabilities, windows and failures
#[derive(Debug)]
pub struct MockAdapter {
    kind:               BackendKind,
    capability:         BackendCapability,
    windows:            Vec<(String, String)>,
    geometry:           HashMap<String, Geometry>,
    focused:            Mutex<Option<String>>,
    failure:            Option<MockFailure>,
    activation_failure: Option<String>,
    delay:              Option<Duration>,
    output:             MockOutput,
    calls:              Mutex<Vec<MockCall>>,
}

impl MockAdapter {
    /// Creates a mock with an empty capability set
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            capability: BackendCapability {
                list:           false,
                capture_full:   false,
                capture_window: false,
                activate:       false,
                native_region:  false,
                priority:       kind.priority(),
            },
            windows: Vec::new(),
            geometry: HashMap::new(),
            focused: Mutex::new(None),
            failure: None,
            activation_failure: None,
            delay: None,
            output: MockOutput::Bytes,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Portal-shaped mock: full-screen capture only, bytes in memory
    pub fn portal() -> Self {
        let mut mock = Self::new(BackendKind::Portal);
        mock.capability.capture_full = true;
        mock
    }

    /// Extension-shaped mock: listing and activation, no capture
    pub fn extension() -> Self {
        let mut mock = Self::new(BackendKind::Extension);
        mock.capability.list = true;
        mock.capability.activate = true;
        mock
    }

    /// CLI-shaped mock: full-screen capture written to the destination file
    pub fn cli() -> Self {
        let mut mock = Self::new(BackendKind::Cli);
        mock.capability.capture_full = true;
        mock.output = MockOutput::File;
        mock
    }

    /// Process-list-shaped mock: listing only
    pub fn processes() -> Self {
        let mut mock = Self::new(BackendKind::Processes);
        mock.capability.list = true;
        mock
    }

    /// Replaces the window list with `(id, title)` pairs
    ///
    /// Each window gets a distinct default geometry inside [`MOCK_SCREEN`].
    pub fn with_windows(mut self, windows: &[(&str, &str)]) -> Self {
        self.windows = windows
            .iter()
            .map(|(id, title)| (id.to_string(), title.to_string()))
            .collect();
        for (i, (id, _)) in windows.iter().enumerate() {
            let offset = 10 * i as i32;
            self.geometry
                .entry(id.to_string())
                .or_insert_with(|| Geometry::new(offset, offset, 100, 80));
        }
        self
    }

    pub fn with_focused(self, id: &str) -> Self {
        *self.focused.lock().unwrap_or_else(|e| e.into_inner()) = Some(id.to_string());
        self
    }

    pub fn with_geometry(mut self, id: &str, geometry: Geometry) -> Self {
        self.geometry.insert(id.to_string(), geometry);
        self
    }

    /// Replaces the whole capability set
    pub fn with_capability(mut self, capability: BackendCapability) -> Self {
        self.capability = capability;
        self
    }

    /// Adds direct window capture to the capability set
    pub fn with_window_capture(mut self) -> Self {
        self.capability.capture_window = true;
        self
    }

    pub fn with_native_region(mut self, native: bool) -> Self {
        self.capability.native_region = native;
        self
    }

    pub fn with_output(mut self, output: MockOutput) -> Self {
        self.output = output;
        self
    }

    /// Makes every operation fail with `AdapterUnavailable`
    pub fn unavailable(mut self, reason: &str) -> Self {
        self.failure = Some(MockFailure::Unavailable(reason.to_string()));
        self
    }

    /// Makes every operation fail with `PermissionDenied`
    pub fn permission_denied(mut self, reason: &str) -> Self {
        self.failure = Some(MockFailure::PermissionDenied(reason.to_string()));
        self
    }

    /// Makes only activation fail
    pub fn failing_activation(mut self, reason: &str) -> Self {
        self.activation_failure = Some(reason.to_string());
        self
    }

    /// Sets a delay applied before every async operation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Ids passed to `activate_window`, in order
    pub fn activations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Activate(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Number of capture calls (full screen or window)
    pub fn capture_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, MockCall::CaptureFull { .. } | MockCall::CaptureWindow(_)))
            .count()
    }

    /// Currently focused window id
    pub fn focused(&self) -> Option<String> {
        self.focused.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn enter(&self, call: MockCall) -> ShotResult<()> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
        if let Some(duration) = self.delay {
            sleep(duration).await;
        }
        match &self.failure {
            Some(MockFailure::Unavailable(reason)) => Err(CaptureError::unavailable(self.kind, reason.clone())),
            Some(MockFailure::PermissionDenied(reason)) => Err(CaptureError::PermissionDenied {
                backend: self.kind,
                reason:  reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn require(&self, op: Operation) -> ShotResult<()> {
        if self.capability.supports(op) {
            Ok(())
        } else {
            Err(CaptureError::unavailable(self.kind, format!("does not support {}", op)))
        }
    }

    async fn emit(&self, data: Vec<u8>, dest: &Path) -> ShotResult<Captured> {
        match &self.output {
            MockOutput::Bytes => Ok(Captured::bytes(data)),
            MockOutput::File => {
                tokio::fs::write(dest, &data).await?;
                Ok(Captured::file(dest.to_path_buf()))
            }
            MockOutput::FixedPath(path) => {
                tokio::fs::write(path, &data).await?;
                Ok(Captured::file(path.clone()))
            }
            MockOutput::Data(bytes) => Ok(Captured::bytes(bytes.clone())),
            MockOutput::Reported(path) => Ok(Captured::file(path.clone())),
        }
    }
}

#[async_trait]
impl DesktopAdapter for MockAdapter {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn capability(&self) -> BackendCapability {
        self.capability
    }

    async fn list_windows(&self) -> ShotResult<Vec<WindowHandle>> {
        self.require(Operation::List)?;
        self.enter(MockCall::List).await?;
        Ok(self
            .windows
            .iter()
            .map(|(id, title)| WindowHandle::new(id.clone(), title.clone(), self.kind))
            .collect())
    }

    async fn capture_full_screen(&self, dest: &Path, opts: &CaptureOptions) -> ShotResult<Captured> {
        self.require(Operation::CaptureFull)?;
        self.enter(MockCall::CaptureFull { region: opts.region }).await?;

        let data = test_pattern_png(MOCK_SCREEN.0, MOCK_SCREEN.1);
        match opts.region {
            Some(region) if self.capability.native_region => {
                let data = crop_encoded(&data, region)?.unwrap_or(data);
                Ok(self.emit(data, dest).await?.with_region_applied(true))
            }
            _ => self.emit(data, dest).await,
        }
    }

    async fn capture_window(
        &self,
        handle: &WindowHandle,
        dest: &Path,
        _opts: &CaptureOptions,
    ) -> ShotResult<Captured> {
        self.require(Operation::CaptureWindow)?;
        self.enter(MockCall::CaptureWindow(handle.id.clone())).await?;

        let geometry = self
            .geometry
            .get(&handle.id)
            .copied()
            .unwrap_or_else(|| Geometry::new(0, 0, 100, 80));
        self.emit(test_pattern_png(geometry.width, geometry.height), dest).await
    }

    async fn activate_window(&self, id: &str) -> ShotResult<()> {
        self.require(Operation::Activate)?;
        self.enter(MockCall::Activate(id.to_string())).await?;
        if let Some(reason) = &self.activation_failure {
            return Err(CaptureError::unavailable(self.kind, reason.clone()));
        }
        *self.focused.lock().unwrap_or_else(|e| e.into_inner()) = Some(id.to_string());
        Ok(())
    }

    async fn active_window(&self) -> ShotResult<Option<String>> {
        self.require(Operation::Activate)?;
        self.enter(MockCall::ActiveWindow).await?;
        Ok(self.focused())
    }

    async fn window_geometry(&self, id: &str) -> ShotResult<Option<Geometry>> {
        self.require(Operation::Activate)?;
        self.enter(MockCall::Geometry(id.to_string())).await?;
        Ok(self.geometry.get(id).copied())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[tokio::test]
    async fn test_presets_match_capabilities() {
        assert!(MockAdapter::portal().capability().capture_full);
        assert!(!MockAdapter::portal().capability().list);
        assert!(MockAdapter::extension().capability().list);
        assert!(MockAdapter::extension().capability().activate);
        assert!(!MockAdapter::extension().capability().capture_full);
        assert_eq!(MockAdapter::cli().capability().priority, 2);
        assert!(MockAdapter::processes().capability().list);
        assert!(!MockAdapter::processes().capability().activate);
    }

    #[tokio::test]
    async fn test_unsupported_operation_is_not_recorded() {
        let portal = MockAdapter::portal();
        let err = portal.list_windows().await.unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("does not support window listing"));
        assert!(portal.calls().is_empty());
    }

    #[tokio::test]
    async fn test_activation_moves_focus() {
        let ext = MockAdapter::extension().with_windows(&[("1", "A"), ("2", "B")]).with_focused("2");
        ext.activate_window("1").await.unwrap();
        assert_eq!(ext.focused(), Some("1".to_string()));
        assert_eq!(ext.activations(), vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_activation_keeps_focus() {
        let ext = MockAdapter::extension()
            .with_windows(&[("1", "A")])
            .with_focused("9")
            .failing_activation("Activate failed: Not found");
        assert!(ext.activate_window("1").await.is_err());
        assert_eq!(ext.focused(), Some("9".to_string()));
    }

    #[tokio::test]
    async fn test_permission_denied_injection() {
        let portal = MockAdapter::portal().permission_denied("cancelled");
        let err = portal
            .capture_full_screen(Path::new("/unused"), &CaptureOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_file_output_writes_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("shot.png");
        let captured = MockAdapter::cli()
            .capture_full_screen(&dest, &CaptureOptions::default())
            .await
            .unwrap();
        assert_eq!(captured.raw, crate::model::RawCapture::File(dest.clone()));
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn test_native_region_marks_applied() {
        let cli = MockAdapter::cli().with_native_region(true).with_output(MockOutput::Bytes);
        let opts = CaptureOptions {
            include_cursor: false,
            region:         Some(Geometry::new(0, 0, 10, 10)),
        };
        let captured = cli.capture_full_screen(Path::new("/unused"), &opts).await.unwrap();
        assert!(captured.region_applied);
    }

    #[tokio::test]
    async fn test_data_output_is_passed_through() {
        let portal = MockAdapter::portal().with_output(MockOutput::Data(b"garbage".to_vec()));
        let captured = portal
            .capture_full_screen(Path::new("/unused"), &CaptureOptions::default())
            .await
            .unwrap();
        assert_eq!(captured.raw, crate::model::RawCapture::Bytes(b"garbage".to_vec()));
    }

    #[tokio::test]
    async fn test_delay_timing() {
        let delay = Duration::from_millis(50);
        let ext = MockAdapter::extension().with_delay(delay);

        let start = Instant::now();
        let _ = ext.list_windows().await.unwrap();
        assert!(start.elapsed() >= delay);
    }
}
