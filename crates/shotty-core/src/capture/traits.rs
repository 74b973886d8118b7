//! Uniform contract implemented by every desktop-interaction backend
//!
//! Each adapter wraps one mechanism (portal, compositor extension,
//! screenshot utility) and declares up front which operations it covers via
//! [`BackendCapability`]. Operations outside that set keep the default
//! implementations below, which fail with `AdapterUnavailable` instead of
//! panicking, so the orchestrator can treat "unsupported" like any other
//! recoverable backend failure.

use std::path::Path;

use async_trait::async_trait;

use crate::{
    error::{CaptureError, ShotResult},
    model::{
        BackendCapability, BackendKind, CaptureOptions, Captured, Geometry, Operation,
        WindowHandle,
    },
};

/// A single desktop-interaction backend
///
/// Every fallible call returns either a value or a recoverable
/// `AdapterUnavailable` / `PermissionDenied` error. Adapters never touch the
/// focus state except through [`DesktopAdapter::activate_window`].
#[async_trait]
pub trait DesktopAdapter: Send + Sync {
    /// Which mechanism this adapter wraps
    fn kind(&self) -> BackendKind;

    /// Static capability set
    fn capability(&self) -> BackendCapability;

    /// Enumerates windows, tagging each with this adapter's kind
    async fn list_windows(&self) -> ShotResult<Vec<WindowHandle>> {
        Err(unsupported(self.kind(), Operation::List))
    }

    /// Captures the whole screen
    ///
    /// `dest` is where the adapter should write its output if it writes a
    /// file. Adapters that produce bytes in memory may ignore it. When
    /// `opts.region` is set and the capability has `native_region`, the
    /// adapter restricts the capture itself and reports so via
    /// [`Captured::region_applied`].
    async fn capture_full_screen(&self, dest: &Path, opts: &CaptureOptions) -> ShotResult<Captured> {
        let _ = (dest, opts);
        Err(unsupported(self.kind(), Operation::CaptureFull))
    }

    /// Captures one window without activating it
    async fn capture_window(
        &self,
        handle: &WindowHandle,
        dest: &Path,
        opts: &CaptureOptions,
    ) -> ShotResult<Captured> {
        let _ = (handle, dest, opts);
        Err(unsupported(self.kind(), Operation::CaptureWindow))
    }

    /// Raises a window to the foreground
    async fn activate_window(&self, id: &str) -> ShotResult<()> {
        let _ = id;
        Err(unsupported(self.kind(), Operation::Activate))
    }

    /// Id of the currently focused window, if the adapter can tell
    async fn active_window(&self) -> ShotResult<Option<String>> {
        Err(unsupported(self.kind(), Operation::Activate))
    }

    /// Screen-space geometry of a window, if known
    async fn window_geometry(&self, id: &str) -> ShotResult<Option<Geometry>> {
        let _ = id;
        Err(unsupported(self.kind(), Operation::Activate))
    }
}

fn unsupported(backend: BackendKind, op: Operation) -> CaptureError {
    CaptureError::unavailable(backend, format!("does not support {}", op))
}
