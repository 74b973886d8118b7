//! GNOME Shell `window-calls` extension adapter
//!
//! The extension exports `org.gnome.Shell.Extensions.Windows` on the session
//! bus. `List` answers with a single string holding a JSON array:
//!
//! ```text
//! [{"id":2843510742,"wm_class":"org.gnome.TextEditor","focus":true,...}]
//! ```
//!
//! and `Activate` takes the numeric window id. The extension can list and
//! raise windows but cannot read pixels; window captures through it are
//! always "activate, then capture the screen" with another adapter.

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;

use super::traits::DesktopAdapter;
use crate::{
    error::{CaptureError, ShotResult},
    model::{BackendCapability, BackendKind, Geometry, WindowHandle},
};

pub const SHELL_DESTINATION: &str = "org.gnome.Shell";
pub const WINDOWS_OBJECT_PATH: &str = "/org/gnome/Shell/Extensions/Windows";
pub const WINDOWS_INTERFACE: &str = "org.gnome.Shell.Extensions.Windows";

/// Nested geometry object some extension versions report
#[derive(Debug, Clone, Copy, Deserialize)]
struct ShellRect {
    x:      i32,
    y:      i32,
    width:  u32,
    height: u32,
}

/// One record of the extension's `List` output
#[derive(Debug, Clone, Deserialize)]
struct ShellWindow {
    id:          u64,
    #[serde(default)]
    title:       Option<String>,
    #[serde(default)]
    wm_class:    Option<String>,
    #[serde(default)]
    focus:       bool,
    #[serde(default)]
    frame_type:  Option<i64>,
    #[serde(default)]
    window_type: Option<i64>,
    #[serde(default)]
    x:           Option<i32>,
    #[serde(default)]
    y:           Option<i32>,
    #[serde(default)]
    width:       Option<u32>,
    #[serde(default)]
    height:      Option<u32>,
    #[serde(default)]
    rect:        Option<ShellRect>,
}

impl ShellWindow {
    /// Regular application window (not a dialog, menu or override-redirect)
    fn is_normal(&self) -> bool {
        self.frame_type.unwrap_or(0) == 0 && self.window_type.unwrap_or(0) == 0
    }

    fn display_title(&self) -> String {
        match (&self.title, &self.wm_class) {
            (Some(title), _) if !title.trim().is_empty() => title.clone(),
            (_, Some(class)) => class.clone(),
            _ => String::new(),
        }
    }

    fn geometry(&self) -> Option<Geometry> {
        if let Some(rect) = self.rect {
            return Some(Geometry::new(rect.x, rect.y, rect.width, rect.height));
        }
        match (self.x, self.y, self.width, self.height) {
            (Some(x), Some(y), Some(w), Some(h)) => Some(Geometry::new(x, y, w, h)),
            _ => None,
        }
    }
}

/// The two `window-calls` methods the adapter needs
#[async_trait]
pub trait ShellWindows: fmt::Debug + Send + Sync {
    /// Raw JSON returned by `List`
    async fn list_json(&self) -> ShotResult<String>;

    /// Calls `Activate` for one window
    async fn activate(&self, id: u32) -> ShotResult<()>;
}

/// `window-calls` reached over the user's session bus
///
/// The connection is opened on first use and shared afterwards.
#[derive(Debug)]
pub struct SessionBus {
    timeout:    Duration,
    #[cfg(target_os = "linux")]
    connection: tokio::sync::OnceCell<zbus::Connection>,
}

impl SessionBus {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            #[cfg(target_os = "linux")]
            connection: tokio::sync::OnceCell::new(),
        }
    }
}

#[cfg(target_os = "linux")]
impl SessionBus {
    async fn connection(&self) -> ShotResult<&zbus::Connection> {
        self.connection
            .get_or_try_init(|| async {
                zbus::Connection::session().await.map_err(|e| {
                    CaptureError::unavailable(BackendKind::Extension, format!("no session bus: {}", e))
                })
            })
            .await
    }

    async fn bounded<T>(
        &self,
        method: &str,
        call: impl std::future::Future<Output = zbus::Result<T>>,
    ) -> ShotResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(classify_bus_error(method, &e.to_string())),
            Err(_) => Err(CaptureError::unavailable(
                BackendKind::Extension,
                format!("{} got no answer within {}s", method, self.timeout.as_secs()),
            )),
        }
    }
}

#[cfg(target_os = "linux")]
#[async_trait]
impl ShellWindows for SessionBus {
    async fn list_json(&self) -> ShotResult<String> {
        let connection = self.connection().await?;
        let reply = self
            .bounded(
                "List",
                connection.call_method(
                    Some(SHELL_DESTINATION),
                    WINDOWS_OBJECT_PATH,
                    Some(WINDOWS_INTERFACE),
                    "List",
                    &(),
                ),
            )
            .await?;
        reply.body().deserialize::<String>().map_err(|e| {
            CaptureError::unavailable(BackendKind::Extension, format!("List returned an unexpected reply: {}", e))
        })
    }

    async fn activate(&self, id: u32) -> ShotResult<()> {
        let connection = self.connection().await?;
        self.bounded(
            "Activate",
            connection.call_method(
                Some(SHELL_DESTINATION),
                WINDOWS_OBJECT_PATH,
                Some(WINDOWS_INTERFACE),
                "Activate",
                &(id,),
            ),
        )
        .await?;
        Ok(())
    }
}

#[cfg(not(target_os = "linux"))]
#[async_trait]
impl ShellWindows for SessionBus {
    async fn list_json(&self) -> ShotResult<String> {
        Err(CaptureError::unavailable(BackendKind::Extension, "GNOME Shell only runs on Linux"))
    }

    async fn activate(&self, _id: u32) -> ShotResult<()> {
        Err(CaptureError::unavailable(BackendKind::Extension, "GNOME Shell only runs on Linux"))
    }
}

/// Maps a D-Bus error to the adapter taxonomy
///
/// A missing name, object, interface or method means the extension is not
/// installed or not enabled.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn classify_bus_error(method: &str, message: &str) -> CaptureError {
    const MISSING: [&str; 4] = ["ServiceUnknown", "UnknownObject", "UnknownInterface", "UnknownMethod"];

    if MISSING.iter().any(|name| message.contains(name)) {
        CaptureError::unavailable(
            BackendKind::Extension,
            format!("window-calls extension is not available ({}: {})", method, message),
        )
    } else {
        CaptureError::unavailable(BackendKind::Extension, format!("{} failed: {}", method, message))
    }
}

/// Lists and activates windows through the `window-calls` extension
#[derive(Debug, Clone)]
pub struct ExtensionAdapter {
    shell: Arc<dyn ShellWindows>,
}

impl ExtensionAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self::with_shell(Arc::new(SessionBus::new(timeout)))
    }

    /// Talks to `shell` instead of the session bus
    pub fn with_shell(shell: Arc<dyn ShellWindows>) -> Self {
        Self { shell }
    }

    /// Normal windows as reported by `List`
    async fn records(&self) -> ShotResult<Vec<ShellWindow>> {
        let json = self.shell.list_json().await?;
        parse_list_json(&json)
    }
}

/// Decodes the `List` JSON into normal-window records
fn parse_list_json(json: &str) -> ShotResult<Vec<ShellWindow>> {
    let records: Vec<ShellWindow> = serde_json::from_str(json).map_err(|e| {
        CaptureError::unavailable(BackendKind::Extension, format!("List returned invalid JSON: {}", e))
    })?;
    Ok(records.into_iter().filter(ShellWindow::is_normal).collect())
}

fn parse_window_id(id: &str) -> ShotResult<u32> {
    id.trim().parse().map_err(|_| {
        CaptureError::unavailable(
            BackendKind::Extension,
            format!("'{}' is not a compositor window id", id),
        )
    })
}

#[async_trait]
impl DesktopAdapter for ExtensionAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Extension
    }

    fn capability(&self) -> BackendCapability {
        BackendCapability {
            list:           true,
            capture_full:   false,
            capture_window: false,
            activate:       true,
            native_region:  false,
            priority:       BackendKind::Extension.priority(),
        }
    }

    async fn list_windows(&self) -> ShotResult<Vec<WindowHandle>> {
        let windows = self
            .records()
            .await?
            .into_iter()
            .map(|w| WindowHandle::new(w.id.to_string(), w.display_title(), BackendKind::Extension))
            .collect();
        Ok(windows)
    }

    async fn activate_window(&self, id: &str) -> ShotResult<()> {
        let id = parse_window_id(id)?;
        self.shell.activate(id).await?;
        tracing::debug!(window_id = id, "Activated window");
        Ok(())
    }

    /// Id of the window with keyboard focus
    ///
    /// When no record carries the focus flag (some extension versions omit
    /// it), the first normal window is reported instead, since `List`
    /// returns windows in stacking order.
    async fn active_window(&self) -> ShotResult<Option<String>> {
        let records = self.records().await?;
        let focused = records.iter().find(|w| w.focus).or_else(|| records.first());
        Ok(focused.map(|w| w.id.to_string()))
    }

    async fn window_geometry(&self, id: &str) -> ShotResult<Option<Geometry>> {
        let id = parse_window_id(id)?;
        let records = self.records().await?;
        Ok(records.iter().find(|w| w.id == u64::from(id)).and_then(ShellWindow::geometry))
    }
}
