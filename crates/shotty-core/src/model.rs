//! Data models and type definitions for shotty
//!
//! This module defines the core types used throughout the capture pipeline:
//! - Backend identity and capability descriptors
//! - Canonical window handles and their client-facing summaries
//! - Capture requests, raw adapter output and the normalized capture result
//! - Session detection and health check response structures

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifies which desktop-interaction mechanism an adapter wraps
///
/// The declaration order is the fixed adapter priority: the portal always
/// outranks the compositor extension, which always outranks the legacy CLI.
/// The process list comes last and can only list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Permissioned XDG desktop portal screenshot interface
    Portal,
    /// GNOME Shell `window-calls` extension over D-Bus
    Extension,
    /// Screenshot utility launched as a subprocess
    Cli,
    /// Running GUI processes, a listing of last resort
    Processes,
}

impl BackendKind {
    /// Returns the backend name as a lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Portal => "portal",
            BackendKind::Extension => "extension",
            BackendKind::Cli => "cli",
            BackendKind::Processes => "processes",
        }
    }

    /// Priority rank (lower is tried first)
    pub fn priority(&self) -> u8 {
        match self {
            BackendKind::Portal => 0,
            BackendKind::Extension => 1,
            BackendKind::Cli => 2,
            BackendKind::Processes => 3,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One operation an adapter may or may not support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Enumerate desktop windows
    List,
    /// Capture the whole screen
    CaptureFull,
    /// Capture one window directly
    CaptureWindow,
    /// Raise a window to the foreground
    Activate,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operation::List => "window listing",
            Operation::CaptureFull => "full-screen capture",
            Operation::CaptureWindow => "window capture",
            Operation::Activate => "window activation",
        };
        write!(f, "{}", s)
    }
}

/// Static capability descriptor for one adapter
///
/// Configured once when the adapter is built and read-only afterwards. The
/// orchestrator consults it before calling an adapter instead of attempting
/// every operation and catching the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BackendCapability {
    /// Can enumerate windows
    pub list:           bool,
    /// Can capture the full screen
    pub capture_full:   bool,
    /// Can capture a single window without help
    pub capture_window: bool,
    /// Can activate windows and report focus/geometry
    pub activate:       bool,
    /// Honors a capture region natively (otherwise the orchestrator crops)
    pub native_region:  bool,
    /// Priority rank, lower is tried first
    pub priority:       u8,
}

impl BackendCapability {
    /// Returns true if the given operation is covered
    pub fn supports(&self, op: Operation) -> bool {
        match op {
            Operation::List => self.list,
            Operation::CaptureFull => self.capture_full,
            Operation::CaptureWindow => self.capture_window,
            Operation::Activate => self.activate,
        }
    }

    /// Names of the supported operations, for diagnostics
    pub fn operations(&self) -> Vec<Operation> {
        [Operation::List, Operation::CaptureFull, Operation::CaptureWindow, Operation::Activate]
            .into_iter()
            .filter(|op| self.supports(*op))
            .collect()
    }
}

/// Canonical description of one discoverable window
///
/// Created fresh on every listing and never mutated. The `id` format is
/// backend-specific and only meaningful to the adapter named by
/// `source_backend`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WindowHandle {
    /// Opaque, backend-assigned identifier
    pub id:             String,
    /// Human-readable title (may be empty)
    pub title:          String,
    /// Adapter that produced this record (used for activation routing)
    pub source_backend: BackendKind,
}

impl WindowHandle {
    /// Creates a new WindowHandle
    pub fn new(id: impl Into<String>, title: impl Into<String>, source_backend: BackendKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source_backend,
        }
    }
}

/// Client-facing shape of a window (`{id, title}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WindowSummary {
    /// Identifier accepted by `capture_screenshot`
    pub id:    String,
    /// Window title
    pub title: String,
}

impl From<&WindowHandle> for WindowSummary {
    fn from(handle: &WindowHandle) -> Self {
        Self {
            id:    handle.id.clone(),
            title: handle.title.clone(),
        }
    }
}

/// Screen-space rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Geometry {
    pub x:      i32,
    pub y:      i32,
    pub width:  u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Formats the rectangle the way `grim -g` expects (`"x,y WxH"`)
    pub fn to_grim_arg(&self) -> String {
        format!("{},{} {}x{}", self.x, self.y, self.width, self.height)
    }

    /// Intersects this rectangle with a `width`x`height` image anchored at the
    /// origin, returning `(x, y, w, h)` in image coordinates
    ///
    /// Returns `None` if nothing of the rectangle lies on the image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let left = i64::from(self.x).max(0);
        let top = i64::from(self.y).max(0);
        let right = (i64::from(self.x) + i64::from(self.width)).min(i64::from(width));
        let bottom = (i64::from(self.y) + i64::from(self.height)).min(i64::from(height));

        if right <= left || bottom <= top {
            return None;
        }

        Some((left as u32, top as u32, (right - left) as u32, (bottom - top) as u32))
    }
}

/// What a capture request points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    /// The whole screen
    FullScreen,
    /// A window id previously returned by `list_windows`
    Window(String),
}

impl CaptureTarget {
    /// Builds a target from an optional window id (`None` → full screen)
    pub fn from_window_id(window_id: Option<String>) -> Self {
        match window_id {
            Some(id) if !id.trim().is_empty() => CaptureTarget::Window(id),
            _ => CaptureTarget::FullScreen,
        }
    }
}

/// A capture request as accepted by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub target:         CaptureTarget,
    pub include_cursor: bool,
    /// Optional screen area (full-screen captures only; window captures use
    /// the window's own geometry)
    pub area:           Option<Geometry>,
}

impl CaptureRequest {
    /// Full-screen capture request
    pub fn full_screen() -> Self {
        Self {
            target:         CaptureTarget::FullScreen,
            include_cursor: false,
            area:           None,
        }
    }

    /// Window capture request
    pub fn window(id: impl Into<String>) -> Self {
        Self {
            target:         CaptureTarget::Window(id.into()),
            include_cursor: false,
            area:           None,
        }
    }

    pub fn with_cursor(mut self, include_cursor: bool) -> Self {
        self.include_cursor = include_cursor;
        self
    }

    pub fn with_area(mut self, area: Geometry) -> Self {
        self.area = Some(area);
        self
    }
}

/// Options handed to an adapter's capture call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureOptions {
    pub include_cursor: bool,
    pub region:         Option<Geometry>,
}

/// What an adapter produced before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCapture {
    /// Encoded image bytes held in memory
    Bytes(Vec<u8>),
    /// Encoded image written to disk by the adapter
    File(PathBuf),
}

/// Successful adapter capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub raw:            RawCapture,
    /// True if the adapter already restricted the image to the requested region
    pub region_applied: bool,
}

impl Captured {
    pub fn bytes(data: Vec<u8>) -> Self {
        Self {
            raw:            RawCapture::Bytes(data),
            region_applied: false,
        }
    }

    pub fn file(path: PathBuf) -> Self {
        Self {
            raw:            RawCapture::File(path),
            region_applied: false,
        }
    }

    pub fn with_region_applied(mut self, applied: bool) -> Self {
        self.region_applied = applied;
        self
    }
}

/// How the Result Encoder packages a capture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Embed the encoded bytes in the result
    #[default]
    Inline,
    /// Return only the stored file path
    Path,
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inline" => Ok(OutputMode::Inline),
            "path" => Ok(OutputMode::Path),
            other => Err(format!("unknown output mode '{}' (expected 'inline' or 'path')", other)),
        }
    }
}

/// Payload of a capture result: exactly one of bytes or a stored path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturePayload {
    Inline(Vec<u8>),
    Stored(PathBuf),
}

/// Normalized result of a capture request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResult {
    pub payload:      CapturePayload,
    pub mime_type:    &'static str,
    /// Backend (or backend combination) that produced the pixels
    pub backend_used: String,
}

impl CaptureResult {
    pub fn image_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            CapturePayload::Inline(data) => Some(data),
            CapturePayload::Stored(_) => None,
        }
    }

    pub fn file_path(&self) -> Option<&Path> {
        match &self.payload {
            CapturePayload::Inline(_) => None,
            CapturePayload::Stored(path) => Some(path),
        }
    }
}

/// Display server detected for the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DisplayServer {
    None,
    Wayland,
    X11,
}

impl DisplayServer {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayServer::None => "none",
            DisplayServer::Wayland => "wayland",
            DisplayServer::X11 => "x11",
        }
    }
}

/// Platform information including OS, display server and desktop name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlatformInfo {
    /// Operating system name (e.g., "linux")
    pub os:      String,
    pub display: DisplayServer,
    /// Value of `XDG_CURRENT_DESKTOP`, if any
    pub desktop: Option<String>,
}

/// Describes one configured adapter in health output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AdapterDescriptor {
    pub name:       String,
    pub priority:   u8,
    pub operations: Vec<Operation>,
}

/// Response structure for the health_check MCP tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HealthCheckResponse {
    pub platform:       String,
    pub display:        String,
    pub desktop:        Option<String>,
    pub screenshot_dir: String,
    pub adapters:       Vec<AdapterDescriptor>,
    pub ok:             bool,
}
