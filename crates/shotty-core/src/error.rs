//! Error types for screenshot capture operations
//!
//! Adapter-level failures (`AdapterUnavailable`, `PermissionDenied`) are
//! recoverable: the orchestrator records them as [`AdapterFailure`] entries
//! and moves on to the next backend. Only exhaustion errors and security
//! violations reach the caller, and those always carry the full cause chain
//! so the client can explain what was tried without reading logs.

use std::path::PathBuf;

use serde::Serialize;

use crate::model::{BackendKind, Operation};

/// Result type alias for capture operations
pub type ShotResult<T> = Result<T, CaptureError>;

/// One entry of an aggregated cause chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterFailure {
    pub backend:           BackendKind,
    pub reason:            String,
    pub permission_denied: bool,
}

impl AdapterFailure {
    /// Records why `backend` could not serve a request
    pub fn from_error(backend: BackendKind, error: &CaptureError) -> Self {
        let reason = match error {
            CaptureError::AdapterUnavailable { reason, .. }
            | CaptureError::PermissionDenied { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        Self {
            backend,
            reason,
            permission_denied: matches!(error, CaptureError::PermissionDenied { .. }),
        }
    }

    /// Entry for an adapter whose capability set does not cover `op`
    pub fn unsupported(backend: BackendKind, op: Operation) -> Self {
        Self {
            backend,
            reason: format!("does not support {}", op),
            permission_denied: false,
        }
    }
}

impl std::fmt::Display for AdapterFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.backend, self.reason)?;
        if self.permission_denied {
            write!(f, " (permission denied)")?;
        }
        Ok(())
    }
}

fn format_causes(causes: &[AdapterFailure]) -> String {
    if causes.is_empty() {
        return "no backends configured".to_string();
    }
    causes.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Error type for screenshot capture operations
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Backend missing, failed, timed out or produced unusable output
    #[error("{backend} backend unavailable: {reason}")]
    AdapterUnavailable { backend: BackendKind, reason: String },

    /// User or portal refused consent
    #[error("{backend} backend denied permission: {reason}")]
    PermissionDenied { backend: BackendKind, reason: String },

    /// Requested window id is not in the current window list
    #[error("Window not found: '{window_id}' is not among the windows reported by the {listed_by} backend")]
    WindowNotFound { window_id: String, listed_by: BackendKind },

    /// Every window source failed
    #[error("No window source available ({})", format_causes(.causes))]
    NoWindowSourceAvailable { causes: Vec<AdapterFailure> },

    /// Every capture path failed
    #[error("Capture unavailable, all backends failed ({})", format_causes(.causes))]
    CaptureUnavailable { causes: Vec<AdapterFailure> },

    /// A capture artifact resolved outside the screenshot directory
    #[error("Path '{}' escapes the screenshot directory '{}'", .path.display(), .root.display())]
    PathEscape { path: PathBuf, root: PathBuf },

    /// Invalid parameter provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(String),

    /// Capture task aborted unexpectedly
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CaptureError {
    /// Shorthand for an `AdapterUnavailable` error
    pub fn unavailable(backend: BackendKind, reason: impl Into<String>) -> Self {
        CaptureError::AdapterUnavailable {
            backend,
            reason: reason.into(),
        }
    }

    /// True for failures that should trigger fallback to the next backend
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CaptureError::AdapterUnavailable { .. } | CaptureError::PermissionDenied { .. }
        )
    }

    /// Per-backend causes carried by exhaustion errors
    pub fn causes(&self) -> &[AdapterFailure] {
        match self {
            CaptureError::NoWindowSourceAvailable { causes }
            | CaptureError::CaptureUnavailable { causes } => causes,
            _ => &[],
        }
    }

    /// Returns an actionable remediation hint for this error
    ///
    /// # Examples
    ///
    /// ```
    /// use shotty_core::{error::CaptureError, model::BackendKind};
    ///
    /// let error = CaptureError::WindowNotFound {
    ///     window_id: "42".to_string(),
    ///     listed_by: BackendKind::Extension,
    /// };
    /// assert!(error.remediation_hint().contains("list_windows"));
    /// ```
    pub fn remediation_hint(&self) -> &str {
        match self {
            CaptureError::AdapterUnavailable { backend, .. } => match backend {
                BackendKind::Portal => {
                    "Install xdg-desktop-portal with a backend such as xdg-desktop-portal-gnome \
                     and make sure the session D-Bus is reachable."
                }
                BackendKind::Extension => {
                    "Install and enable the 'Window Calls' GNOME Shell extension so windows can be \
                     listed and activated."
                }
                BackendKind::Cli => {
                    "Install a screenshot utility (grim, gnome-screenshot or ImageMagick import) \
                     and make sure it is on PATH."
                }
                BackendKind::Processes => "The process-list fallback needs `ps` (procps) on PATH.",
            },
            CaptureError::PermissionDenied { .. } => {
                "Grant screenshot permission when the desktop asks for consent. On GNOME, check \
                 Settings > Privacy > Screen Sharing, then retry."
            }
            CaptureError::WindowNotFound { .. } => {
                "Use the list_windows tool to get current window ids. Ids are only valid while the \
                 window stays open."
            }
            CaptureError::NoWindowSourceAvailable { .. } => {
                "No backend could enumerate windows. Enable the 'Window Calls' GNOME Shell \
                 extension, or capture the full screen instead."
            }
            CaptureError::CaptureUnavailable { causes } => {
                if causes.iter().any(|c| c.permission_denied) {
                    "Screenshot consent was refused. Grant permission in the portal dialog and \
                     retry, or install grim/gnome-screenshot as a fallback."
                } else {
                    "No capture backend worked. Install xdg-desktop-portal, or a screenshot \
                     utility such as grim or gnome-screenshot."
                }
            }
            CaptureError::PathEscape { .. } => {
                "A backend produced a file outside the screenshot directory. The result was \
                 rejected; check SHOTTY_SCREENSHOT_DIR and any symlinks inside it."
            }
            CaptureError::InvalidParameter { .. } => {
                "Check the parameter value against the tool description."
            }
            CaptureError::Config(_) => {
                "Check the SHOTTY_* environment variables for invalid values."
            }
            CaptureError::Io(_) => {
                "An I/O error occurred. Check file permissions and free disk space in the \
                 screenshot directory."
            }
            CaptureError::Image(_) => {
                "The captured image could not be processed. Retry, or capture the full screen."
            }
            CaptureError::Internal(_) => "Retry the request. If it persists, check the server log.",
        }
    }
}
