//! Legacy screenshot-utility adapter
//!
//! Last-resort full-screen capture through whatever screenshot tool is
//! installed. Tools are tried in order and the first one that exits cleanly
//! and leaves a non-empty file at the destination wins. Arguments are always
//! passed as a vector, never through a shell.

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;

use super::{process::run_command, traits::DesktopAdapter};
use crate::{
    error::{CaptureError, ShotResult},
    model::{BackendCapability, BackendKind, CaptureOptions, Captured},
};

/// Argument convention of a screenshot utility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliToolKind {
    /// `grim` (wlroots compositors); supports cursor and region
    Grim,
    /// `gnome-screenshot`; supports cursor
    GnomeScreenshot,
    /// ImageMagick `import` (X11 only)
    Import,
}

/// One screenshot utility invocation recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliTool {
    pub program: PathBuf,
    pub kind:    CliToolKind,
}

impl CliTool {
    pub fn new(program: impl Into<PathBuf>, kind: CliToolKind) -> Self {
        Self {
            program: program.into(),
            kind,
        }
    }

    /// Built-in tool order
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("grim", CliToolKind::Grim),
            Self::new("gnome-screenshot", CliToolKind::GnomeScreenshot),
            Self::new("import", CliToolKind::Import),
        ]
    }

    /// True if this tool restricts the capture to `opts.region` itself
    fn applies_region(&self, opts: &CaptureOptions) -> bool {
        self.kind == CliToolKind::Grim && opts.region.is_some()
    }

    fn args(&self, dest: &Path, opts: &CaptureOptions) -> Vec<String> {
        let dest = dest.to_string_lossy().to_string();
        let mut args = Vec::new();
        match self.kind {
            CliToolKind::Grim => {
                if opts.include_cursor {
                    args.push("-c".to_string());
                }
                if let Some(region) = opts.region {
                    args.push("-g".to_string());
                    args.push(region.to_grim_arg());
                }
                args.push(dest);
            }
            CliToolKind::GnomeScreenshot => {
                if opts.include_cursor {
                    args.push("--include-pointer".to_string());
                }
                args.push("--file".to_string());
                args.push(dest);
            }
            // import never draws the pointer, so the cursor flag has no effect
            CliToolKind::Import => {
                args.push("-window".to_string());
                args.push("root".to_string());
                args.push(dest);
            }
        }
        args
    }
}

impl fmt::Display for CliTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())
    }
}

/// Full-screen capture through external screenshot utilities
#[derive(Debug, Clone)]
pub struct CliAdapter {
    tools:   Vec<CliTool>,
    timeout: Duration,
}

impl CliAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self::with_tools(CliTool::defaults(), timeout)
    }

    pub fn with_tools(tools: Vec<CliTool>, timeout: Duration) -> Self {
        Self { tools, timeout }
    }

    async fn try_tool(&self, tool: &CliTool, dest: &Path, opts: &CaptureOptions) -> Result<(), String> {
        // A stale file from an earlier tool must not be mistaken for output
        let _ = tokio::fs::remove_file(dest).await;

        let program = tool.program.to_string_lossy();
        let output = run_command(&program, &tool.args(dest, opts), self.timeout).await?;
        if !output.success() {
            return Err(format!("{}: {}", tool, output.failure_summary()));
        }

        match tokio::fs::metadata(dest).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            Ok(_) => Err(format!("{}: wrote an empty file", tool)),
            Err(_) => Err(format!("{}: exited successfully but wrote no file", tool)),
        }
    }
}

#[async_trait]
impl DesktopAdapter for CliAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Cli
    }

    fn capability(&self) -> BackendCapability {
        BackendCapability {
            list:           false,
            capture_full:   true,
            capture_window: false,
            activate:       false,
            native_region:  self.tools.iter().any(|t| t.kind == CliToolKind::Grim),
            priority:       BackendKind::Cli.priority(),
        }
    }

    async fn capture_full_screen(&self, dest: &Path, opts: &CaptureOptions) -> ShotResult<Captured> {
        if self.tools.is_empty() {
            return Err(CaptureError::unavailable(BackendKind::Cli, "no screenshot tools configured"));
        }

        let mut failures = Vec::with_capacity(self.tools.len());
        for tool in &self.tools {
            match self.try_tool(tool, dest, opts).await {
                Ok(()) => {
                    tracing::debug!(tool = %tool, "Screenshot tool succeeded");
                    return Ok(Captured::file(dest.to_path_buf()).with_region_applied(tool.applies_region(opts)));
                }
                Err(reason) => {
                    tracing::debug!(tool = %tool, %reason, "Screenshot tool failed");
                    failures.push(reason);
                }
            }
        }

        Err(CaptureError::unavailable(BackendKind::Cli, failures.join("; ")))
    }
}
