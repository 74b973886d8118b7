//! Process-list window listing, the last resort when no compositor API answers
//!
//! Running processes are matched against a list of well-known GUI programs.
//! The result is a rough "what is open" view: one entry per program, with an
//! id built from the program name and PID. These ids cannot be activated or
//! captured directly; a window capture on one falls through to an unfocused
//! full-screen capture.

use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;

use super::{process::run_command, traits::DesktopAdapter};
use crate::{
    error::{CaptureError, ShotResult},
    model::{BackendCapability, BackendKind, WindowHandle},
};

/// Program names that usually own a top-level window (substring match)
const GUI_PROGRAMS: &[&str] = &[
    "firefox", "chrome", "chromium", "brave", "opera",
    "gnome-terminal", "konsole", "xterm", "alacritty",
    "code", "codium", "atom", "sublime_text", "vim", "emacs",
    "nautilus", "dolphin", "thunar", "ranger",
    "gimp", "inkscape", "blender", "darktable",
    "libreoffice", "writer", "calc", "impress",
    "evince", "okular", "zathura",
    "vlc", "totem", "mpv", "rhythmbox",
    "discord", "slack", "telegram", "signal",
    "thunderbird", "evolution", "claws-mail",
];

/// Lists GUI programs from `ps`
#[derive(Debug, Clone)]
pub struct ProcessListAdapter {
    program: String,
    timeout: Duration,
}

impl ProcessListAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "ps".to_string(),
            timeout,
        }
    }

    /// Uses a different `ps` executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

/// Turns `ps -eo pid=,args=` output into one handle per GUI program
///
/// Entries whose title-cased name was already seen are dropped, so several
/// processes of one browser show up once, under the first PID listed.
pub fn parse_process_table(stdout: &str) -> Vec<WindowHandle> {
    let mut seen = HashSet::new();
    let mut windows = Vec::new();

    for line in stdout.lines() {
        let mut fields = line.split_whitespace();
        let (Some(pid), Some(command)) = (fields.next(), fields.next()) else {
            continue;
        };
        if pid.parse::<u32>().is_err() {
            continue;
        }

        let name = command.rsplit('/').next().unwrap_or(command);
        let lower = name.to_lowercase();
        if !GUI_PROGRAMS.iter().any(|gui| lower.contains(gui)) {
            continue;
        }

        let title = title_case(name);
        if seen.insert(title.clone()) {
            windows.push(WindowHandle::new(format!("{}-{}", name, pid), title, BackendKind::Processes));
        }
    }

    windows
}

/// Upper-cases the first letter of every alphabetic run, lower-cases the rest
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut boundary = true;
    for c in name.chars() {
        if c.is_alphabetic() {
            if boundary {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            boundary = false;
        } else {
            out.push(c);
            boundary = true;
        }
    }
    out
}

#[async_trait]
impl DesktopAdapter for ProcessListAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Processes
    }

    fn capability(&self) -> BackendCapability {
        BackendCapability {
            list:           true,
            capture_full:   false,
            capture_window: false,
            activate:       false,
            native_region:  false,
            priority:       BackendKind::Processes.priority(),
        }
    }

    async fn list_windows(&self) -> ShotResult<Vec<WindowHandle>> {
        let args = vec!["-eo".to_string(), "pid=,args=".to_string()];
        let output = run_command(&self.program, &args, self.timeout)
            .await
            .map_err(|reason| CaptureError::unavailable(BackendKind::Processes, reason))?;

        if !output.success() {
            return Err(CaptureError::unavailable(
                BackendKind::Processes,
                format!("{} failed ({})", self.program, output.failure_summary()),
            ));
        }

        let windows = parse_process_table(&output.stdout);
        tracing::info!("Found {} GUI programs via the process list", windows.len());
        Ok(windows)
    }
}
