//! Session detection for shotty
//!
//! Reports the operating system, the display server (Wayland or X11) and the
//! desktop environment name. Used only for diagnostics; adapter selection
//! never depends on it, every adapter checks its own backend.

use std::env;

use crate::model::{DisplayServer, PlatformInfo};

/// Detects the current platform and display session
///
/// # Examples
///
/// ```
/// use shotty_core::util::detect::detect_platform;
///
/// let platform = detect_platform();
/// println!("Running on {} ({})", platform.os, platform.display.as_str());
/// ```
pub fn detect_platform() -> PlatformInfo {
    detect_platform_with_env(|key| env::var(key).ok())
}

/// Platform detection with a custom environment variable provider
fn detect_platform_with_env<F>(env_provider: F) -> PlatformInfo
where
    F: Fn(&str) -> Option<String>,
{
    let desktop = env_provider("XDG_CURRENT_DESKTOP").filter(|d| !d.is_empty());

    PlatformInfo {
        os: env::consts::OS.to_string(),
        display: detect_display_server(&env_provider),
        desktop,
    }
}

/// Detects the display server, preferring Wayland when both are set
fn detect_display_server<F>(env_provider: &F) -> DisplayServer
where
    F: Fn(&str) -> Option<String>,
{
    if env_provider("WAYLAND_DISPLAY").is_some_and(|v| !v.is_empty()) {
        return DisplayServer::Wayland;
    }

    if env_provider("XDG_SESSION_TYPE").is_some_and(|v| v.eq_ignore_ascii_case("wayland")) {
        return DisplayServer::Wayland;
    }

    if env_provider("DISPLAY").is_some_and(|v| !v.is_empty()) {
        return DisplayServer::X11;
    }

    DisplayServer::None
}
