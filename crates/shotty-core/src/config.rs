//! Centralized defaults and runtime configuration.
//!
//! Timeouts and paths have compiled-in defaults that can be overridden at
//! runtime via environment variables. Invalid values fall back to the
//! default instead of failing startup.
//!
//! | Environment Variable | Default | Description |
//! |---------------------|---------|-------------|
//! | `SHOTTY_SCREENSHOT_DIR` | `~/Pictures/shotty` | Output root for captures |
//! | `SHOTTY_OUTPUT_MODE` | `inline` | `inline` or `path` |
//! | `SHOTTY_CLI_TIMEOUT_MS` | 10000 | Screenshot tool subprocess timeout |
//! | `SHOTTY_RPC_TIMEOUT_MS` | 5000 | Compositor D-Bus call timeout |
//! | `SHOTTY_PORTAL_TIMEOUT_SECS` | 30 | Portal request timeout |
//! | `SHOTTY_FOCUS_SETTLE_MS` | 200 | Wait after activating a window |
//!
//! The portal timeout is the longest because the request may sit on a
//! consent dialog until a human answers it.

use std::{env, path::PathBuf, time::Duration};

use crate::model::OutputMode;

/// Timeout for one screenshot utility invocation.
pub const CLI_TIMEOUT_MS: u64 = 10_000;

/// Timeout for one compositor extension call.
pub const RPC_TIMEOUT_MS: u64 = 5_000;

/// Timeout for a permissioned portal request.
pub const PORTAL_TIMEOUT_SECS: u64 = 30;

/// Delay between activating a window and capturing the screen, so the
/// compositor has drawn the raised window.
pub const FOCUS_SETTLE_MS: u64 = 200;

/// Directory name under `~/Pictures` used when no override is set.
pub const SCREENSHOT_DIR_NAME: &str = "shotty";

/// Process-wide configuration, built once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub screenshot_dir: PathBuf,
    pub output_mode:    OutputMode,
    pub cli_timeout:    Duration,
    pub rpc_timeout:    Duration,
    pub portal_timeout: Duration,
    pub focus_settle:   Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            screenshot_dir: default_screenshot_dir(|key| env::var(key).ok()),
            output_mode:    OutputMode::Inline,
            cli_timeout:    Duration::from_millis(CLI_TIMEOUT_MS),
            rpc_timeout:    Duration::from_millis(RPC_TIMEOUT_MS),
            portal_timeout: Duration::from_secs(PORTAL_TIMEOUT_SECS),
            focus_settle:   Duration::from_millis(FOCUS_SETTLE_MS),
        }
    }
}

impl Config {
    /// Reads configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Reads configuration through a custom variable provider
    pub fn from_env_with<F>(env_provider: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let screenshot_dir = env_provider("SHOTTY_SCREENSHOT_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| default_screenshot_dir(&env_provider));

        let output_mode = match env_provider("SHOTTY_OUTPUT_MODE") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring SHOTTY_OUTPUT_MODE: {}", e);
                OutputMode::Inline
            }),
            None => OutputMode::Inline,
        };

        Self {
            screenshot_dir,
            output_mode,
            cli_timeout: Duration::from_millis(get_u64(
                &env_provider,
                "SHOTTY_CLI_TIMEOUT_MS",
                CLI_TIMEOUT_MS,
            )),
            rpc_timeout: Duration::from_millis(get_u64(
                &env_provider,
                "SHOTTY_RPC_TIMEOUT_MS",
                RPC_TIMEOUT_MS,
            )),
            portal_timeout: Duration::from_secs(get_u64(
                &env_provider,
                "SHOTTY_PORTAL_TIMEOUT_SECS",
                PORTAL_TIMEOUT_SECS,
            )),
            focus_settle: Duration::from_millis(get_u64(
                &env_provider,
                "SHOTTY_FOCUS_SETTLE_MS",
                FOCUS_SETTLE_MS,
            )),
        }
    }
}

/// Helper to get a number from a variable or fall back to default.
fn get_u64<F>(env_provider: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    env_provider(key)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn default_screenshot_dir<F>(env_provider: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    match env_provider("HOME").filter(|h| !h.is_empty()) {
        Some(home) => PathBuf::from(home).join("Pictures").join(SCREENSHOT_DIR_NAME),
        None => env::temp_dir().join(SCREENSHOT_DIR_NAME),
    }
}
