//! Tracing subscriber setup for the server binary
//!
//! stdout carries the MCP protocol, so every log line goes to stderr.
//! `RUST_LOG` selects the filter, `SHOTTY_LOG_FORMAT=json` switches to
//! one JSON object per line.

use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "shotty_core=info,shotty_mcp_server=info";

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Reads `SHOTTY_LOG_FORMAT` through a variable provider
    pub fn from_env_with<F>(env_provider: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match env_provider("SHOTTY_LOG_FORMAT") {
            Some(value) if value.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Installs the global subscriber
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match LogFormat::from_env_with(|key| std::env::var(key).ok()) {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.with_ansi(false).init(),
    }
}
