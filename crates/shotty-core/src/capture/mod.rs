//! Desktop adapters and the capture pipeline built on them
//!
//! # Architecture
//!
//! Every backend implements [`DesktopAdapter`] and declares what it can do
//! through a static [`BackendCapability`](crate::model::BackendCapability).
//! The [`CaptureOrchestrator`] owns a priority-ordered adapter list and
//! drives everything else:
//!
//! - [`WindowRegistry`] - canonical window listing, first answering adapter wins
//! - [`CaptureOrchestrator`] - adapter selection, activation and focus restore
//! - [`ResultEncoder`] - containment check and inline/path packaging
//!
//! ## Backends
//!
//! | Adapter | list | capture_full | capture_window | activate | priority |
//! |---------|------|--------------|----------------|----------|----------|
//! | [`PortalAdapter`]    | - | ✓ | - | - | 0 |
//! | [`ExtensionAdapter`] | ✓ | - | - | ✓ | 1 |
//! | [`CliAdapter`]       | - | ✓ | - | - | 2 |
//! | [`ProcessListAdapter`] | ✓ | - | - | - | 3 |
//! | [`MockAdapter`]      | * | * | * | * | per kind |

use std::sync::Arc;

use crate::config::Config;

pub mod cli;
pub mod encoder;
pub mod extension;
pub mod mock;
pub mod orchestrator;
pub mod portal;
pub mod process;
pub mod processes;
pub mod registry;
pub mod traits;

pub use cli::{CliAdapter, CliTool, CliToolKind};
pub use encoder::ResultEncoder;
pub use extension::ExtensionAdapter;
pub use mock::MockAdapter;
pub use orchestrator::CaptureOrchestrator;
pub use portal::PortalAdapter;
pub use processes::ProcessListAdapter;
pub use registry::{WindowListing, WindowRegistry};
pub use traits::DesktopAdapter;

/// Production adapter set: portal, compositor extension, screenshot tools,
/// process list
pub fn default_adapters(config: &Config) -> Vec<Arc<dyn DesktopAdapter>> {
    vec![
        Arc::new(PortalAdapter::new(config.portal_timeout)),
        Arc::new(ExtensionAdapter::new(config.rpc_timeout)),
        Arc::new(CliAdapter::new(config.cli_timeout)),
        Arc::new(ProcessListAdapter::new(config.rpc_timeout)),
    ]
}

/// Demo adapter set for running without a desktop session
///
/// Mirrors the production shapes: the portal is missing, the extension
/// reports two windows and the CLI captures synthetic images.
pub fn mock_adapters() -> Vec<Arc<dyn DesktopAdapter>> {
    vec![
        Arc::new(MockAdapter::portal().unavailable("no portal in mock mode")),
        Arc::new(
            MockAdapter::extension()
                .with_windows(&[("1001", "Editor"), ("1002", "Terminal")])
                .with_focused("1002"),
        ),
        Arc::new(MockAdapter::cli()),
        Arc::new(MockAdapter::processes().with_windows(&[("firefox-4182", "Firefox")])),
    ]
}
