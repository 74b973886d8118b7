//! Shared test utilities for orchestrator integration tests
#![allow(dead_code)]

use std::{path::Path, sync::Arc, time::Duration};

use shotty_core::{
    capture::{CaptureOrchestrator, DesktopAdapter, MockAdapter},
    model::OutputMode,
    util::store::ScreenshotStore,
};
use tempfile::TempDir;

/// Three mock adapters behind one orchestrator, rooted in a temp directory
pub struct Harness {
    pub dir:          TempDir,
    pub portal:       Arc<MockAdapter>,
    pub extension:    Arc<MockAdapter>,
    pub cli:          Arc<MockAdapter>,
    pub orchestrator: CaptureOrchestrator,
}

impl Harness {
    pub fn new(portal: MockAdapter, extension: MockAdapter, cli: MockAdapter) -> Self {
        Self::with_mode(portal, extension, cli, OutputMode::Inline)
    }

    pub fn with_mode(portal: MockAdapter, extension: MockAdapter, cli: MockAdapter, mode: OutputMode) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let portal = Arc::new(portal);
        let extension = Arc::new(extension);
        let cli = Arc::new(cli);
        let orchestrator = orchestrator_over(
            dir.path(),
            vec![portal.clone(), extension.clone(), cli.clone()],
            mode,
        );
        Self {
            dir,
            portal,
            extension,
            cli,
            orchestrator,
        }
    }

    /// The reference desktop: portal missing, extension with two windows
    /// ("Terminal" focused), CLI working
    pub fn editor_and_terminal() -> Self {
        Self::new(
            MockAdapter::portal().unavailable("org.freedesktop.portal.Desktop not found"),
            MockAdapter::extension()
                .with_windows(&[("101", "Editor"), ("102", "Terminal")])
                .with_focused("102"),
            MockAdapter::cli(),
        )
    }

    pub fn root(&self) -> &Path {
        self.orchestrator.screenshot_dir()
    }

    /// Number of files in the screenshot directory
    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(self.root()).unwrap().count()
    }
}

pub fn orchestrator_over(dir: &Path, adapters: Vec<Arc<MockAdapter>>, mode: OutputMode) -> CaptureOrchestrator {
    let adapters: Vec<Arc<dyn DesktopAdapter>> =
        adapters.into_iter().map(|a| a as Arc<dyn DesktopAdapter>).collect();
    CaptureOrchestrator::new(adapters, ScreenshotStore::open(dir).unwrap(), mode)
        .unwrap()
        .with_focus_settle(Duration::ZERO)
}
