//! Screenshot output directory management
//!
//! Every capture lands as one file in a single flat directory. There is no
//! index or manifest: files are named from a timestamp plus a per-process
//! sequence number and live until something outside this process deletes
//! them.
//!
//! # Examples
//!
//! ```
//! use shotty_core::util::store::ScreenshotStore;
//!
//! let dir = std::env::temp_dir().join("shotty-doc-store");
//! let store = ScreenshotStore::open(&dir).unwrap();
//!
//! let full = store.full_screen_path();
//! let window = store.window_path("1234");
//! assert!(full.starts_with(store.root()));
//! assert_ne!(full, window);
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use chrono::Utc;

use crate::error::{CaptureError, ShotResult};

/// Allocates file paths inside the screenshot directory
#[derive(Debug)]
pub struct ScreenshotStore {
    root: PathBuf,
    seq:  AtomicU64,
}

impl ScreenshotStore {
    /// Opens (and creates, if needed) the screenshot directory
    ///
    /// The stored root is canonical, so every allocated path is already
    /// symlink-free up to the file name.
    pub fn open(root: impl AsRef<Path>) -> ShotResult<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(CaptureError::Io)?;
        let root = root.canonicalize().map_err(CaptureError::Io)?;

        tracing::debug!("Screenshot directory ready: {}", root.display());

        Ok(Self {
            root,
            seq: AtomicU64::new(0),
        })
    }

    /// Canonical screenshot directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for the next full-screen capture
    pub fn full_screen_path(&self) -> PathBuf {
        self.allocate("screenshot_full")
    }

    /// Path for the next capture of `window_id`
    ///
    /// The id is reduced to `[A-Za-z0-9_-]` so it can never introduce path
    /// separators or traversal components into the file name.
    pub fn window_path(&self, window_id: &str) -> PathBuf {
        let safe_id = sanitize_component(window_id);
        self.allocate(&format!("screenshot_window_{}", safe_id))
    }

    fn allocate(&self, prefix: &str) -> PathBuf {
        let timestamp = Utc::now().format("%Y%m%d-%H%M%S%.3f");
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.root.join(format!("{}_{}_{}.png", prefix, timestamp, seq))
    }
}

/// Replaces everything outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(64)
        .collect();

    if cleaned.is_empty() { "unnamed".to_string() } else { cleaned }
}
