//! Window Registry Normalizer
//!
//! Turns each backend's window records into canonical [`WindowHandle`]s.
//! Sources are never merged: the highest-priority adapter that answers
//! without error owns the whole listing, because ids from different
//! backends are not comparable. A successful empty answer is kept as is,
//! an empty desktop is a valid state.

use std::{collections::HashSet, sync::Arc};

use super::traits::DesktopAdapter;
use crate::{
    error::{AdapterFailure, CaptureError, ShotResult},
    model::{BackendKind, Operation, WindowHandle},
};

/// Windows reported by one adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowListing {
    pub windows: Vec<WindowHandle>,
    /// Adapter that produced the listing
    pub source:  BackendKind,
}

impl WindowListing {
    pub fn find(&self, id: &str) -> Option<&WindowHandle> {
        self.windows.iter().find(|w| w.id == id)
    }
}

/// Queries adapters for windows in fixed priority order
#[derive(Clone)]
pub struct WindowRegistry {
    adapters: Vec<Arc<dyn DesktopAdapter>>,
}

impl WindowRegistry {
    /// Creates a registry over `adapters`, ordering them by priority rank
    pub fn new(mut adapters: Vec<Arc<dyn DesktopAdapter>>) -> Self {
        adapters.sort_by_key(|a| a.capability().priority);
        Self { adapters }
    }

    /// Lists windows from the first adapter that answers
    ///
    /// Fails with `NoWindowSourceAvailable` only when every adapter failed or
    /// none can list; the error carries one cause per adapter.
    pub async fn list(&self) -> ShotResult<WindowListing> {
        let mut causes = Vec::with_capacity(self.adapters.len());

        for adapter in &self.adapters {
            let kind = adapter.kind();
            if !adapter.capability().list {
                causes.push(AdapterFailure::unsupported(kind, Operation::List));
                continue;
            }

            match adapter.list_windows().await {
                Ok(records) => {
                    let windows = normalize(records, kind);
                    tracing::debug!(backend = %kind, count = windows.len(), "Window listing succeeded");
                    return Ok(WindowListing { windows, source: kind });
                }
                Err(e) => {
                    tracing::warn!(backend = %kind, error = %e, "Window listing failed, trying next backend");
                    causes.push(AdapterFailure::from_error(kind, &e));
                }
            }
        }

        tracing::error!("No backend could list windows");
        Err(CaptureError::NoWindowSourceAvailable { causes })
    }

    /// Re-lists windows and returns the handle for `window_id`
    pub async fn resolve(&self, window_id: &str) -> ShotResult<WindowHandle> {
        let listing = self.list().await?;
        listing
            .find(window_id)
            .cloned()
            .ok_or_else(|| CaptureError::WindowNotFound {
                window_id: window_id.to_string(),
                listed_by: listing.source,
            })
    }
}

/// Stamps every record with its source and drops repeated ids
///
/// Backends occasionally report the same window twice (e.g. a transient
/// re-map); the first occurrence is kept so ordering stays stable.
fn normalize(records: Vec<WindowHandle>, source: BackendKind) -> Vec<WindowHandle> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|w| !w.id.is_empty() && seen.insert(w.id.clone()))
        .map(|w| WindowHandle {
            id: w.id,
            title: w.title.trim().to_string(),
            source_backend: source,
        })
        .collect()
}
