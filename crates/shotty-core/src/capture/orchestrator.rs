//! Capture Orchestrator
//!
//! Given a [`CaptureRequest`], the orchestrator walks the adapters in fixed
//! priority order and returns the first success, or an aggregated
//! `CaptureUnavailable` carrying one cause per adapter.
//!
//! Window captures go through `resolve -> snapshot focus -> activate ->
//! capture -> restore focus`. Activation only happens when the chosen pixel
//! adapter cannot capture a single window by itself; the window is raised
//! and the full screen is captured, then cropped to the window geometry
//! when the compositor reports one. Focus is restored exactly once, before
//! returning, whether or not the capture worked.
//!
//! The whole sequence holds a desktop-wide lock and runs on a spawned task:
//! two interleaved activations would corrupt each other's restore, and a
//! caller dropping the future must not leave the wrong window focused.

use std::{path::Path, sync::Arc, time::Duration};

use tokio::sync::Mutex;

use super::{
    encoder::{PreparedCapture, ResultEncoder},
    registry::WindowRegistry,
    traits::DesktopAdapter,
};
use crate::{
    config::Config,
    error::{AdapterFailure, CaptureError, ShotResult},
    model::{
        AdapterDescriptor, BackendKind, CaptureOptions, CaptureRequest, CaptureResult,
        CaptureTarget, Operation, OutputMode, WindowHandle,
    },
    util::store::ScreenshotStore,
};

/// Validated pixels from a successful window capture attempt
struct WindowShot {
    prepared:     PreparedCapture,
    backend_used: String,
}

/// Records output the encoder could not use as a failure of `kind`
fn unusable_output(kind: BackendKind, error: &CaptureError) -> AdapterFailure {
    tracing::warn!(backend = %kind, error = %error, "Backend produced unusable output, trying next backend");
    AdapterFailure::from_error(kind, &CaptureError::unavailable(kind, format!("unusable output: {}", error)))
}

/// Selects, sequences and falls back across desktop adapters
#[derive(Clone)]
pub struct CaptureOrchestrator {
    adapters:     Arc<[Arc<dyn DesktopAdapter>]>,
    registry:     WindowRegistry,
    store:        Arc<ScreenshotStore>,
    encoder:      ResultEncoder,
    focus_settle: Duration,
    desktop:      Arc<Mutex<()>>,
}

impl CaptureOrchestrator {
    /// Creates an orchestrator over `adapters`, writing into `store`
    ///
    /// Adapters are ordered by their priority rank; the order they are
    /// passed in does not matter.
    pub fn new(
        mut adapters: Vec<Arc<dyn DesktopAdapter>>,
        store: ScreenshotStore,
        mode: OutputMode,
    ) -> ShotResult<Self> {
        adapters.sort_by_key(|a| a.capability().priority);
        let encoder = ResultEncoder::new(store.root(), mode)?;

        Ok(Self {
            registry: WindowRegistry::new(adapters.clone()),
            adapters: adapters.into(),
            store: Arc::new(store),
            encoder,
            focus_settle: Duration::from_millis(crate::config::FOCUS_SETTLE_MS),
            desktop: Arc::new(Mutex::new(())),
        })
    }

    /// Builds the production adapter set from `config`
    pub fn from_config(config: &Config) -> ShotResult<Self> {
        let store = ScreenshotStore::open(&config.screenshot_dir)?;
        Ok(Self::new(super::default_adapters(config), store, config.output_mode)?
            .with_focus_settle(config.focus_settle))
    }

    /// Sets the wait between activating a window and capturing it
    pub fn with_focus_settle(mut self, focus_settle: Duration) -> Self {
        self.focus_settle = focus_settle;
        self
    }

    /// Canonical screenshot directory
    pub fn screenshot_dir(&self) -> &Path {
        self.store.root()
    }

    /// Configured adapters in priority order, for diagnostics
    pub fn adapters(&self) -> Vec<AdapterDescriptor> {
        self.adapters
            .iter()
            .map(|a| {
                let capability = a.capability();
                AdapterDescriptor {
                    name:       a.kind().to_string(),
                    priority:   capability.priority,
                    operations: capability.operations(),
                }
            })
            .collect()
    }

    /// Lists windows through the registry
    pub async fn list_windows(&self) -> ShotResult<Vec<WindowHandle>> {
        let _desktop = self.desktop.lock().await;
        Ok(self.registry.list().await?.windows)
    }

    /// Runs one capture request to completion
    ///
    /// The work is detached from the caller: if the returned future is
    /// dropped, the capture (and any focus restoration) still finishes.
    pub async fn capture(&self, request: CaptureRequest) -> ShotResult<CaptureResult> {
        let this = self.clone();
        tokio::spawn(async move { this.run(request).await })
            .await
            .map_err(|e| CaptureError::Internal(format!("capture task did not complete: {}", e)))?
    }

    async fn run(&self, request: CaptureRequest) -> ShotResult<CaptureResult> {
        let _desktop = self.desktop.lock().await;

        match &request.target {
            CaptureTarget::FullScreen => self.capture_full_screen(&request).await,
            CaptureTarget::Window(id) => self.capture_window(id, request.include_cursor).await,
        }
    }

    async fn capture_full_screen(&self, request: &CaptureRequest) -> ShotResult<CaptureResult> {
        let dest = self.store.full_screen_path();
        let opts = CaptureOptions {
            include_cursor: request.include_cursor,
            region:         request.area,
        };
        let mut causes = Vec::with_capacity(self.adapters.len());

        for adapter in self.adapters.iter() {
            let kind = adapter.kind();
            if !adapter.capability().capture_full {
                causes.push(AdapterFailure::unsupported(kind, Operation::CaptureFull));
                continue;
            }

            let captured = match adapter.capture_full_screen(&dest, &opts).await {
                Ok(captured) => captured,
                Err(e) => {
                    tracing::warn!(backend = %kind, error = %e, "Full-screen capture failed, trying next backend");
                    causes.push(AdapterFailure::from_error(kind, &e));
                    continue;
                }
            };

            match self.encoder.prepare(captured, opts.region).await {
                Ok(prepared) => {
                    tracing::info!(backend = %kind, "Full-screen capture succeeded");
                    return self.encoder.encode(prepared, &dest, kind.to_string()).await;
                }
                Err(e @ CaptureError::PathEscape { .. }) => return Err(e),
                Err(e) => causes.push(unusable_output(kind, &e)),
            }
        }

        tracing::error!("Every backend failed to capture the screen");
        Err(CaptureError::CaptureUnavailable { causes })
    }

    async fn capture_window(&self, window_id: &str, include_cursor: bool) -> ShotResult<CaptureResult> {
        let handle = self.registry.resolve(window_id).await?;
        let activator = self.activator_for(&handle);

        let previous = match activator {
            Some(index) => match self.adapters[index].active_window().await {
                Ok(previous) => previous,
                Err(e) => {
                    tracing::warn!(error = %e, "Could not read the focused window, focus will not be restored");
                    None
                }
            },
            None => None,
        };

        let dest = self.store.window_path(&handle.id);
        let (outcome, activated) = self.attempt_window(&handle, activator, include_cursor, &dest).await;

        if let (true, Some(index), Some(previous)) = (activated, activator, previous.as_deref()) {
            if previous != handle.id {
                self.restore_focus(index, previous).await;
            }
        }

        let shot = outcome?;
        self.encoder.encode(shot.prepared, &dest, shot.backend_used).await
    }

    /// Tries every adapter for a window capture
    ///
    /// Returns the outcome plus whether the target was activated, so the
    /// caller can restore focus on both paths.
    async fn attempt_window(
        &self,
        handle: &WindowHandle,
        activator: Option<usize>,
        include_cursor: bool,
        dest: &Path,
    ) -> (ShotResult<WindowShot>, bool) {
        let mut slots: Vec<Option<AdapterFailure>> = vec![None; self.adapters.len()];
        let mut activated = false;
        let mut activation_tried = false;
        let mut geometry = None;

        for (index, adapter) in self.adapters.iter().enumerate() {
            let kind = adapter.kind();
            let capability = adapter.capability();

            if capability.capture_window {
                let opts = CaptureOptions {
                    include_cursor,
                    region: None,
                };
                let captured = match adapter.capture_window(handle, dest, &opts).await {
                    Ok(captured) => captured,
                    Err(e) => {
                        tracing::warn!(backend = %kind, error = %e, "Direct window capture failed");
                        slots[index] = Some(AdapterFailure::from_error(kind, &e));
                        continue;
                    }
                };
                match self.encoder.prepare(captured, None).await {
                    Ok(prepared) => {
                        tracing::info!(backend = %kind, window_id = %handle.id, "Direct window capture succeeded");
                        let shot = WindowShot {
                            prepared,
                            backend_used: kind.to_string(),
                        };
                        return (Ok(shot), activated);
                    }
                    Err(e @ CaptureError::PathEscape { .. }) => return (Err(e), activated),
                    Err(e) => {
                        slots[index] = Some(unusable_output(kind, &e));
                        continue;
                    }
                }
            }

            if !capability.capture_full {
                continue;
            }

            if let (Some(act_index), false) = (activator, activation_tried) {
                activation_tried = true;
                let act = &self.adapters[act_index];
                match act.activate_window(&handle.id).await {
                    Ok(()) => {
                        activated = true;
                        tokio::time::sleep(self.focus_settle).await;
                        geometry = act.window_geometry(&handle.id).await.unwrap_or_else(|e| {
                            tracing::warn!(error = %e, "Window geometry unavailable, capturing the full screen");
                            None
                        });
                    }
                    Err(e) => {
                        tracing::warn!(backend = %act.kind(), error = %e, "Activation failed, capturing unfocused");
                        let mut failure = AdapterFailure::from_error(act.kind(), &e);
                        failure.reason = format!("window activation failed: {}", failure.reason);
                        if slots[act_index].is_none() {
                            slots[act_index] = Some(failure);
                        }
                    }
                }
            }

            let opts = CaptureOptions {
                include_cursor,
                region: geometry,
            };
            let captured = match adapter.capture_full_screen(dest, &opts).await {
                Ok(captured) => captured,
                Err(e) => {
                    tracing::warn!(backend = %kind, error = %e, "Full-screen capture failed, trying next backend");
                    slots[index] = Some(AdapterFailure::from_error(kind, &e));
                    continue;
                }
            };
            match self.encoder.prepare(captured, geometry).await {
                Ok(prepared) => {
                    let backend_used = match (activated, activator) {
                        (true, Some(act_index)) => {
                            format!("{}-via-{}-activation", kind, self.adapters[act_index].kind())
                        }
                        _ => format!("{}-unfocused", kind),
                    };
                    tracing::info!(backend = %backend_used, window_id = %handle.id, "Window capture succeeded");
                    let shot = WindowShot {
                        prepared,
                        backend_used,
                    };
                    return (Ok(shot), activated);
                }
                Err(e @ CaptureError::PathEscape { .. }) => return (Err(e), activated),
                Err(e) => slots[index] = Some(unusable_output(kind, &e)),
            }
        }

        let causes = slots
            .into_iter()
            .zip(self.adapters.iter())
            .map(|(slot, adapter)| {
                slot.unwrap_or_else(|| AdapterFailure::unsupported(adapter.kind(), Operation::CaptureWindow))
            })
            .collect();

        tracing::error!(window_id = %handle.id, "Every backend failed to capture the window");
        (Err(CaptureError::CaptureUnavailable { causes }), activated)
    }

    /// Adapter that raises `handle`: its own source first, then any activator
    fn activator_for(&self, handle: &WindowHandle) -> Option<usize> {
        self.adapters
            .iter()
            .position(|a| a.capability().activate && a.kind() == handle.source_backend)
            .or_else(|| self.adapters.iter().position(|a| a.capability().activate))
    }

    async fn restore_focus(&self, activator: usize, previous: &str) {
        let adapter = &self.adapters[activator];
        match adapter.activate_window(previous).await {
            Ok(()) => tracing::debug!(window_id = %previous, "Restored focus"),
            Err(e) => tracing::warn!(window_id = %previous, error = %e, "Could not restore focus"),
        }
    }
}
