//! Normalization of raw captures into a [`CaptureResult`]
//!
//! Every file the pipeline reads or writes goes through
//! [`ResultEncoder::ensure_contained`]: the path is resolved (symlinks
//! included) and must land strictly inside the screenshot directory.
//! Anything else is a [`CaptureError::PathEscape`], never a silent fallback.
//!
//! Encoding is split in two so the orchestrator can reject unusable output
//! per adapter: [`ResultEncoder::prepare`] loads, decodes and crops, and
//! [`ResultEncoder::encode`] persists and packages.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::io::AsyncWriteExt;

use crate::{
    error::{CaptureError, ShotResult},
    model::{CapturePayload, CaptureResult, Captured, Geometry, OutputMode, RawCapture},
    util::crop::crop_image,
};

/// Adapter output that decoded as an image and is ready to be stored
#[derive(Debug)]
pub struct PreparedCapture {
    data:       Vec<u8>,
    mime_type:  &'static str,
    /// File the adapter wrote, when it still holds exactly `data`
    source:     Option<PathBuf>,
    /// File the adapter wrote whose content was replaced by a crop
    superseded: Option<PathBuf>,
}

/// Packages capture output as inline bytes or a stored path
#[derive(Debug, Clone)]
pub struct ResultEncoder {
    root: PathBuf,
    mode: OutputMode,
}

impl ResultEncoder {
    /// Creates an encoder rooted at an existing directory
    pub fn new(root: impl AsRef<Path>, mode: OutputMode) -> ShotResult<Self> {
        let root = root.as_ref().canonicalize().map_err(|e| {
            CaptureError::Config(format!(
                "screenshot directory '{}' is not usable: {}",
                root.as_ref().display(),
                e
            ))
        })?;
        Ok(Self { root, mode })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn escape(&self, path: &Path) -> CaptureError {
        CaptureError::PathEscape {
            path: path.to_path_buf(),
            root: self.root.clone(),
        }
    }

    /// Resolves `path` and checks it is a strict descendant of the root
    ///
    /// A path that does not exist yet is checked through its parent
    /// directory, which must exist. A symlink that cannot be resolved
    /// (dangling or looping) is rejected.
    pub fn ensure_contained(&self, path: &Path) -> ShotResult<PathBuf> {
        let resolved = match path.canonicalize() {
            Ok(resolved) => resolved,
            Err(_) => {
                if path.symlink_metadata().is_ok() {
                    tracing::warn!("Rejected unresolvable link {}", path.display());
                    return Err(self.escape(path));
                }
                let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
                    return Err(self.escape(path));
                };
                if name == ".." {
                    return Err(self.escape(path));
                }
                parent.canonicalize().map_err(|_| self.escape(path))?.join(name)
            }
        };

        if resolved != self.root && resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            tracing::warn!(
                "Rejected capture path {} (resolves to {}, outside {})",
                path.display(),
                resolved.display(),
                self.root.display()
            );
            Err(self.escape(path))
        }
    }

    /// Loads, decodes and (when `region` is set and the adapter did not
    /// apply it) crops what an adapter produced
    ///
    /// `PathEscape` means the adapter wrote outside the root. Any other
    /// error means the output is unusable and the next adapter should run.
    pub async fn prepare(&self, captured: Captured, region: Option<Geometry>) -> ShotResult<PreparedCapture> {
        let region_applied = captured.region_applied;
        let (data, source) = match captured.raw {
            RawCapture::Bytes(data) => (data, None),
            RawCapture::File(path) => {
                let resolved = self.ensure_contained(&path)?;
                (tokio::fs::read(&resolved).await?, Some(resolved))
            }
        };

        if data.is_empty() {
            return Err(CaptureError::Image("capture produced no data".to_string()));
        }

        let format = image::guess_format(&data)
            .map_err(|e| CaptureError::Image(format!("unrecognized image data: {}", e)))?;
        let image = image::load_from_memory_with_format(&data, format)
            .map_err(|e| CaptureError::Image(format!("undecodable {:?} data: {}", format, e)))?;

        let prepared = PreparedCapture {
            data,
            mime_type: format.to_mime_type(),
            source,
            superseded: None,
        };

        let Some(region) = region.filter(|_| !region_applied) else {
            return Ok(prepared);
        };

        match crop_image(&image, region)? {
            Some(cropped) => Ok(PreparedCapture {
                data:       cropped,
                mime_type:  "image/png",
                source:     None,
                superseded: prepared.source,
            }),
            None => {
                tracing::warn!(?region, "Region lies outside the captured image, keeping the full capture");
                Ok(prepared)
            }
        }
    }

    /// Builds the result in the configured mode, storing at `dest` if needed
    ///
    /// An adapter file that was used as-is is returned where it lies. Bytes
    /// and cropped images are written to `dest`, replacing the adapter's
    /// uncropped file.
    pub async fn encode(
        &self,
        prepared: PreparedCapture,
        dest: &Path,
        backend_used: impl Into<String>,
    ) -> ShotResult<CaptureResult> {
        let stored = match prepared.source {
            Some(source) => source,
            None => {
                let stored = self.write_new(dest, &prepared.data).await?;
                if let Some(old) = prepared.superseded.filter(|old| *old != stored) {
                    if let Err(e) = tokio::fs::remove_file(&old).await {
                        tracing::debug!(path = %old.display(), error = %e, "Could not remove uncropped capture");
                    }
                }
                stored
            }
        };

        let payload = match self.mode {
            OutputMode::Inline => CapturePayload::Inline(prepared.data),
            OutputMode::Path => CapturePayload::Stored(stored),
        };

        Ok(CaptureResult {
            payload,
            mime_type: prepared.mime_type,
            backend_used: backend_used.into(),
        })
    }

    /// Creates `dest` exclusively, so no existing link is ever followed
    async fn write_new(&self, dest: &Path, data: &[u8]) -> ShotResult<PathBuf> {
        self.ensure_contained(dest)?;

        // Only a regular file (the adapter's own output) may be replaced
        match tokio::fs::symlink_metadata(dest).await {
            Ok(meta) if meta.file_type().is_file() => tokio::fs::remove_file(dest).await?,
            Ok(_) => return Err(self.escape(dest)),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => self.escape(dest),
                _ => CaptureError::Io(e),
            })?;
        file.write_all(data).await?;
        file.flush().await?;

        self.ensure_contained(dest)
    }
}
