//! In-process cropping of full-screen captures
//!
//! Used when a window capture had to go through a full-screen path whose
//! backend cannot restrict the capture to a region by itself.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use crate::{
    error::{CaptureError, ShotResult},
    model::Geometry,
};

/// Crops an encoded image to `region`, re-encoding the result as PNG
///
/// The region is intersected with the image bounds first (window geometry can
/// hang off the screen edge). Returns `Ok(None)` when nothing of the region
/// is on the image, in which case the caller keeps the uncropped capture.
pub fn crop_encoded(data: &[u8], region: Geometry) -> ShotResult<Option<Vec<u8>>> {
    let image = image::load_from_memory(data).map_err(|e| CaptureError::Image(e.to_string()))?;
    crop_image(&image, region)
}

/// Crops an already decoded image, see [`crop_encoded`]
pub fn crop_image(image: &DynamicImage, region: Geometry) -> ShotResult<Option<Vec<u8>>> {
    let Some((x, y, width, height)) = region.clamp_to(image.width(), image.height()) else {
        return Ok(None);
    };

    let cropped = image.crop_imm(x, y, width, height);

    let mut out = Vec::new();
    cropped
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| CaptureError::Image(e.to_string()))?;

    Ok(Some(out))
}

/// Encodes a synthetic gradient as PNG, for tests and mock backends
pub fn test_pattern_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        let r = ((x * 255) / width.max(1)) as u8;
        let g = ((y * 255) / height.max(1)) as u8;
        image::Rgba([r, g, 128, 255])
    });

    let mut out = Vec::new();
    // Writing a valid RGBA buffer to memory cannot fail
    let _ = image::DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut out), ImageFormat::Png);
    out
}
