//! File-backed capturer for snapshots rendered ahead of time.

use super::{CaptureOptions, CaptureTarget, Capturer, RasterImage, Rgb};
use crate::{Error, Result};
use image::{DynamicImage, RgbImage};
use log::debug;
use std::io::Cursor;

/// Reads the snapshot from disk and applies the background fill.
#[derive(Debug, Default)]
pub struct FileCapturer;

impl FileCapturer {
    pub fn new() -> Self {
        FileCapturer
    }
}

impl Capturer for FileCapturer {
    fn capture(&mut self, target: &CaptureTarget, options: &CaptureOptions) -> Result<RasterImage> {
        let path = match target {
            CaptureTarget::File(path) => path,
            other => {
                return Err(Error::SnapshotFailed(format!(
                    "cannot capture {} without the `cdp` feature",
                    other
                )))
            }
        };

        if !path.is_file() {
            return Err(Error::CaptureTargetMissing(path.display().to_string()));
        }

        let bytes = std::fs::read(path).map_err(|e| {
            Error::SnapshotFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;
        debug!("read {} bytes of snapshot from {}", bytes.len(), path.display());

        match options.background {
            Some(bg) => flatten_onto(bytes, bg),
            None => Ok(RasterImage::Encoded(bytes)),
        }
    }
}

/// Composite translucent pixels over `background` and re-encode as PNG.
/// Images without an alpha channel are returned unchanged.
pub fn flatten_onto(bytes: Vec<u8>, background: Rgb) -> Result<RasterImage> {
    let img = image::load_from_memory(&bytes)
        .map_err(|e| Error::SnapshotFailed(format!("Unreadable snapshot: {}", e)))?;
    if !img.color().has_alpha() {
        return Ok(RasterImage::Encoded(bytes));
    }

    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    let bg = [background.r, background.g, background.b];
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let alpha = src.0[3] as u32;
        for c in 0..3 {
            let blended = src.0[c] as u32 * alpha + bg[c] as u32 * (255 - alpha);
            dst.0[c] = ((blended + 127) / 255) as u8;
        }
    }

    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(out)
        .write_to(&mut encoded, image::ImageFormat::Png)
        .map_err(|e| Error::SnapshotFailed(format!("Failed to encode flattened snapshot: {}", e)))?;
    Ok(RasterImage::Encoded(encoded.into_inner()))
}
