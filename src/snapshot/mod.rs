//! Snapshot capture: targets, options, raster output and renderer backends
//!
//! Capture backends implement the synchronous [`Capturer`] trait. The export
//! path talks to the async [`SnapshotRenderer`] trait, which
//! [`CaptureWorker`] provides for any `Capturer` by running it on its own
//! thread.

use crate::{Error, Result};
use base64::Engine as Base64Engine;
use futures::future::BoxFuture;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub mod file;
pub mod worker;

#[cfg(feature = "cdp")]
pub mod cdp;

pub use file::FileCapturer;
pub use worker::CaptureWorker;

/// The visual root to capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    /// A snapshot already rendered to an image file
    File(PathBuf),
    /// An element of a live page, located by CSS selector
    Element { url: String, selector: String },
}

impl fmt::Display for CaptureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureTarget::File(path) => write!(f, "file {}", path.display()),
            CaptureTarget::Element { url, selector } => {
                write!(f, "element '{}' on {}", selector, url)
            }
        }
    }
}

/// An opaque RGB color, written `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(Error::ConfigError(format!("'{}' is not a #rrggbb color", s)));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| Error::ConfigError(format!("'{}' is not a #rrggbb color", s)))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Options forwarded to the renderer for each capture
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    /// Fill behind transparent regions; `None` keeps transparency
    pub background: Option<Rgb>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            background: Some(Rgb::new(0x11, 0x18, 0x27)),
        }
    }
}

/// Raster output of a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterImage {
    /// Encoded image bytes (PNG or JPEG)
    Encoded(Vec<u8>),
    /// A `data:` URL carrying base64 image bytes
    DataUrl(String),
}

impl RasterImage {
    /// Encoded image bytes, unpacking a data URL if needed.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            RasterImage::Encoded(bytes) => Ok(bytes),
            RasterImage::DataUrl(url) => {
                let rest = url
                    .strip_prefix("data:")
                    .ok_or_else(|| Error::ImageDecodeFailed("not a data URL".into()))?;
                let (meta, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| Error::ImageDecodeFailed("data URL has no payload".into()))?;
                if !meta.ends_with(";base64") {
                    return Err(Error::ImageDecodeFailed(format!(
                        "unsupported data URL encoding '{}'",
                        meta
                    )));
                }
                base64::engine::general_purpose::STANDARD
                    .decode(payload.trim())
                    .map_err(|e| Error::ImageDecodeFailed(format!("invalid base64 payload: {}", e)))
            }
        }
    }
}

/// Synchronous capture backend
///
/// Implementations may hold resources that are not `Send` (a browser tab,
/// for instance); [`CaptureWorker`] creates and drives them on one thread.
pub trait Capturer {
    /// Capture `target` into a single raster image
    fn capture(&mut self, target: &CaptureTarget, options: &CaptureOptions) -> Result<RasterImage>;

    /// Release backend resources
    fn close(self) -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Async snapshot renderer consumed by the export orchestrator
pub trait SnapshotRenderer: Send + Sync {
    fn capture<'a>(
        &'a self,
        target: &'a CaptureTarget,
        options: &'a CaptureOptions,
    ) -> BoxFuture<'a, Result<RasterImage>>;
}
