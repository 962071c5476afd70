//! Document writer surface: page geometry, image payloads and the writer trait

use crate::{Error, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

pub mod pdf;

pub use pdf::PdfWriter;

/// Points per millimetre (1 inch = 72 points = 25.4 mm)
pub const POINTS_PER_MM: f64 = 72.0 / 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Physical length unit for page geometry and draw calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Mm,
    Pt,
    In,
}

impl Unit {
    pub fn points_per_unit(self) -> f64 {
        match self {
            Unit::Mm => POINTS_PER_MM,
            Unit::Pt => 1.0,
            Unit::In => 72.0,
        }
    }
}

/// Standard paper sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
}

impl PageSize {
    /// Portrait (width, height) in millimetres
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            PageSize::A3 => (297.0, 420.0),
            PageSize::A4 => (210.0, 297.0),
            PageSize::A5 => (148.0, 210.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
        }
    }
}

/// Geometry a writer is constructed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    pub orientation: Orientation,
    pub unit: Unit,
    pub format: PageSize,
}

impl WriterOptions {
    /// Page (width, height) in `self.unit`
    pub fn page_dimensions(&self) -> (f64, f64) {
        let (w_mm, h_mm) = self.format.dimensions_mm();
        let (w_mm, h_mm) = match self.orientation {
            Orientation::Portrait => (w_mm, h_mm),
            Orientation::Landscape => (h_mm, w_mm),
        };
        let scale = POINTS_PER_MM / self.unit.points_per_unit();
        (w_mm * scale, h_mm * scale)
    }
}

macro_rules! parse_lowercase {
    ($ty:ty, $what:literal, { $($name:literal => $val:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.to_ascii_lowercase().as_str() {
                    $($name => Ok($val),)+
                    other => Err(Error::ConfigError(format!(
                        concat!("unknown ", $what, " '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

parse_lowercase!(Orientation, "orientation", {
    "portrait" => Orientation::Portrait,
    "landscape" => Orientation::Landscape,
});

parse_lowercase!(Unit, "unit", {
    "mm" => Unit::Mm,
    "pt" => Unit::Pt,
    "in" => Unit::In,
});

parse_lowercase!(PageSize, "page size", {
    "a3" => PageSize::A3,
    "a4" => PageSize::A4,
    "a5" => PageSize::A5,
    "letter" => PageSize::Letter,
    "legal" => PageSize::Legal,
});

/// Encoding of an image payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
        })
    }
}

/// Encoded image bytes shared between draw calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    format: ImageFormat,
    bytes: Arc<[u8]>,
}

impl ImageData {
    pub fn new(format: ImageFormat, bytes: Vec<u8>) -> Self {
        Self {
            format,
            bytes: bytes.into(),
        }
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex SHA-256 of the encoded bytes
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

/// A page-oriented document being assembled
///
/// A new writer has one open page. Coordinates use a top-left origin and
/// the writer's unit; anything drawn outside the page is clipped.
pub trait DocumentWriter {
    /// Usable page width
    fn content_width(&self) -> f64;

    /// Usable page height
    fn content_height(&self) -> f64;

    /// Append a page and make it current
    fn add_page(&mut self) -> Result<()>;

    /// Draw `image` scaled to `width` x `height` with its top-left at (`x`, `y`)
    fn draw_image(
        &mut self,
        image: &ImageData,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()>;

    /// Number of pages so far
    fn page_count(&self) -> usize;

    /// Finish the document and persist it under `filename`
    fn save(&mut self, filename: &str) -> Result<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_portrait_in_mm() {
        let (w, h) = WriterOptions::default().page_dimensions();
        assert!((w - 210.0).abs() < 1e-9);
        assert!((h - 297.0).abs() < 1e-9);
    }

    #[test]
    fn letter_landscape_in_points() {
        let opts = WriterOptions {
            orientation: Orientation::Landscape,
            unit: Unit::Pt,
            format: PageSize::Letter,
        };
        let (w, h) = opts.page_dimensions();
        assert!((w - 792.0).abs() < 1e-6);
        assert!((h - 612.0).abs() < 1e-6);
    }

    #[test]
    fn parses_names() {
        assert_eq!("A4".parse::<PageSize>().unwrap(), PageSize::A4);
        assert_eq!("in".parse::<Unit>().unwrap(), Unit::In);
        assert_eq!("Landscape".parse::<Orientation>().unwrap(), Orientation::Landscape);
        assert!(matches!("b5".parse::<PageSize>(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn digest_tracks_content() {
        let a = ImageData::new(ImageFormat::Png, vec![1, 2, 3]);
        let b = ImageData::new(ImageFormat::Png, vec![1, 2, 3]);
        let c = ImageData::new(ImageFormat::Png, vec![3, 2, 1]);
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest().len(), 64);
    }
}
