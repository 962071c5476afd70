//! Decoding a captured raster into planner input

use crate::document::{ImageData, ImageFormat};
use crate::pagination::SourceImage;
use crate::snapshot::RasterImage;
use crate::{Error, Result};

/// A decoded snapshot: its pixel dimensions plus the encoded image to draw.
#[derive(Debug, Clone)]
pub struct DecodedSnapshot {
    pub image: SourceImage,
    pub data: ImageData,
}

/// Decode `raster` off the async executor.
///
/// Exactly one decode runs per call; the caller awaits it before planning.
pub async fn decode(raster: RasterImage) -> Result<DecodedSnapshot> {
    tokio::task::spawn_blocking(move || decode_blocking(raster))
        .await
        .map_err(|e| Error::ImageDecodeFailed(format!("decode task failed: {}", e)))?
}

/// Synchronous form of [`decode`].
pub fn decode_blocking(raster: RasterImage) -> Result<DecodedSnapshot> {
    let bytes = raster.into_bytes()?;

    let guessed = image::guess_format(&bytes)
        .map_err(|e| Error::ImageDecodeFailed(format!("unrecognized image data: {}", e)))?;
    let format = match guessed {
        image::ImageFormat::Png => ImageFormat::Png,
        image::ImageFormat::Jpeg => ImageFormat::Jpeg,
        other => {
            return Err(Error::ImageDecodeFailed(format!(
                "unsupported snapshot format {:?}",
                other
            )))
        }
    };

    // Full decode, so truncated data fails here rather than in the writer.
    let img = image::load_from_memory_with_format(&bytes, guessed)
        .map_err(|e| Error::ImageDecodeFailed(e.to_string()))?;
    let image = SourceImage::new(img.width(), img.height())?;

    Ok(DecodedSnapshot {
        image,
        data: ImageData::new(format, bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;

    fn encoded(w: u32, h: u32, format: image::ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(w, h))
            .write_to(&mut buf, format)
            .unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn decodes_png_dimensions() {
        let snap = decode(RasterImage::Encoded(encoded(80, 400, image::ImageFormat::Png)))
            .await
            .unwrap();
        assert_eq!(snap.image.pixel_width(), 80);
        assert_eq!(snap.image.pixel_height(), 400);
        assert_eq!(snap.data.format(), ImageFormat::Png);
    }

    #[test]
    fn decodes_jpeg() {
        let jpeg = encoded(16, 8, image::ImageFormat::Jpeg);
        let snap = decode_blocking(RasterImage::Encoded(jpeg)).unwrap();
        assert_eq!(snap.data.format(), ImageFormat::Jpeg);
        assert_eq!(snap.image.aspect_ratio(), 2.0);
    }

    #[test]
    fn garbage_fails_decode() {
        let res = decode_blocking(RasterImage::Encoded(b"not an image".to_vec()));
        assert!(matches!(res, Err(Error::ImageDecodeFailed(_))));
    }

    #[test]
    fn truncated_png_fails_decode() {
        let mut bytes = encoded(64, 64, image::ImageFormat::Png);
        bytes.truncate(bytes.len() / 2);
        let res = decode_blocking(RasterImage::Encoded(bytes));
        assert!(matches!(res, Err(Error::ImageDecodeFailed(_))));
    }
}
