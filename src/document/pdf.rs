//! PDF document writer built on `lopdf`
//!
//! Pages are collected in memory and the object graph is assembled only on
//! [`DocumentWriter::save`], so nothing reaches disk until every page has
//! been drawn. Each distinct image is embedded once and shared by every page
//! that draws it.

use super::{DocumentWriter, ImageData, ImageFormat, WriterOptions};
use crate::{Error, ExportConfig, Result};
use image::ColorType;
use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone)]
struct EmbeddedImage {
    name: String,
    id: ObjectId,
}

#[derive(Debug, Default)]
struct PageContent {
    operations: Vec<Operation>,
    xobjects: Vec<(String, ObjectId)>,
}

/// Writes a multi-page PDF of drawn images
pub struct PdfWriter {
    options: WriterOptions,
    output_dir: PathBuf,
    width: f64,
    height: f64,
    doc: Document,
    pages: Vec<PageContent>,
    // keyed by content digest
    images: HashMap<String, EmbeddedImage>,
}

impl PdfWriter {
    /// New document with one empty page; `save` writes into `output_dir`.
    pub fn new(options: WriterOptions, output_dir: impl Into<PathBuf>) -> Result<Self> {
        let (width, height) = options.page_dimensions();
        Ok(Self {
            options,
            output_dir: output_dir.into(),
            width,
            height,
            doc: Document::with_version("1.5"),
            pages: vec![PageContent::default()],
            images: HashMap::new(),
        })
    }

    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        Self::new(config.writer, config.output_dir.clone())
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    fn to_points(&self, v: f64) -> f32 {
        (v * self.options.unit.points_per_unit()) as f32
    }

    fn embed(&mut self, image: &ImageData) -> Result<EmbeddedImage> {
        let digest = image.digest();
        if let Some(existing) = self.images.get(&digest) {
            return Ok(existing.clone());
        }

        let stream = image_stream(image)?;
        let id = self.doc.add_object(stream);
        let embedded = EmbeddedImage {
            name: format!("Im{}", self.images.len()),
            id,
        };
        debug!("embedded {} image as {} ({})", image.format(), embedded.name, &digest[..12]);
        self.images.insert(digest, embedded.clone());
        Ok(embedded)
    }

    fn build(&self) -> Result<Document> {
        let mut doc = self.doc.clone();
        let pages_id = doc.new_object_id();
        let media_box: Vec<Object> = vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(self.to_points(self.width)),
            Object::Real(self.to_points(self.height)),
        ];

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let content = Content {
                operations: page.operations.clone(),
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

            let mut xobjects = Dictionary::new();
            for (name, id) in &page.xobjects {
                xobjects.set(name.as_bytes().to_vec(), Object::Reference(*id));
            }

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box.clone(),
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => xobjects,
                },
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();
        Ok(doc)
    }
}

impl DocumentWriter for PdfWriter {
    fn content_width(&self) -> f64 {
        self.width
    }

    fn content_height(&self) -> f64 {
        self.height
    }

    fn add_page(&mut self) -> Result<()> {
        self.pages.push(PageContent::default());
        Ok(())
    }

    fn draw_image(
        &mut self,
        image: &ImageData,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let finite = [x, y, width, height].iter().all(|v| v.is_finite());
        if !finite || width <= 0.0 || height <= 0.0 {
            return Err(Error::WriterFailure(format!(
                "invalid image placement x={} y={} w={} h={}",
                x, y, width, height
            )));
        }

        let embedded = self.embed(image)?;

        // PDF user space has its origin at the bottom-left corner.
        let bottom = self.height - (y + height);
        let operations = [
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(self.to_points(width)),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(self.to_points(height)),
                    Object::Real(self.to_points(x)),
                    Object::Real(self.to_points(bottom)),
                ],
            ),
            Operation::new("Do", vec![Object::Name(embedded.name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ];

        let page = self
            .pages
            .last_mut()
            .ok_or_else(|| Error::WriterFailure("document has no pages".into()))?;
        page.operations.extend(operations);
        if !page.xobjects.iter().any(|(name, _)| *name == embedded.name) {
            page.xobjects.push((embedded.name, embedded.id));
        }
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn save(&mut self, filename: &str) -> Result<PathBuf> {
        let mut doc = self.build()?;
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            Error::WriterFailure(format!("Failed to create {}: {}", self.output_dir.display(), e))
        })?;
        let path = self.output_dir.join(filename);
        doc.save(&path).map_err(|e| {
            Error::WriterFailure(format!("Failed to save {}: {}", path.display(), e))
        })?;
        debug!("saved {} page(s) to {}", self.pages.len(), path.display());
        Ok(path)
    }
}

/// Build the image XObject for `image`. Baseline RGB or grayscale JPEGs are
/// embedded as-is; everything else is stored as raw RGB and left for
/// document compression.
fn image_stream(image: &ImageData) -> Result<Stream> {
    let decoded = image::load_from_memory(image.bytes()).map_err(|e| {
        Error::WriterFailure(format!("cannot embed {} image: {}", image.format(), e))
    })?;
    let (width, height) = (decoded.width() as i64, decoded.height() as i64);

    let passthrough = match (image.format(), decoded.color()) {
        (ImageFormat::Jpeg, ColorType::Rgb8) => Some("DeviceRGB"),
        (ImageFormat::Jpeg, ColorType::L8) => Some("DeviceGray"),
        _ => None,
    };

    let dict = |color_space: &str| {
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => Object::Name(color_space.as_bytes().to_vec()),
            "BitsPerComponent" => 8_i64,
        }
    };

    Ok(match passthrough {
        Some(color_space) => {
            let mut d = dict(color_space);
            d.set("Filter", Object::Name(b"DCTDecode".to_vec()));
            Stream::new(d, image.bytes().to_vec()).with_compression(false)
        }
        None => Stream::new(dict("DeviceRGB"), decoded.to_rgb8().into_raw()),
    })
}
