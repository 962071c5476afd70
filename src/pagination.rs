//! Page planning for tall snapshots
//!
//! Maps a source image and a fixed page content area to the ordered list of
//! placements needed to draw the whole image. Every placement redraws the
//! same fitted image, shifted upward so the next page-height band of it lands
//! inside the page; the page's own bounds do the clipping.
//!
//! All lengths in a plan share the unit of the [`PageFormat`] they were
//! planned against.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Relative slack used when counting pages, so an image whose fitted height
/// is an exact multiple of the page height does not get a trailing empty page.
const PAGE_COUNT_TOLERANCE: f64 = 1e-9;

/// Pixel dimensions of a captured snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceImage {
    pixel_width: u32,
    pixel_height: u32,
}

impl SourceImage {
    /// Both dimensions must be non-zero.
    pub fn new(pixel_width: u32, pixel_height: u32) -> Result<Self> {
        if pixel_width == 0 || pixel_height == 0 {
            return Err(Error::InvalidSource(format!(
                "{}x{} has a zero dimension",
                pixel_width, pixel_height
            )));
        }
        Ok(Self {
            pixel_width,
            pixel_height,
        })
    }

    pub fn pixel_width(&self) -> u32 {
        self.pixel_width
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    /// Width over height; always > 0.
    pub fn aspect_ratio(&self) -> f64 {
        self.pixel_width as f64 / self.pixel_height as f64
    }
}

/// Content area of one output page, in document units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFormat {
    content_width: f64,
    content_height: f64,
}

impl PageFormat {
    pub fn new(content_width: f64, content_height: f64) -> Result<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(content_width) || !valid(content_height) {
            return Err(Error::ConfigError(format!(
                "page content area {}x{} must be positive and finite",
                content_width, content_height
            )));
        }
        Ok(Self {
            content_width,
            content_height,
        })
    }

    pub fn content_width(&self) -> f64 {
        self.content_width
    }

    pub fn content_height(&self) -> f64 {
        self.content_height
    }
}

/// How the image is fitted before paging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitMode {
    /// Fill the page width and continue onto as many pages as needed.
    #[default]
    Tile,
    /// Never page: if the width-fitted image is taller than one page, scale it
    /// down to the page height instead (narrower than the page).
    ShrinkToPage,
}

impl std::str::FromStr for FitMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tile" => Ok(FitMode::Tile),
            "shrink-to-page" | "shrink" => Ok(FitMode::ShrinkToPage),
            other => Err(Error::ConfigError(format!("unknown fit mode '{}'", other))),
        }
    }
}

/// Where and how large to draw the fitted image on one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePlacement {
    /// 0-based, sequential
    pub page_index: usize,
    pub draw_width: f64,
    pub draw_height: f64,
    /// Distance the image top sits above the page top, negated (0 or less).
    pub vertical_offset: f64,
}

/// Ordered placements for one export; never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementPlan {
    fitted_width: f64,
    fitted_height: f64,
    page_height: f64,
    placements: Vec<PagePlacement>,
}

impl PlacementPlan {
    pub fn fitted_width(&self) -> f64 {
        self.fitted_width
    }

    pub fn fitted_height(&self) -> f64 {
        self.fitted_height
    }

    pub fn page_count(&self) -> usize {
        self.placements.len()
    }

    pub fn placements(&self) -> &[PagePlacement] {
        &self.placements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PagePlacement> {
        self.placements.iter()
    }

    /// The `[top, bottom)` band of the fitted image that is visible on page
    /// `index`, in fitted-image coordinates. `None` past the last page.
    pub fn visible_slice(&self, index: usize) -> Option<(f64, f64)> {
        let placement = self.placements.get(index)?;
        let top = -placement.vertical_offset;
        let bottom = (top + self.page_height).min(self.fitted_height);
        Some((top, bottom))
    }
}

impl<'a> IntoIterator for &'a PlacementPlan {
    type Item = &'a PagePlacement;
    type IntoIter = std::slice::Iter<'a, PagePlacement>;

    fn into_iter(self) -> Self::IntoIter {
        self.placements.iter()
    }
}

/// Page limit used when none is configured.
pub const DEFAULT_MAX_PAGES: usize = 500;

/// Pure planner; holds the fitting policy and the page limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationPlanner {
    pub fit_mode: FitMode,
    pub max_pages: usize,
}

impl Default for PaginationPlanner {
    fn default() -> Self {
        Self::new(FitMode::default())
    }
}

impl PaginationPlanner {
    pub fn new(fit_mode: FitMode) -> Self {
        Self {
            fit_mode,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Fitted (width, height) of the image on this page format.
    pub fn fit(&self, source: &SourceImage, page: &PageFormat) -> (f64, f64) {
        let ratio = source.aspect_ratio();
        let mut width = page.content_width;
        let mut height = page.content_width / ratio;

        if self.fit_mode == FitMode::ShrinkToPage && height > page.content_height {
            height = page.content_height;
            width = page.content_height * ratio;
        }
        (width, height)
    }

    /// Number of pages `plan` would produce, without allocating the plan.
    ///
    /// Fails with [`Error::PageLimitExceeded`] past `max_pages`.
    pub fn page_count(&self, source: &SourceImage, page: &PageFormat) -> Result<usize> {
        let (_, height) = self.fit(source, page);
        pages_for(height, page.content_height, self.max_pages)
    }

    pub fn plan(&self, source: &SourceImage, page: &PageFormat) -> Result<PlacementPlan> {
        let (width, height) = self.fit(source, page);
        let count = pages_for(height, page.content_height, self.max_pages)?;

        let placements = (0..count)
            .map(|k| PagePlacement {
                page_index: k,
                draw_width: width,
                draw_height: height,
                vertical_offset: if k == 0 {
                    0.0
                } else {
                    -(k as f64 * page.content_height)
                },
            })
            .collect();

        Ok(PlacementPlan {
            fitted_width: width,
            fitted_height: height,
            page_height: page.content_height,
            placements,
        })
    }
}

/// Plan with the default [`FitMode::Tile`] policy and page limit.
pub fn plan(source: &SourceImage, page: &PageFormat) -> Result<PlacementPlan> {
    PaginationPlanner::default().plan(source, page)
}

fn pages_for(fitted_height: f64, page_height: f64, limit: usize) -> Result<usize> {
    if fitted_height <= page_height {
        return Ok(1);
    }
    let pages = (fitted_height / page_height - PAGE_COUNT_TOLERANCE).ceil();
    // `as` saturates, so an infinite count reports as usize::MAX
    if !pages.is_finite() || pages > limit as f64 {
        return Err(Error::PageLimitExceeded {
            pages: pages as usize,
            limit,
        });
    }
    Ok((pages as usize).max(1))
}
