//! Pagesnap
//!
//! Paginated PDF export of tall report snapshots: capture one raster image of
//! a rendered report, plan how it splits across fixed-size pages, and draw it
//! into a multi-page document.
//!
//! # Features
//!
//! - **File capture** (default): exports a pre-rendered snapshot from disk
//! - **CDP capture** (`cdp`): captures a live page element via headless Chrome
//! - **Pure planning**: [`pagination::plan`] has no I/O and can be used alone
//!
//! # Example
//!
//! ```no_run
//! use pagesnap::{CaptureTarget, ExportConfig, ExportOrchestrator, ReportView};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExportConfig {
//!     output_dir: "out".into(),
//!     ..Default::default()
//! };
//!
//! let worker = pagesnap::new_capture_worker(&config).await?;
//! let exporter = ExportOrchestrator::new(worker, config)?;
//! let view = ReportView {
//!     label: "sales.csv".to_string(),
//!     target: Some(CaptureTarget::File("snapshot.png".into())),
//! };
//! let report = exporter.export_current_view(&view).await?;
//! println!("wrote {} pages to {}", report.page_count, report.path.display());
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub mod error;
pub use error::{Error, Result};

pub mod decode;
pub mod document;
pub mod export;
pub mod pagination;
pub mod snapshot;

pub use decode::DecodedSnapshot;
pub use document::{
    DocumentWriter, ImageData, ImageFormat, Orientation, PageSize, PdfWriter, Unit, WriterOptions,
};
pub use export::{
    output_file_name, ExportOrchestrator, ExportReport, ExportState, Notification, ReportView,
};
pub use pagination::{
    plan, FitMode, PageFormat, PagePlacement, PaginationPlanner, PlacementPlan, SourceImage,
    DEFAULT_MAX_PAGES,
};
pub use snapshot::{
    CaptureOptions, CaptureTarget, CaptureWorker, Capturer, FileCapturer, RasterImage, Rgb,
    SnapshotRenderer,
};

/// Configuration for an export orchestrator
///
/// The defaults reproduce the dashboard exporter this crate grew out of:
/// A4 portrait in millimetres, a one second settle delay before capture,
/// a dark `#111827` background behind translucent pixels, and output files
/// named `dashboard-<label>.pdf`.
///
/// Every field may be omitted when loading from JSON.
///
/// ```
/// let cfg = pagesnap::ExportConfig::default();
/// assert_eq!(cfg.file_prefix, "dashboard");
/// assert_eq!(cfg.settle_delay_ms, 1000);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Page geometry handed to the document writer
    pub writer: WriterOptions,
    /// How the snapshot is fitted before paging
    pub fit_mode: FitMode,
    /// Delay before capture so the view can finish drawing, in milliseconds
    pub settle_delay_ms: u64,
    /// Capture timeout in milliseconds (0 => wait for the renderer)
    ///
    /// Expiry only abandons the wait. A [`CaptureWorker`] keeps running the
    /// timed-out capture, and the next export's capture queues behind it.
    pub capture_timeout_ms: u64,
    /// Upper bound on pages per export
    pub max_pages: usize,
    /// Options forwarded to the snapshot renderer
    pub capture: CaptureOptions,
    /// Browser viewport used by live captures
    pub viewport: Viewport,
    /// Directory the finished document is written to
    pub output_dir: PathBuf,
    /// File name prefix, joined to the report label with `-`
    pub file_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            writer: WriterOptions::default(),
            fit_mode: FitMode::default(),
            settle_delay_ms: 1000,
            capture_timeout_ms: 30000,
            max_pages: DEFAULT_MAX_PAGES,
            capture: CaptureOptions::default(),
            viewport: Viewport::default(),
            output_dir: PathBuf::from("."),
            file_prefix: "dashboard".to_string(),
        }
    }
}

impl ExportConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: ExportConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::ConfigError(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(Error::ConfigError("max_pages must be at least 1".into()));
        }
        if self.file_prefix.is_empty() {
            return Err(Error::ConfigError("file_prefix must not be empty".into()));
        }
        if self.file_prefix.contains(['/', '\\']) {
            return Err(Error::ConfigError(format!(
                "file_prefix '{}' must not contain path separators",
                self.file_prefix
            )));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Error::ConfigError("viewport dimensions must be non-zero".into()));
        }
        Ok(())
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Start a capture worker with the default backend
///
/// This prefers the CDP backend when the `cdp` feature is enabled; it still
/// serves file targets. Without `cdp` only file targets can be captured.
#[cfg(feature = "cdp")]
pub async fn new_capture_worker(config: &ExportConfig) -> Result<CaptureWorker> {
    let viewport = config.viewport;
    let timeout_ms = config.capture_timeout_ms;
    CaptureWorker::spawn(move || snapshot::cdp::CdpCapturer::new(viewport, timeout_ms)).await
}

#[cfg(not(feature = "cdp"))]
pub async fn new_capture_worker(_config: &ExportConfig) -> Result<CaptureWorker> {
    CaptureWorker::spawn(|| Ok(FileCapturer::new())).await
}
