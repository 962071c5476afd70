//! Export orchestration
//!
//! [`ExportOrchestrator::export_current_view`] runs one export end to end:
//! capture the view, decode the snapshot, plan the pages, draw them and save
//! the document. Each orchestrator allows one export at a time; a second call
//! made while one is outstanding is rejected, not queued.

use crate::decode;
use crate::document::{DocumentWriter, PdfWriter};
use crate::pagination::{PageFormat, PaginationPlanner};
use crate::snapshot::{CaptureTarget, RasterImage, SnapshotRenderer};
use crate::{Error, ExportConfig, Result};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

type OutcomeHandler = Arc<dyn Fn(&Notification) + Send + Sync>;
type WriterFactory<W> = Box<dyn Fn(&ExportConfig) -> Result<W> + Send + Sync>;

/// The report currently on screen
#[derive(Debug, Clone)]
pub struct ReportView {
    /// Identifying label, usually the source file name
    pub label: String,
    /// Root of the visual to capture; `None` when nothing is rendered
    pub target: Option<CaptureTarget>,
}

/// Whether an export is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Exporting,
}

/// Outcome message for the initiating UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Failure(String),
}

/// Summary of a finished export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReport {
    pub file_name: String,
    pub path: PathBuf,
    pub page_count: usize,
    pub source_width: u32,
    pub source_height: u32,
    pub fitted_width: f64,
    pub fitted_height: f64,
}

/// Holds the export lock; releases it when dropped.
struct ExportGuard<'a> {
    state: &'a Mutex<ExportState>,
}

impl<'a> ExportGuard<'a> {
    fn acquire(state: &'a Mutex<ExportState>) -> Result<Self> {
        let mut current = state.lock().unwrap_or_else(PoisonError::into_inner);
        if *current == ExportState::Exporting {
            return Err(Error::ExportInProgress);
        }
        *current = ExportState::Exporting;
        Ok(Self { state })
    }
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = ExportState::Idle;
    }
}

/// Sequences capture, decode, planning and drawing for one view at a time
pub struct ExportOrchestrator<R, W = PdfWriter> {
    renderer: R,
    config: ExportConfig,
    planner: PaginationPlanner,
    state: Mutex<ExportState>,
    make_writer: WriterFactory<W>,
    on_outcome: Option<OutcomeHandler>,
}

impl<R: SnapshotRenderer> ExportOrchestrator<R, PdfWriter> {
    /// Orchestrator that writes PDF files into `config.output_dir`
    pub fn new(renderer: R, config: ExportConfig) -> Result<Self> {
        Self::with_writer_factory(renderer, config, PdfWriter::from_config)
    }
}

impl<R: SnapshotRenderer, W: DocumentWriter> ExportOrchestrator<R, W> {
    /// Orchestrator with a custom document writer; `factory` is called once
    /// per export.
    pub fn with_writer_factory<F>(renderer: R, config: ExportConfig, factory: F) -> Result<Self>
    where
        F: Fn(&ExportConfig) -> Result<W> + Send + Sync + 'static,
    {
        config.validate()?;
        Ok(Self {
            renderer,
            planner: PaginationPlanner::new(config.fit_mode).with_max_pages(config.max_pages),
            config,
            state: Mutex::new(ExportState::Idle),
            make_writer: Box::new(factory),
            on_outcome: None,
        })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Give back the renderer, e.g. to shut a capture worker down.
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    pub fn state(&self) -> ExportState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a callback invoked with the outcome of every export that
    /// acquired the lock.
    pub fn on_outcome<F>(&mut self, cb: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.on_outcome = Some(Arc::new(cb));
    }

    /// Remove previously registered on_outcome callback if any
    pub fn clear_on_outcome(&mut self) {
        self.on_outcome = None;
    }

    /// Export `view` as a paginated document.
    ///
    /// Fails with [`Error::ExportInProgress`] without side effects if another
    /// export on this orchestrator has not finished. Any other failure aborts
    /// the export before the document is saved; the lock is released either
    /// way.
    pub async fn export_current_view(&self, view: &ReportView) -> Result<ExportReport> {
        let _guard = match ExportGuard::acquire(&self.state) {
            Ok(guard) => guard,
            Err(e) => {
                warn!("export of '{}' rejected: {}", view.label, e);
                return Err(e);
            }
        };

        let outcome = self.run(view).await;
        let notification = match &outcome {
            Ok(report) => {
                info!(
                    "exported '{}' to {} ({} page(s))",
                    view.label,
                    report.path.display(),
                    report.page_count
                );
                Notification::Success("PDF exported successfully!".to_string())
            }
            Err(e) => {
                error!("Error exporting PDF for '{}': {}", view.label, e);
                Notification::Failure(format!("Failed to export PDF: {}", e))
            }
        };
        if let Some(cb) = &self.on_outcome {
            cb(&notification);
        }
        outcome
    }

    async fn run(&self, view: &ReportView) -> Result<ExportReport> {
        let target = view.target.as_ref().ok_or_else(|| {
            Error::CaptureTargetMissing(format!("view '{}' has no capture root", view.label))
        })?;

        if self.config.settle_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
        }

        let raster = self.capture(target).await?;
        let snapshot = decode::decode(raster).await?;
        debug!(
            "captured {} as {}x{} {}",
            target,
            snapshot.image.pixel_width(),
            snapshot.image.pixel_height(),
            snapshot.data.format()
        );

        let mut writer = (self.make_writer)(&self.config)?;
        let page = PageFormat::new(writer.content_width(), writer.content_height())?;

        // fails on the page limit before any page is drawn
        let plan = self.planner.plan(&snapshot.image, &page)?;
        for placement in &plan {
            if placement.page_index > 0 {
                writer.add_page()?;
            }
            writer.draw_image(
                &snapshot.data,
                0.0,
                placement.vertical_offset,
                placement.draw_width,
                placement.draw_height,
            )?;
            debug!(
                "page {}: {:.2}x{:.2} at offset {:.2}",
                placement.page_index,
                placement.draw_width,
                placement.draw_height,
                placement.vertical_offset
            );
        }

        let file_name = output_file_name(&self.config.file_prefix, &view.label);
        let path = writer.save(&file_name)?;

        Ok(ExportReport {
            file_name,
            path,
            page_count: plan.page_count(),
            source_width: snapshot.image.pixel_width(),
            source_height: snapshot.image.pixel_height(),
            fitted_width: plan.fitted_width(),
            fitted_height: plan.fitted_height(),
        })
    }

    async fn capture(&self, target: &CaptureTarget) -> Result<RasterImage> {
        let capture = self.renderer.capture(target, &self.config.capture);
        let timeout_ms = self.config.capture_timeout_ms;
        if timeout_ms == 0 {
            return capture.await;
        }
        match tokio::time::timeout(Duration::from_millis(timeout_ms), capture).await {
            Ok(res) => res,
            Err(_) => Err(Error::SnapshotFailed(format!("timed out after {}ms", timeout_ms))),
        }
    }
}

/// `"<prefix>-<label>.pdf"` with the label's last extension removed and
/// path separators replaced by `_`
pub fn output_file_name(prefix: &str, label: &str) -> String {
    let stem = strip_extension(label).replace(['/', '\\'], "_");
    format!("{}-{}.pdf", prefix, stem)
}

fn strip_extension(label: &str) -> &str {
    match label.rfind('.') {
        Some(dot) if dot + 1 < label.len() && !label[dot + 1..].contains('/') => &label[..dot],
        _ => label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_drop_last_extension() {
        assert_eq!(output_file_name("dashboard", "sales.csv"), "dashboard-sales.pdf");
        assert_eq!(output_file_name("dashboard", "q1.sales.xlsx"), "dashboard-q1.sales.pdf");
        assert_eq!(output_file_name("dashboard", "noext"), "dashboard-noext.pdf");
        assert_eq!(output_file_name("dashboard", "trailing."), "dashboard-trailing..pdf");
        assert_eq!(output_file_name("dashboard", "dir.v2/data"), "dashboard-dir.v2_data.pdf");
        assert_eq!(output_file_name("report", ".hidden"), "report-.pdf");
    }

    #[test]
    fn guard_releases_on_drop() {
        let state = Mutex::new(ExportState::Idle);
        {
            let _g = ExportGuard::acquire(&state).unwrap();
            assert_eq!(*state.lock().unwrap(), ExportState::Exporting);
            assert!(matches!(ExportGuard::acquire(&state), Err(Error::ExportInProgress)));
        }
        assert_eq!(*state.lock().unwrap(), ExportState::Idle);
        assert!(ExportGuard::acquire(&state).is_ok());
    }
}
