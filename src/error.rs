//! Error types for the snapshot exporter

use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing, planning or writing an export
#[derive(Error, Debug)]
pub enum Error {
    /// The view has no capture root, or the renderer could not find it
    #[error("Capture target not found: {0}")]
    CaptureTargetMissing(String),

    /// The snapshot renderer raised or timed out
    #[error("Snapshot capture failed: {0}")]
    SnapshotFailed(String),

    /// The captured raster could not be decoded
    #[error("Image decode failed: {0}")]
    ImageDecodeFailed(String),

    /// Another export is still running on this orchestrator
    #[error("An export is already in progress")]
    ExportInProgress,

    /// The document writer failed while adding pages, drawing or saving
    #[error("Document writer failed: {0}")]
    WriterFailure(String),

    /// Source image dimensions violate the planner's preconditions
    #[error("Invalid source image: {0}")]
    InvalidSource(String),

    /// The plan needs more pages than the configured limit
    #[error("Export needs {pages} pages, limit is {limit}")]
    PageLimitExceeded { pages: usize, limit: usize },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::WriterFailure(err.to_string())
    }
}

/// `headless_chrome` reports browser failures as `anyhow::Error`.
#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::SnapshotFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_detail() {
        let e = Error::SnapshotFailed("renderer crashed".into());
        assert_eq!(e.to_string(), "Snapshot capture failed: renderer crashed");

        let e = Error::PageLimitExceeded { pages: 900, limit: 500 };
        assert_eq!(e.to_string(), "Export needs 900 pages, limit is 500");
    }

    #[cfg(feature = "cdp")]
    #[test]
    fn browser_errors_are_snapshot_failures() {
        let e: Error = anyhow::anyhow!("Chrome exited").into();
        assert!(matches!(e, Error::SnapshotFailed(ref d) if d == "Chrome exited"));
    }
}
