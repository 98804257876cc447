//! Error types for the purchase analyzer.

use crate::report::Source;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors that terminate a run.
///
/// Per-line and per-record problems are not represented here; they are
/// reported as notifications and the run carries on.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Wrong number of command line arguments
    #[error("Usage: purchase-analyzer <input.csv>")]
    Usage,

    /// The input path does not name an existing file
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The input file does not carry a `.csv` extension
    #[error("File {} does not have a .csv extension", path.display())]
    InvalidExtension { path: PathBuf },

    /// An environment override could not be used
    #[error("Invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },

    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader failure that is not tied to a single line
    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    /// A worker thread panicked before finishing
    #[error("Worker {worker} panicked")]
    WorkerPanicked { worker: Source },

    /// A worker stopped receiving before the input was exhausted
    #[error("Worker {worker} disconnected before the end of input")]
    WorkerDisconnected { worker: Source },
}
