//! # Purchase Analyzer
//!
//! Reads one customer's purchase file and runs three independent analyses
//! over it, each on its own worker thread:
//!
//! - **High-value purchases**: prices strictly above a threshold
//! - **Total spend**: the sum of every valid price, handed back to the caller
//! - **Special days**: purchases made on the 29th, 30th or 31st
//!
//! ## Design Principles
//!
//! - **Bounded fan-out**: each worker has a private bounded channel, so a slow
//!   worker applies backpressure to the reader
//! - **Close, don't signal**: the end of input is the channel closing
//! - **Recover locally**: malformed lines and dates are reported and skipped
//! - **Single handback**: the total is the spend worker's join value
//!
//! ## Example
//!
//! ```no_run
//! use purchase_analyzer::{AnalysisConfig, ConsoleReporter, PurchaseAnalyzer};
//! use std::io::Cursor;
//! use std::sync::Arc;
//!
//! let csv = "data,ref,product,price\n2024-01-29,1,Gadget,1500.00\n";
//! let analyzer = PurchaseAnalyzer::new(
//!     AnalysisConfig::default(),
//!     Arc::new(ConsoleReporter::new("alice")),
//! );
//! let summary = analyzer.run(Cursor::new(csv)).unwrap();
//! assert_eq!(summary.dispatched, 1);
//! ```

pub mod analyzer;
pub mod config;
pub mod error;
pub mod input;
pub mod record;
pub mod report;
pub mod workers;

pub use analyzer::{PurchaseAnalyzer, RunSummary};
pub use config::AnalysisConfig;
pub use error::{AnalyzerError, Result};
pub use input::InputFile;
pub use record::{ParseError, PurchaseRecord};
pub use report::{CollectingReporter, ConsoleReporter, Notification, Reporter, Source};
pub use workers::DateError;
