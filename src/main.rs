//! Purchase Analyzer CLI
//!
//! Analyzes one customer's purchase file and prints tagged notifications
//! from the dispatcher (`main`) and the three workers (`P1`, `P2`, `P3`).
//!
//! # Usage
//!
//! ```bash
//! cargo run -- alice.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `info` to control logging verbosity
//! - `ANALYZER_QUEUE_CAPACITY`: Bound of each worker channel (default 5)
//! - `ANALYZER_PRICE_THRESHOLD`: High-value threshold (default 1000.0)
//! - `ANALYZER_RECORD_DELAY_MS`: Per-record worker delay (default 0)

use purchase_analyzer::{
    AnalysisConfig, AnalyzerError, ConsoleReporter, InputFile, PurchaseAnalyzer, Result,
};
use std::env;
use std::process;
use std::sync::Arc;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        return Err(AnalyzerError::Usage);
    }

    let input = InputFile::validate(&args[1])?;
    let config = AnalysisConfig::from_env()?;
    let reader = input.open()?;

    let reporter = Arc::new(ConsoleReporter::new(input.customer_name()));
    let analyzer = PurchaseAnalyzer::new(config, reporter);
    analyzer.run(reader)?;

    Ok(())
}
