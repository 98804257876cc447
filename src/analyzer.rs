//! Dispatcher and coordinator for one analysis run.
//!
//! The calling thread reads the input, parses each line and fans every valid
//! record out to three worker threads over bounded channels. Closing a
//! channel is the end-of-stream signal; the total spend comes back as the
//! spend worker's join value.

use crate::config::AnalysisConfig;
use crate::error::{AnalyzerError, Result};
use crate::record::PurchaseRecord;
use crate::report::{Notification, Reporter, Source};
use crate::workers;
use crossbeam::channel::{bounded, Sender};
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use std::io::Read;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A first line whose leading field starts with this (any case) is a header.
pub const HEADER_MARKER: &str = "data";

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Sum of all dispatched prices, as computed by the spend worker.
    pub total_spend: f64,

    /// Records pushed to the workers.
    pub dispatched: usize,

    /// Lines rejected with an invalid-line diagnostic.
    pub rejected: usize,
}

/// Counters kept while streaming.
#[derive(Debug, Default)]
struct DispatchStats {
    dispatched: usize,
    rejected: usize,
}

/// The sending halves of the three worker channels.
///
/// Dropping a `Fanout` closes every channel, which tells the workers that no
/// more records are coming.
struct Fanout {
    senders: [(Source, Sender<PurchaseRecord>); 3],
}

impl Fanout {
    /// Pushes a copy of `record` to each worker, in worker order.
    ///
    /// Blocks while a channel is full.
    fn send(&self, record: &PurchaseRecord) -> Result<()> {
        for (source, sender) in &self.senders {
            sender
                .send(record.clone())
                .map_err(|_| AnalyzerError::WorkerDisconnected { worker: *source })?;
        }
        Ok(())
    }

    /// Closes the channels in worker order.
    fn close(self) {
        for (source, sender) in self.senders {
            drop(sender);
            debug!("Closed channel for worker {}", source);
        }
    }
}

/// Runs the three analyses over a purchase file.
pub struct PurchaseAnalyzer {
    config: AnalysisConfig,
    reporter: Arc<dyn Reporter>,
}

impl PurchaseAnalyzer {
    /// Creates an analyzer that reports through `reporter`.
    pub fn new(config: AnalysisConfig, reporter: Arc<dyn Reporter>) -> Self {
        PurchaseAnalyzer { config, reporter }
    }

    /// Analyzes every line of `reader`.
    ///
    /// Workers are always joined before this returns, including when reading
    /// the input fails part way through. Invalid lines are reported and
    /// skipped; they never fail the run.
    pub fn run<R: Read>(&self, reader: R) -> Result<RunSummary> {
        self.reporter.report(Source::Main, Notification::Started);

        let capacity = self.config.queue_capacity;
        let delay = self.config.record_delay;
        let (high_tx, high_rx) = bounded(capacity);
        let (spend_tx, spend_rx) = bounded(capacity);
        let (special_tx, special_rx) = bounded(capacity);

        let high = {
            let reporter = Arc::clone(&self.reporter);
            let threshold = self.config.price_threshold;
            spawn_worker(Source::HighValue, move || {
                workers::high_value(high_rx, threshold, delay, &*reporter)
            })?
        };
        let spend = {
            let reporter = Arc::clone(&self.reporter);
            spawn_worker(Source::TotalSpend, move || {
                workers::total_spend(spend_rx, delay, &*reporter)
            })?
        };
        let special = {
            let reporter = Arc::clone(&self.reporter);
            let config = self.config.clone();
            spawn_worker(Source::SpecialDay, move || {
                workers::special_day(
                    special_rx,
                    |day| config.is_special_day(day),
                    delay,
                    &*reporter,
                )
            })?
        };

        let fanout = Fanout {
            senders: [
                (Source::HighValue, high_tx),
                (Source::TotalSpend, spend_tx),
                (Source::SpecialDay, special_tx),
            ],
        };
        let mut stats = DispatchStats::default();
        let streamed = self.dispatch(reader, &fanout, &mut stats);
        fanout.close();

        // Join everything before looking at any error so no worker outlives the run.
        let high = join_worker(Source::HighValue, high);
        let spend = join_worker(Source::TotalSpend, spend);
        let special = join_worker(Source::SpecialDay, special);

        high?;
        let total_spend = spend?;
        special?;
        streamed?;

        self.reporter.report(Source::Main, Notification::Finished);
        self.reporter
            .report(Source::Main, Notification::FinalTotal { total: total_spend });

        info!(
            "Run complete: {} records dispatched, {} lines rejected, total {:.2}",
            stats.dispatched, stats.rejected, total_spend
        );

        Ok(RunSummary {
            total_spend,
            dispatched: stats.dispatched,
            rejected: stats.rejected,
        })
    }

    /// Streams `reader` into the fanout until input runs out.
    ///
    /// Every physical line is one unit. Quoting is disabled, so a stray `"`
    /// can never pull the following lines into its field.
    fn dispatch<R: Read>(
        &self,
        reader: R,
        fanout: &Fanout,
        stats: &mut DispatchStats,
    ) -> Result<()> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut first = true;
        for (row_idx, result) in csv_reader.byte_records().enumerate() {
            let row_num = row_idx + 1;

            let raw = match result {
                Ok(raw) => raw,
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
                Err(e) => {
                    first = false;
                    warn!("Row {}: CSV read error: {}", row_num, e);
                    self.reject(stats, format!("row {}", row_num), e.to_string());
                    continue;
                }
            };

            let record = match StringRecord::from_byte_record(raw) {
                Ok(record) => record,
                Err(e) => {
                    first = false;
                    let reason = e.utf8_error().to_string();
                    warn!("Row {}: {}", row_num, reason);
                    self.reject(stats, lossy_line(&e.into_byte_record()), reason);
                    continue;
                }
            };

            if is_blank(&record) {
                continue;
            }

            if first {
                first = false;
                if is_header(&record) {
                    debug!("Row {}: Skipping header", row_num);
                    continue;
                }
            }

            match PurchaseRecord::from_fields(&record.iter().collect::<Vec<_>>()) {
                Ok(purchase) => {
                    debug!(
                        "Row {}: Dispatching {} at {:.2}",
                        row_num, purchase.product, purchase.price
                    );
                    fanout.send(&purchase)?;
                    stats.dispatched += 1;
                }
                Err(e) => {
                    warn!("Row {}: {}", row_num, e);
                    self.reject(stats, raw_line(&record), e.to_string());
                }
            }
        }

        Ok(())
    }

    fn reject(&self, stats: &mut DispatchStats, line: String, reason: String) {
        stats.rejected += 1;
        self.reporter
            .report(Source::Main, Notification::InvalidLine { line, reason });
    }
}

/// Spawns a worker thread named after its tag.
fn spawn_worker<T, F>(source: Source, work: F) -> Result<JoinHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(source.tag().to_string())
        .spawn(work)?;
    debug!("Spawned worker {}", source);
    Ok(handle)
}

fn join_worker<T>(source: Source, handle: JoinHandle<T>) -> Result<T> {
    handle
        .join()
        .map_err(|_| AnalyzerError::WorkerPanicked { worker: source })
}

/// A line with nothing but whitespace on it.
fn is_blank(record: &StringRecord) -> bool {
    record.len() <= 1 && record.get(0).map_or(true, |f| f.trim().is_empty())
}

fn is_header(record: &StringRecord) -> bool {
    record.get(0).map_or(false, |f| {
        f.trim()
            .to_lowercase()
            .starts_with(HEADER_MARKER)
    })
}

/// Rebuilds the source line, without its terminator and surrounding
/// whitespace. With quoting off the fields are exactly the text between
/// delimiters.
fn raw_line(record: &StringRecord) -> String {
    record.iter().collect::<Vec<_>>().join(",").trim().to_string()
}

/// Like [`raw_line`] for a line that is not valid UTF-8.
fn lossy_line(record: &ByteRecord) -> String {
    record
        .iter()
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(",")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CollectingReporter;
    use std::io::Cursor;

    fn run_csv(csv: &str) -> (RunSummary, Arc<CollectingReporter>) {
        let reporter = Arc::new(CollectingReporter::new());
        let analyzer = PurchaseAnalyzer::new(AnalysisConfig::default(), reporter.clone());
        let summary = analyzer.run(Cursor::new(csv.to_string())).unwrap();
        (summary, reporter)
    }

    #[test]
    fn test_end_to_end_example() {
        let csv = "2024-01-15,x,Widget,500.00
2024-01-29,x,Gadget,1500.00
2024-02-31,x,Bad,abc";

        let (summary, reporter) = run_csv(csv);

        assert_eq!(summary.dispatched, 2);
        assert_eq!(summary.rejected, 1);
        assert!((summary.total_spend - 2000.0).abs() < 1e-9);

        assert_eq!(
            reporter.by_source(Source::HighValue),
            vec![Notification::HighValue {
                product: "Gadget".to_string(),
                price: 1500.0,
            }]
        );
        assert_eq!(
            reporter.by_source(Source::SpecialDay),
            vec![Notification::SpecialDay {
                product: "Gadget".to_string(),
                date: "2024-01-29".to_string(),
            }]
        );

        let main = reporter.by_source(Source::Main);
        assert_eq!(main.len(), 4);
        assert_eq!(main[0], Notification::Started);
        assert!(matches!(
            &main[1],
            Notification::InvalidLine { line, .. } if line == "2024-02-31,x,Bad,abc"
        ));
        assert_eq!(main[2], Notification::Finished);
        assert_eq!(
            main[3],
            Notification::FinalTotal {
                total: summary.total_spend
            }
        );
    }

    #[test]
    fn test_header_skipped_only_on_first_line() {
        let csv = "Data,Ref,Product,Price
2024-01-01,x,A,1.0
data,ref,product,price";

        let (summary, reporter) = run_csv(csv);

        assert_eq!(summary.dispatched, 1);
        assert_eq!(summary.rejected, 1);
        let invalid: Vec<_> = reporter
            .by_source(Source::Main)
            .into_iter()
            .filter(|n| matches!(n, Notification::InvalidLine { .. }))
            .collect();
        assert_eq!(invalid.len(), 1);
    }

    #[test]
    fn test_blank_lines_are_not_the_first_line() {
        let csv = "\n   \n  DATA;ref,product,price\n2024-01-30,x,Lamp,10\n";

        let (summary, reporter) = run_csv(csv);

        assert_eq!(summary.dispatched, 1);
        assert_eq!(summary.rejected, 0);
        assert_eq!(reporter.by_source(Source::SpecialDay).len(), 1);
    }

    #[test]
    fn test_final_total_reported_after_workers() {
        let (_, reporter) = run_csv("2024-01-01,x,A,10\n2024-01-02,x,B,20\n");

        let entries = reporter.entries();
        let spend_pos = entries
            .iter()
            .position(|(s, _)| *s == Source::TotalSpend)
            .unwrap();
        let finished_pos = entries
            .iter()
            .position(|(_, n)| *n == Notification::Finished)
            .unwrap();
        assert!(spend_pos < finished_pos);
        assert_eq!(
            entries.last().unwrap().1,
            Notification::FinalTotal { total: 30.0 }
        );
    }

    #[test]
    fn test_backpressure_with_small_queue() {
        let reporter = Arc::new(CollectingReporter::new());
        let config = AnalysisConfig {
            queue_capacity: 1,
            ..AnalysisConfig::default()
        };
        let analyzer = PurchaseAnalyzer::new(config, reporter.clone());

        let csv: String = (1..=200)
            .map(|i| format!("2024-01-{:02},x,Item{},{}\n", i % 31 + 1, i, i))
            .collect();
        let summary = analyzer.run(Cursor::new(csv)).unwrap();

        assert_eq!(summary.dispatched, 200);
        assert_eq!(summary.total_spend, (1..=200).sum::<i32>() as f64);
    }

    #[test]
    fn test_invalid_utf8_first_line_ends_header_window() {
        let mut input = b"2024-01-01,x,\xff\xfe,5\n".to_vec();
        input.extend_from_slice(b"data,ref,product,price\n2024-01-02,x,A,1\n");

        let reporter = Arc::new(CollectingReporter::new());
        let analyzer = PurchaseAnalyzer::new(AnalysisConfig::default(), reporter.clone());
        let summary = analyzer.run(Cursor::new(input)).unwrap();

        assert_eq!(summary.dispatched, 1);
        assert_eq!(summary.rejected, 2);

        let lines: Vec<String> = reporter
            .by_source(Source::Main)
            .into_iter()
            .filter_map(|n| match n {
                Notification::InvalidLine { line, .. } => Some(line),
                _ => None,
            })
            .collect();
        assert_eq!(
            lines,
            vec![
                "2024-01-01,x,\u{FFFD}\u{FFFD},5".to_string(),
                "data,ref,product,price".to_string(),
            ]
        );
    }

    #[test]
    fn test_raw_line() {
        let record = StringRecord::from(vec!["2024-01-01", " x ", "\"Desk", " oak\"", "abc"]);
        assert_eq!(raw_line(&record), "2024-01-01, x ,\"Desk, oak\",abc");
        assert_eq!(raw_line(&StringRecord::from(vec!["  a", "b  "])), "a,b");
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&StringRecord::from(vec!["   "])));
        assert!(is_blank(&StringRecord::new()));
        assert!(!is_blank(&StringRecord::from(vec!["", ""])));
        assert!(!is_blank(&StringRecord::from(vec!["x"])));
    }

    #[test]
    fn test_is_header() {
        assert!(is_header(&StringRecord::from(vec!["data", "a"])));
        assert!(is_header(&StringRecord::from(vec![" DataCompra", "a"])));
        assert!(!is_header(&StringRecord::from(vec!["2024-01-01", "data"])));
    }
}
