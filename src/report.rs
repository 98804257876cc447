//! Console notifications emitted during a run.
//!
//! Every line is tagged `[<name>:<who>]`, where `<name>` identifies the
//! customer file and `<who>` the thread that produced the line.

use log::warn;
use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

/// The execution unit a notification comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// The dispatching thread.
    Main,
    /// Worker 1, high-value purchases.
    HighValue,
    /// Worker 2, total spend.
    TotalSpend,
    /// Worker 3, special-day purchases.
    SpecialDay,
}

impl Source {
    /// Short tag used in output prefixes and thread names.
    pub fn tag(self) -> &'static str {
        match self {
            Source::Main => "main",
            Source::HighValue => "P1",
            Source::TotalSpend => "P2",
            Source::SpecialDay => "P3",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Something worth telling the user about.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Started,
    InvalidLine { line: String, reason: String },
    HighValue { product: String, price: f64 },
    TotalSpend { total: f64 },
    SpecialDay { product: String, date: String },
    DateError { date: String },
    Finished,
    FinalTotal { total: f64 },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Started => write!(f, "Analysis started."),
            Notification::InvalidLine { line, reason } => {
                write!(f, "Invalid line: {} ({})", line, reason)
            }
            Notification::HighValue { product, price } => {
                write!(f, "Expensive purchase: {} -> {:.2}", product, price)
            }
            Notification::TotalSpend { total } | Notification::FinalTotal { total } => {
                write!(f, "Total spent: {:.2}", total)
            }
            Notification::SpecialDay { product, date } => {
                write!(f, "Special-day purchase: {} -> {}", product, date)
            }
            Notification::DateError { date } => write!(f, "Could not process date: {}", date),
            Notification::Finished => write!(f, "Analysis finished."),
        }
    }
}

/// Formats the `[name:who]` prefix.
pub fn prefix(name: &str, source: Source) -> String {
    format!("[{}:{}]", name, source.tag())
}

/// Output sink shared by the dispatcher and all workers.
pub trait Reporter: Send + Sync {
    fn report(&self, source: Source, notification: Notification);
}

/// Writes notifications to stdout, one line each.
#[derive(Debug)]
pub struct ConsoleReporter {
    name: String,
}

impl ConsoleReporter {
    pub fn new(name: impl Into<String>) -> Self {
        ConsoleReporter { name: name.into() }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, source: Source, notification: Notification) {
        // Lock per line so lines from different workers never interleave.
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        if let Err(e) = writeln!(handle, "{} {}", prefix(&self.name, source), notification) {
            warn!("Failed to write notification: {}", e);
        }
    }
}

/// Keeps notifications in memory, in arrival order.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    entries: Mutex<Vec<(Source, Notification)>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything reported so far.
    pub fn entries(&self) -> Vec<(Source, Notification)> {
        self.lock().clone()
    }

    /// Returns the notifications reported by `source`, in order.
    pub fn by_source(&self, source: Source) -> Vec<Notification> {
        self.lock()
            .iter()
            .filter(|(s, _)| *s == source)
            .map(|(_, n)| n.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Source, Notification)>> {
        // A panicking worker must not hide what was collected before it.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, source: Source, notification: Notification) {
        self.lock().push((source, notification));
    }
}
