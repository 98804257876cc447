//! The three analysis workers.
//!
//! Each worker drains its own bounded channel until the dispatcher closes it.
//! Workers never fail: per-record problems become notifications and the loop
//! moves on.

use crate::record::PurchaseRecord;
use crate::report::{Notification, Reporter, Source};
use crossbeam::channel::Receiver;
use log::{debug, info};
use std::num::{IntErrorKind, ParseIntError};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Separator between the year, month and day components of a date.
pub const DATE_SEPARATOR: char = '-';

/// Why a day of month could not be read from a date.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DateError {
    #[error("date has no day component")]
    MissingDay,

    #[error("day {value:?} is not an integer")]
    InvalidDay {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Extracts the day of month from a `YYYY-MM-DD`-like date.
///
/// Only the third component is looked at; the year and month are not checked.
/// Any unsigned integer is accepted, however large.
pub fn day_of_month(date: &str) -> Result<u64, DateError> {
    let raw = date
        .split(DATE_SEPARATOR)
        .nth(2)
        .ok_or(DateError::MissingDay)?
        .trim();

    match raw.parse::<u64>() {
        Ok(day) => Ok(day),
        // Well-formed but beyond any calendar day.
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(u64::MAX),
        Err(source) => Err(DateError::InvalidDay {
            value: raw.to_string(),
            source,
        }),
    }
}

/// Reports every purchase whose price is strictly above `threshold`.
pub fn high_value(
    records: Receiver<PurchaseRecord>,
    threshold: f64,
    delay: Duration,
    reporter: &dyn Reporter,
) {
    info!("High-value worker started (threshold {:.2})", threshold);
    let mut flagged = 0usize;

    for record in records.iter() {
        if record.price > threshold {
            flagged += 1;
            reporter.report(
                Source::HighValue,
                Notification::HighValue {
                    product: record.product,
                    price: record.price,
                },
            );
        }
        pause(delay);
    }

    info!("High-value worker finished, {} purchases flagged", flagged);
}

/// Sums every price received and returns the total once the channel closes.
pub fn total_spend(
    records: Receiver<PurchaseRecord>,
    delay: Duration,
    reporter: &dyn Reporter,
) -> f64 {
    info!("Total-spend worker started");
    let mut total = 0.0;
    let mut count = 0usize;

    for record in records.iter() {
        total += record.price;
        count += 1;
        pause(delay);
    }

    reporter.report(Source::TotalSpend, Notification::TotalSpend { total });
    info!(
        "Total-spend worker finished, {} purchases summed to {:.2}",
        count, total
    );
    total
}

/// Reports purchases whose day of month satisfies `is_special`.
///
/// A date whose day cannot be read produces a single date-error notification.
pub fn special_day<F>(
    records: Receiver<PurchaseRecord>,
    is_special: F,
    delay: Duration,
    reporter: &dyn Reporter,
) where
    F: Fn(u64) -> bool,
{
    info!("Special-day worker started");
    let mut matches = 0usize;
    let mut errors = 0usize;

    for record in records.iter() {
        match day_of_month(&record.date) {
            Ok(day) if is_special(day) => {
                matches += 1;
                reporter.report(
                    Source::SpecialDay,
                    Notification::SpecialDay {
                        product: record.product,
                        date: record.date,
                    },
                );
            }
            Ok(_) => {}
            Err(e) => {
                errors += 1;
                debug!("Date {:?} rejected: {}", record.date, e);
                reporter.report(
                    Source::SpecialDay,
                    Notification::DateError { date: record.date },
                );
            }
        }
        pause(delay);
    }

    info!(
        "Special-day worker finished, {} matches, {} bad dates",
        matches, errors
    );
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
