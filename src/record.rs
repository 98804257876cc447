//! Purchase record model and line parsing.

use log::debug;
use std::num::ParseFloatError;
use thiserror::Error;

/// Minimum number of fields a data line must carry.
pub const MIN_FIELDS: usize = 4;

const DATE_FIELD: usize = 0;
const PRODUCT_FIELD: usize = 2;
const PRICE_FIELD: usize = 3;

/// One parsed purchase line.
///
/// Field 1 of the source line is not retained. Each worker receives its own
/// clone of the record through its channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRecord {
    /// Purchase date, nominally `YYYY-MM-DD`. Not validated at parse time.
    pub date: String,

    /// Product name.
    pub product: String,

    /// Price paid. Expected non-negative, not enforced.
    pub price: f64,
}

impl PurchaseRecord {
    /// Creates a record from already-validated parts.
    pub fn new(date: impl Into<String>, product: impl Into<String>, price: f64) -> Self {
        PurchaseRecord {
            date: date.into(),
            product: product.into(),
            price,
        }
    }

    /// Parses the positional fields of one line.
    ///
    /// Extra fields past the price are ignored.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, ParseError> {
        if fields.len() < MIN_FIELDS {
            return Err(ParseError::TooFewFields {
                found: fields.len(),
            });
        }

        let raw_price = fields[PRICE_FIELD].as_ref().trim();
        let price = raw_price.parse::<f64>().map_err(|source| {
            debug!("Price conversion failed for {:?}: {}", raw_price, source);
            ParseError::InvalidPrice {
                value: raw_price.to_string(),
                source,
            }
        })?;

        Ok(PurchaseRecord {
            date: fields[DATE_FIELD].as_ref().trim().to_string(),
            product: fields[PRODUCT_FIELD].as_ref().trim().to_string(),
            price,
        })
    }
}

/// Why a line was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("expected at least 4 fields, found {found}")]
    TooFewFields { found: usize },

    #[error("price {value:?} is not a number")]
    InvalidPrice {
        value: String,
        #[source]
        source: ParseFloatError,
    },
}
