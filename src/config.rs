//! Analysis constants and their environment overrides.

use crate::error::{AnalyzerError, Result};
use std::env;
use std::time::Duration;

/// Default capacity of each worker channel.
pub const DEFAULT_QUEUE_CAPACITY: usize = 5;

/// Prices strictly above this are reported as expensive.
pub const DEFAULT_PRICE_THRESHOLD: f64 = 1000.0;

/// Days of month that count as special.
pub const SPECIAL_DAYS: [u32; 3] = [29, 30, 31];

pub const QUEUE_CAPACITY_VAR: &str = "ANALYZER_QUEUE_CAPACITY";
pub const PRICE_THRESHOLD_VAR: &str = "ANALYZER_PRICE_THRESHOLD";
pub const RECORD_DELAY_VAR: &str = "ANALYZER_RECORD_DELAY_MS";

/// Settings for one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Bound of each of the three worker channels. Must be non-zero.
    pub queue_capacity: usize,

    /// High-value threshold; comparison is strict.
    pub price_threshold: f64,

    /// Days of month reported by the special-day worker.
    pub special_days: Vec<u32>,

    /// Pause each worker takes after handling a record.
    pub record_delay: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            price_threshold: DEFAULT_PRICE_THRESHOLD,
            special_days: SPECIAL_DAYS.to_vec(),
            record_delay: Duration::ZERO,
        }
    }
}

impl AnalysisConfig {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration, taking overrides from `lookup`.
    ///
    /// Unset keys keep their defaults. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AnalysisConfig::default();
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = read(QUEUE_CAPACITY_VAR) {
            config.queue_capacity = match value.trim().parse::<usize>() {
                Ok(capacity) if capacity > 0 => capacity,
                _ => return Err(invalid(QUEUE_CAPACITY_VAR, value)),
            };
        }

        if let Some(value) = read(PRICE_THRESHOLD_VAR) {
            config.price_threshold = match value.trim().parse::<f64>() {
                Ok(threshold) if threshold.is_finite() => threshold,
                _ => return Err(invalid(PRICE_THRESHOLD_VAR, value)),
            };
        }

        if let Some(value) = read(RECORD_DELAY_VAR) {
            config.record_delay = match value.trim().parse::<u64>() {
                Ok(millis) => Duration::from_millis(millis),
                Err(_) => return Err(invalid(RECORD_DELAY_VAR, value)),
            };
        }

        Ok(config)
    }

    /// Returns `true` if `day` is one of the configured special days.
    pub fn is_special_day(&self, day: u64) -> bool {
        u32::try_from(day).map_or(false, |day| self.special_days.contains(&day))
    }
}

fn invalid(key: &'static str, value: String) -> AnalyzerError {
    AnalyzerError::InvalidConfig { key, value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.queue_capacity, 5);
        assert_eq!(config.price_threshold, 1000.0);
        assert_eq!(config.special_days, vec![29, 30, 31]);
        assert_eq!(config.record_delay, Duration::ZERO);
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let config = AnalysisConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = AnalysisConfig::from_lookup(lookup_from(&[
            (QUEUE_CAPACITY_VAR, "16"),
            (PRICE_THRESHOLD_VAR, " 250.5 "),
            (RECORD_DELAY_VAR, "10"),
        ]))
        .unwrap();

        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.price_threshold, 250.5);
        assert_eq!(config.record_delay, Duration::from_millis(10));
    }

    #[test]
    fn test_blank_value_is_ignored() {
        let config =
            AnalysisConfig::from_lookup(lookup_from(&[(QUEUE_CAPACITY_VAR, "  ")])).unwrap();
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = AnalysisConfig::from_lookup(lookup_from(&[(QUEUE_CAPACITY_VAR, "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::InvalidConfig { key: QUEUE_CAPACITY_VAR, .. }
        ));
    }

    #[test]
    fn test_rejects_non_finite_threshold() {
        let err = AnalysisConfig::from_lookup(lookup_from(&[(PRICE_THRESHOLD_VAR, "inf")]))
            .unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::InvalidConfig { key: PRICE_THRESHOLD_VAR, .. }
        ));
    }

    #[test]
    fn test_rejects_garbage_delay() {
        let err = AnalysisConfig::from_lookup(lookup_from(&[(RECORD_DELAY_VAR, "soon")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value \"soon\" for ANALYZER_RECORD_DELAY_MS"
        );
    }

    #[test]
    fn test_special_days() {
        let config = AnalysisConfig::default();
        assert!(config.is_special_day(29));
        assert!(config.is_special_day(31));
        assert!(!config.is_special_day(28));
        assert!(!config.is_special_day(1));
        assert!(!config.is_special_day(u64::from(u32::MAX) + 29));
    }
}
