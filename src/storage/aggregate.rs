//! Multi-day aggregation for reporting.
//!
//! Off the live path: walks a trailing window of daily logs through
//! replay and collects per-day infraction counts, oldest first, the shape
//! a history chart consumes.

use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::config::ThresholdConfig;
use crate::error::LogError;
use crate::storage::replay::replay;

/// One day's infraction count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub infraction_count: u32,
}

/// Per-day infraction counts for the `n_days` ending at `end_date`
/// inclusive, in ascending date order. Days with no log file count zero.
pub fn aggregate(
    data_dir: &Path,
    end_date: NaiveDate,
    n_days: u32,
    thresholds: &ThresholdConfig,
) -> Result<Vec<DayCount>, LogError> {
    let mut results = Vec::with_capacity(n_days as usize);
    for offset in (0..n_days as i64).rev() {
        let date = end_date - Duration::days(offset);
        let summary = replay(data_dir, date, thresholds)?;
        results.push(DayCount {
            date,
            infraction_count: summary.infraction_count,
        });
    }
    Ok(results)
}
