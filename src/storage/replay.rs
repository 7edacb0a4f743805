//! Crash-tolerant replay of a day's log.
//!
//! Runs the day's records through the same debounce rule the live tracker
//! applies, so a process restarted mid-day resumes counting from exactly
//! the state it would have held. Records that fail to parse (malformed
//! timestamps, non-numeric levels, null bytes left by an unclean shutdown,
//! a final line truncated by power loss) are skipped and tallied, never
//! fatal. Skipping a corrupt record can undercount infractions; that is
//! the accepted trade-off for always recovering.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::ThresholdConfig;
use crate::error::LogError;
use crate::storage::log_path;
use crate::tracker::{InfractionTracker, TrackerState};

/// Recovered state for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub date: NaiveDate,
    pub infraction_count: u32,
    pub last_infraction: Option<NaiveDateTime>,
    /// Records skipped as unparseable.
    pub skipped_records: u32,
}

impl ReplaySummary {
    pub fn into_state(self) -> TrackerState {
        TrackerState {
            infraction_count: self.infraction_count,
            last_infraction: self.last_infraction,
        }
    }

    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            infraction_count: 0,
            last_infraction: None,
            skipped_records: 0,
        }
    }
}

/// Replay the log for `date`. A missing file is a day with no
/// measurements: the zero state, not an error.
pub fn replay(
    data_dir: &Path,
    date: NaiveDate,
    thresholds: &ThresholdConfig,
) -> Result<ReplaySummary, LogError> {
    let path = log_path(data_dir, date);
    let raw = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ReplaySummary::empty(date));
        }
        Err(e) => return Err(LogError::io(&path, e)),
    };

    // Power failures leave null bytes in the tail; strip them before
    // parsing, exactly as any other reader of these files must.
    let cleaned: Vec<u8> = raw.into_iter().filter(|&b| b != 0).collect();

    let mut tracker = InfractionTracker::new(thresholds);
    let mut skipped = 0u32;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(cleaned.as_slice());

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        match parse_record(&record) {
            Ok((at, level_db)) => {
                tracker.observe(at, level_db);
            }
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!(
            "[Replay] Skipped {} unparseable record(s) in {:?}; recovered count may be low",
            skipped,
            path
        );
    }

    let state = tracker.state().clone();
    Ok(ReplaySummary {
        date,
        infraction_count: state.infraction_count,
        last_infraction: state.last_infraction,
        skipped_records: skipped,
    })
}

fn parse_record(record: &csv::StringRecord) -> Result<(NaiveDateTime, f64), LogError> {
    let (ts_field, level_field) = match (record.get(0), record.get(1)) {
        (Some(ts), Some(level)) => (ts, level),
        _ => {
            return Err(LogError::Parse {
                line: record.iter().collect::<Vec<_>>().join(","),
            })
        }
    };

    let at = parse_timestamp(ts_field)?;
    let level_db = level_field.trim().parse::<f64>().map_err(|_| LogError::Parse {
        line: level_field.to_string(),
    })?;
    Ok((at, level_db))
}

/// Parse a record timestamp. The live writer emits
/// `YYYY-MM-DD HH:MM:SS.ffffff`; other producers of these files have
/// historically appended a literal `Z` or used a `T` separator, all
/// meaning the same local instant.
pub fn parse_timestamp(field: &str) -> Result<NaiveDateTime, LogError> {
    let trimmed = field.trim();
    let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    for format in FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(at);
        }
    }
    Err(LogError::Parse {
        line: field.to_string(),
    })
}
