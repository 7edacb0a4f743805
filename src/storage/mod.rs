//! Durable per-day measurement logs.
//!
//! One CSV file per calendar date at `<data_dir>/<YYYY>/<YYYYMMDD>.csv`,
//! two columns (local timestamp, decibel level), no header line; a header
//! would be duplicated every time the process restarts mid-day. Files are
//! append-only: never truncated, never deleted, flushed per record.

pub mod aggregate;
pub mod replay;

pub use aggregate::{aggregate, DayCount};
pub use replay::{replay, ReplaySummary};

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::LogError;

/// Timestamp layout used in log records (local wall clock, no zone suffix).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Path of the daily log for `date`.
pub fn log_path(data_dir: &Path, date: NaiveDate) -> PathBuf {
    data_dir
        .join(date.format("%Y").to_string())
        .join(format!("{}.csv", date.format("%Y%m%d")))
}

/// Append-only writer for the current day's log.
///
/// Rotates automatically when a record's local date differs from the open
/// file's date; the caller notices rollover via [`DailyLogWriter::date`]
/// and resets its tracker accordingly.
pub struct DailyLogWriter {
    data_dir: PathBuf,
    date: NaiveDate,
    writer: csv::Writer<File>,
}

impl DailyLogWriter {
    /// Open (creating lazily) the log for `date`.
    pub fn open(data_dir: &Path, date: NaiveDate) -> Result<Self, LogError> {
        let writer = Self::open_file(data_dir, date)?;
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            date,
            writer,
        })
    }

    fn open_file(data_dir: &Path, date: NaiveDate) -> Result<csv::Writer<File>, LogError> {
        let path = log_path(data_dir, date);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| LogError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LogError::io(&path, e))?;
        Ok(csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file))
    }

    /// Date of the currently open file.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Path of the currently open file.
    pub fn path(&self) -> PathBuf {
        log_path(&self.data_dir, self.date)
    }

    /// Append one measurement record to the log for `at`'s local date,
    /// rotating to a new file first if the date has changed. The record is
    /// flushed before returning; durability beats throughput at tens of
    /// records per second.
    pub fn append(&mut self, at: NaiveDateTime, level_db: f64) -> Result<(), LogError> {
        if at.date() != self.date {
            self.writer
                .flush()
                .map_err(|e| LogError::io(self.path(), e))?;
            self.writer = Self::open_file(&self.data_dir, at.date())?;
            self.date = at.date();
            log::info!("[Storage] Rotated daily log to {:?}", self.path());
        }

        let path = self.path();
        self.writer
            .write_record([
                at.format(TIMESTAMP_FORMAT).to_string(),
                format_level(level_db),
            ])
            .map_err(|e| LogError::io(&path, std::io::Error::other(e)))?;
        self.writer.flush().map_err(|e| LogError::io(&path, e))
    }
}

/// Level field formatting. `-inf` (a silent frame) serializes to a token
/// `f64::from_str` parses back on replay.
fn format_level(level_db: f64) -> String {
    level_db.to_string()
}
