//! Configuration for the monitoring session.
//!
//! All tunable parameters live in one struct with named fields, loaded from
//! a JSON file once at startup and immutable for the process lifetime.
//! A missing or malformed file falls back to defaults with a warning so the
//! monitor still comes up on a fresh install.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub thresholds: ThresholdConfig,
    pub audio: AudioConfig,
    pub storage: StorageConfig,
}

/// Decibel thresholds and event timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Level above which a measurement is in the Infraction zone (dB)
    pub infraction_level: f64,
    /// Level above which a measurement is in the Warning zone (dB)
    pub warning_level: f64,
    /// Minimum seconds between two counted infractions
    pub grace_period_seconds: i64,
    /// Levels at or above this are pushed to the live feed (dB)
    pub send_threshold: f64,
    /// Console output fires when the level moves more than this since the
    /// last printed value (dB)
    pub print_delta: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            infraction_level: 75.0,
            warning_level: 65.0,
            grace_period_seconds: 60,
            send_threshold: 50.0,
            print_delta: 10.0,
        }
    }
}

/// Capture parameters, fixed for the process lifetime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Samples per frame; one frame yields one measurement
    pub frame_size: usize,
}

impl AudioConfig {
    /// Duration of one frame in seconds (the effective sample interval).
    pub fn frame_seconds(&self) -> f64 {
        self.frame_size as f64 / self.sample_rate as f64
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            frame_size: 1024,
        }
    }
}

/// Daily-log storage layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for per-day logs (year subdirectories underneath)
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            audio: AudioConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a JSON file, falling back to defaults if the
    /// file is missing or invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<MonitorConfig>(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        };
        config.validated()
    }

    /// Enforce threshold ordering; an inverted pair would misclassify every
    /// frame, so fall back to defaults rather than run with it.
    fn validated(self) -> Self {
        if self.thresholds.warning_level >= self.thresholds.infraction_level {
            log::warn!(
                "[Config] warning_level ({}) must be below infraction_level ({}); using default thresholds",
                self.thresholds.warning_level,
                self.thresholds.infraction_level
            );
            return Self {
                thresholds: ThresholdConfig::default(),
                ..self
            };
        }
        self
    }
}
