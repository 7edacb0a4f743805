//! The monitoring session: one continuous polling loop per process.
//!
//! Everything the loop touches is owned here: source, meter, tracker,
//! writer, indicator, feed, clock. There is no ambient mutable state
//! and no second thread of control over any of it. The only cross-thread
//! touch points are the shutdown flag and the broadcast sends, both
//! non-blocking.
//!
//! On construction the session replays today's log so a mid-day restart
//! resumes counting from the exact state the previous process held.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::capture::AudioSource;
use crate::clock::Clock;
use crate::config::MonitorConfig;
use crate::error::{CaptureError, LogError};
use crate::indicator::Indicator;
use crate::live::LiveFeed;
use crate::meter::DecibelMeter;
use crate::storage::{replay, DailyLogWriter};
use crate::tracker::{InfractionTracker, TrackerState};
use crate::zone::Zone;

/// Consecutive acquisition failures after which the session gives up.
/// Transient hiccups clear in one or two iterations; a device that stays
/// silent this long is not coming back without operator attention.
const MAX_CONSECUTIVE_FAILURES: u32 = 25;

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Operator-initiated stop; exit zero.
    ShutdownRequested,
    /// The audio source hung up entirely.
    SourceLost,
    /// Too many consecutive acquisition failures.
    AcquisitionStalled,
}

/// What a finished session did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames_processed: u64,
    pub acquisition_errors: u64,
    pub infraction_count: u32,
    pub end_reason: EndReason,
}

pub struct MonitorSession<S: AudioSource, I: Indicator, C: Clock> {
    config: MonitorConfig,
    source: S,
    indicator: I,
    clock: C,
    meter: DecibelMeter,
    tracker: InfractionTracker,
    writer: DailyLogWriter,
    feed: LiveFeed,
    shutdown: Arc<AtomicBool>,
    acquisition_errors: u64,
    frames_processed: u64,
    last_zone: Option<Zone>,
    last_printed: f64,
}

impl<S: AudioSource, I: Indicator, C: Clock> MonitorSession<S, I, C> {
    /// Build a session: replay today's log to seed the tracker, then open
    /// the log for appending. Failure to open the log path is fatal here;
    /// without persistence the monitor has no purpose.
    pub fn start(
        config: MonitorConfig,
        source: S,
        indicator: I,
        clock: C,
    ) -> Result<Self, LogError> {
        let data_dir = std::path::PathBuf::from(&config.storage.data_dir);
        let today = clock.now().date();

        let recovered = replay(&data_dir, today, &config.thresholds)?;
        log::info!(
            "[Monitor] Resuming {} with {} prior infraction(s), last at {:?}",
            today,
            recovered.infraction_count,
            recovered.last_infraction
        );

        let tracker =
            InfractionTracker::with_state(&config.thresholds, recovered.into_state());
        let writer = DailyLogWriter::open(&data_dir, today)?;
        let meter = DecibelMeter::new(config.audio.sample_rate);

        Ok(Self {
            config,
            source,
            indicator,
            clock,
            meter,
            tracker,
            writer,
            feed: LiveFeed::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
            acquisition_errors: 0,
            frames_processed: 0,
            last_zone: None,
            last_printed: 0.0,
        })
    }

    /// Live-feed hub; subscribe before calling [`MonitorSession::run`].
    pub fn feed(&self) -> &LiveFeed {
        &self.feed
    }

    /// Flag that stops the loop at the next acquisition point.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn tracker_state(&self) -> &TrackerState {
        self.tracker.state()
    }

    /// Run until shutdown is requested or the source is gone. The in-flight
    /// record always completes before resources are released.
    pub fn run(&mut self) -> SessionSummary {
        log::info!("[Monitor] Listening");
        let mut consecutive_failures = 0u32;

        let end_reason = loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break EndReason::ShutdownRequested;
            }

            let frame = match self.source.read_frame() {
                Ok(frame) => {
                    consecutive_failures = 0;
                    frame
                }
                Err(CaptureError::Disconnected) => {
                    log::error!("[Monitor] Audio source disconnected");
                    break EndReason::SourceLost;
                }
                Err(err) => {
                    self.acquisition_errors += 1;
                    consecutive_failures += 1;
                    log::warn!(
                        "[Monitor] ({}) Error recording: {}",
                        self.acquisition_errors,
                        err
                    );
                    if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                        log::error!(
                            "[Monitor] {} consecutive acquisition failures; giving up",
                            consecutive_failures
                        );
                        break EndReason::AcquisitionStalled;
                    }
                    continue;
                }
            };

            self.process_frame(&frame);
        };

        self.indicator.off();
        let summary = SessionSummary {
            frames_processed: self.frames_processed,
            acquisition_errors: self.acquisition_errors,
            infraction_count: self.tracker.state().infraction_count,
            end_reason,
        };
        log::info!(
            "[Monitor] Session over: {} frame(s), {} acquisition error(s), {} infraction(s)",
            summary.frames_processed,
            summary.acquisition_errors,
            summary.infraction_count
        );
        summary
    }

    fn process_frame(&mut self, frame: &[i16]) {
        let now = self.clock.now();

        // Day rollover: the writer rotates on its own; counters reset here
        // because replay only ever considers the current day's file.
        if now.date() != self.writer.date() {
            log::info!("[Monitor] Local date changed to {}; fresh counters", now.date());
            self.tracker.reset();
        }

        let level_db = self.meter.level_db(frame);

        // Persist first: the log is the authoritative record, everything
        // after this is derived or best-effort. A write failure loses one
        // measurement, not the session.
        if let Err(err) = self.writer.append(now, level_db) {
            log::error!("[Monitor] Failed to append measurement: {}", err);
        }

        let zone = Zone::classify(level_db, &self.config.thresholds);
        if self.last_zone != Some(zone) {
            self.indicator.set_zone(zone);
            self.last_zone = Some(zone);
        }

        if let Some(event) = self.tracker.observe(now, level_db) {
            log::info!("  Infraction #{}", event.sequence);
            self.feed.publish_infraction(event.at, event.sequence);
        }

        if level_db >= self.config.thresholds.send_threshold {
            self.feed.publish_level(now, level_db);
        }

        if (level_db - self.last_printed).abs() > self.config.thresholds.print_delta {
            self.last_printed = level_db;
            log::info!("A-weighted: {:+.2} dB", level_db);
        }

        self.frames_processed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ScriptedSource;
    use crate::clock::ManualClock;
    use crate::config::{StorageConfig, ThresholdConfig};
    use crate::indicator::recording::RecordingIndicator;
    use crate::indicator::NullIndicator;
    use crate::storage::test_support::{cleanup, scratch_dir};
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use std::f64::consts::PI;

    const FRAME_SIZE: usize = 1024;
    const SAMPLE_RATE: u32 = 16_000;

    fn config(data_dir: &std::path::Path) -> MonitorConfig {
        MonitorConfig {
            thresholds: ThresholdConfig {
                infraction_level: 75.0,
                warning_level: 65.0,
                grace_period_seconds: 60,
                send_threshold: 50.0,
                print_delta: 10.0,
            },
            audio: crate::config::AudioConfig {
                sample_rate: SAMPLE_RATE,
                frame_size: FRAME_SIZE,
            },
            storage: StorageConfig {
                data_dir: data_dir.to_string_lossy().into_owned(),
            },
        }
    }

    /// 1 kHz tone frame whose A-weighted level lands at `target_db`
    /// (weighting is unity at 1 kHz; rms of a sine is amplitude / sqrt(2)).
    fn tone_frame(target_db: f64) -> Vec<i16> {
        let amplitude = 10f64.powf((target_db + 3.0103) / 20.0);
        (0..FRAME_SIZE)
            .map(|i| (amplitude * (2.0 * PI * 1000.0 * i as f64 / SAMPLE_RATE as f64).sin()) as i16)
            .collect()
    }

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn scripted(levels_at: &[(i64, f64)]) -> (ScriptedSource, ManualClock) {
        let mut source = ScriptedSource::new(FRAME_SIZE);
        let mut instants = Vec::new();
        for &(t, level) in levels_at {
            source.push_frame(tone_frame(level));
            instants.push(base_time() + Duration::seconds(t));
        }
        // session start reads the clock once to pick the day
        if let Some(&first) = instants.first() {
            instants.insert(0, first);
        }
        (source, ManualClock::new(instants))
    }

    #[test]
    fn test_acceptance_scenario_counts_two_infractions() {
        let dir = scratch_dir("session_acceptance");
        let (source, clock) =
            scripted(&[(0, 60.0), (1, 80.0), (2, 81.0), (70, 40.0), (71, 82.0)]);

        let mut session =
            MonitorSession::start(config(&dir), source, NullIndicator, clock).unwrap();
        let summary = session.run();

        assert_eq!(summary.frames_processed, 5);
        assert_eq!(summary.infraction_count, 2);
        assert_eq!(summary.end_reason, EndReason::SourceLost);
        cleanup(&dir);
    }

    #[test]
    fn test_live_log_replays_to_identical_state() {
        let dir = scratch_dir("session_replay_parity");
        let script: Vec<(i64, f64)> = (0..40).map(|t| (t * 5, if t % 3 == 0 { 85.0 } else { 55.0 })).collect();
        let (source, clock) = scripted(&script);

        let mut session =
            MonitorSession::start(config(&dir), source, NullIndicator, clock).unwrap();
        session.run();
        let live_state = session.tracker_state().clone();

        let recovered = replay(&dir, base_time().date(), &config(&dir).thresholds)
            .unwrap()
            .into_state();
        assert_eq!(recovered, live_state);
        assert!(live_state.infraction_count > 0);
        cleanup(&dir);
    }

    #[test]
    fn test_restart_resumes_counting_not_resetting() {
        let dir = scratch_dir("session_restart");

        // first process: one infraction
        let (source, clock) = scripted(&[(0, 80.0)]);
        let mut session =
            MonitorSession::start(config(&dir), source, NullIndicator, clock).unwrap();
        session.run();

        // restart 30 s later, still inside the grace window: loud frame
        // must NOT count. 100 s later it must.
        let (source, clock) = scripted(&[(30, 82.0), (100, 82.0)]);
        let mut session =
            MonitorSession::start(config(&dir), source, NullIndicator, clock).unwrap();
        let summary = session.run();

        assert_eq!(summary.infraction_count, 2);
        cleanup(&dir);
    }

    #[test]
    fn test_transient_errors_are_counted_and_survived() {
        let dir = scratch_dir("session_errors");
        let mut source = ScriptedSource::new(FRAME_SIZE);
        source
            .push_error(CaptureError::Timeout { waited_ms: 2000 })
            .push_frame(tone_frame(80.0))
            .push_error(CaptureError::Timeout { waited_ms: 2000 })
            .push_frame(tone_frame(55.0));
        // first instant doubled: session start reads the clock for the day
        let clock = ManualClock::new(vec![
            base_time(),
            base_time(),
            base_time() + Duration::seconds(1),
        ]);

        let mut session =
            MonitorSession::start(config(&dir), source, NullIndicator, clock).unwrap();
        let summary = session.run();

        assert_eq!(summary.frames_processed, 2);
        assert_eq!(summary.acquisition_errors, 2);
        assert_eq!(summary.infraction_count, 1);
        cleanup(&dir);
    }

    #[test]
    fn test_indicator_follows_zone_changes_only() {
        let dir = scratch_dir("session_indicator");
        let (source, clock) =
            scripted(&[(0, 60.0), (1, 80.0), (2, 81.0), (3, 40.0), (4, 82.0)]);

        let indicator = RecordingIndicator::default();
        let mut session =
            MonitorSession::start(config(&dir), source, indicator, clock).unwrap();
        session.run();

        let calls = session.indicator.calls.borrow().clone();
        assert_eq!(
            calls,
            vec![
                Some(Zone::Normal),
                Some(Zone::Infraction),
                // 81 dB repeats the zone: no call
                Some(Zone::Normal),
                Some(Zone::Infraction),
                None, // off() at shutdown
            ]
        );
        cleanup(&dir);
    }

    #[test]
    fn test_live_feed_gating_and_notices() {
        let dir = scratch_dir("session_feed");
        let (source, clock) = scripted(&[(0, 45.0), (1, 80.0)]);

        let mut session =
            MonitorSession::start(config(&dir), source, NullIndicator, clock).unwrap();
        let mut levels = session.feed().subscribe_levels();
        let mut notices = session.feed().subscribe_infractions();
        session.run();

        // 45 dB is below send_threshold: only the 80 dB frame is charted
        let update = levels.try_recv().unwrap();
        assert!((update.level - 80.0).abs() < 1.0);
        assert!(levels.try_recv().is_err());

        let notice = notices.try_recv().unwrap();
        assert_eq!(notice.infraction_count, 1);
        cleanup(&dir);
    }

    #[test]
    fn test_midnight_rollover_resets_counters_and_rotates() {
        let dir = scratch_dir("session_midnight");
        let mut source = ScriptedSource::new(FRAME_SIZE);
        source.push_frame(tone_frame(80.0)).push_frame(tone_frame(80.0));

        let before = NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let after = NaiveDate::from_ymd_opt(2025, 6, 3)
            .unwrap()
            .and_hms_opt(0, 0, 1)
            .unwrap();
        // first instant doubled: session start reads the clock for the day
        let clock = ManualClock::new(vec![before, before, after]);

        let mut session =
            MonitorSession::start(config(&dir), source, NullIndicator, clock).unwrap();
        let summary = session.run();

        // the second loud frame lands on a fresh day: count restarts at 1
        assert_eq!(summary.infraction_count, 1);

        let monday = replay(&dir, before.date(), &config(&dir).thresholds).unwrap();
        let tuesday = replay(&dir, after.date(), &config(&dir).thresholds).unwrap();
        assert_eq!(monday.infraction_count, 1);
        assert_eq!(tuesday.infraction_count, 1);
        cleanup(&dir);
    }

    #[test]
    fn test_shutdown_flag_stops_cleanly() {
        let dir = scratch_dir("session_shutdown");
        let (source, clock) = scripted(&[(0, 60.0)]);

        let mut session =
            MonitorSession::start(config(&dir), source, NullIndicator, clock).unwrap();
        session.shutdown_handle().store(true, Ordering::SeqCst);
        let summary = session.run();

        assert_eq!(summary.end_reason, EndReason::ShutdownRequested);
        assert_eq!(summary.frames_processed, 0);
        cleanup(&dir);
    }
}
