//! Infraction tracking: debounces a stream of classified measurements into
//! discrete counted events.
//!
//! The grace period is a time-window debounce against the previous counted
//! event, not a zone-exit reset: a continuously loud signal produces one
//! event per elapsed grace window, never one per frame.

use chrono::{Duration, NaiveDateTime};

use crate::config::ThresholdConfig;
use crate::zone::Zone;

/// Counter state for the current day, fully derivable by replaying the
/// day's log.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackerState {
    pub infraction_count: u32,
    pub last_infraction: Option<NaiveDateTime>,
}

/// A counted infraction. `sequence` is the running count after this event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfractionEvent {
    pub at: NaiveDateTime,
    pub sequence: u32,
}

/// Stateful debounce over the measurement stream.
pub struct InfractionTracker {
    thresholds: ThresholdConfig,
    grace_period: Duration,
    state: TrackerState,
}

impl InfractionTracker {
    pub fn new(thresholds: &ThresholdConfig) -> Self {
        Self {
            thresholds: thresholds.clone(),
            grace_period: Duration::seconds(thresholds.grace_period_seconds),
            state: TrackerState::default(),
        }
    }

    /// Seed state recovered by replaying today's log before live
    /// processing resumes.
    pub fn with_state(thresholds: &ThresholdConfig, state: TrackerState) -> Self {
        Self {
            state,
            ..Self::new(thresholds)
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Fresh state at day rollover.
    pub fn reset(&mut self) {
        self.state = TrackerState::default();
    }

    /// Apply the transition rule for one measurement.
    ///
    /// Emits an event when the level is in the Infraction zone and either
    /// no infraction has been counted today or the grace period has fully
    /// elapsed since the last counted one.
    pub fn observe(&mut self, at: NaiveDateTime, level_db: f64) -> Option<InfractionEvent> {
        if Zone::classify(level_db, &self.thresholds) != Zone::Infraction {
            return None;
        }

        let past_grace = match self.state.last_infraction {
            None => true,
            Some(last) => at - last > self.grace_period,
        };
        if !past_grace {
            return None;
        }

        self.state.infraction_count += 1;
        self.state.last_infraction = Some(at);
        Some(InfractionEvent {
            at,
            sequence: self.state.infraction_count,
        })
    }
}
