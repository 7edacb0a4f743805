//! Live event channel for the dashboard.
//!
//! Two broadcast channels: raw level updates (gated by `send_threshold`,
//! meant for charting) and infraction notices (one per counted event).
//! Delivery is best-effort: publishing never blocks the monitor loop and
//! a send with no subscribers is not an error. Nothing here is
//! authoritative; the daily log is.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Raw level sample for charting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelUpdate {
    pub time: NaiveDateTime,
    pub level: f64,
}

/// A counted infraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfractionNotice {
    pub time: NaiveDateTime,
    pub infraction_count: u32,
}

/// Broadcast hub for live consumers.
///
/// Buffer sizes cover a burst of a few seconds at the monitor's frame
/// rate; lagged subscribers lose the oldest messages, which is the right
/// trade for a chart feed.
pub struct LiveFeed {
    level_tx: broadcast::Sender<LevelUpdate>,
    infraction_tx: broadcast::Sender<InfractionNotice>,
}

impl LiveFeed {
    pub fn new() -> Self {
        let (level_tx, _) = broadcast::channel(128);
        let (infraction_tx, _) = broadcast::channel(32);
        Self {
            level_tx,
            infraction_tx,
        }
    }

    pub fn subscribe_levels(&self) -> broadcast::Receiver<LevelUpdate> {
        self.level_tx.subscribe()
    }

    pub fn subscribe_infractions(&self) -> broadcast::Receiver<InfractionNotice> {
        self.infraction_tx.subscribe()
    }

    /// Publish a raw level sample. Caller applies the send-threshold gate.
    pub fn publish_level(&self, time: NaiveDateTime, level: f64) {
        let _ = self.level_tx.send(LevelUpdate { time, level });
    }

    pub fn publish_infraction(&self, time: NaiveDateTime, infraction_count: u32) {
        let _ = self.infraction_tx.send(InfractionNotice {
            time,
            infraction_count,
        });
    }
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new()
    }
}
