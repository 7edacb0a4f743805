//! Visual indicator boundary.
//!
//! The deployed unit drives an LED ring; anything implementing
//! [`Indicator`] can stand in. Calls are fire-and-forget: no result, no
//! acknowledgment, and the monitor loop never waits on them.

use crate::zone::Zone;

pub trait Indicator {
    fn set_zone(&self, zone: Zone);
    fn off(&self);
}

/// Logs zone transitions in place of hardware. Mirrors the LED ring's
/// behavior: infraction bright red, warning dim green, normal off.
#[derive(Default)]
pub struct ConsoleIndicator;

impl Indicator for ConsoleIndicator {
    fn set_zone(&self, zone: Zone) {
        match zone {
            Zone::Infraction => log::info!("[Indicator] RED (bright): infraction zone"),
            Zone::Warning => log::info!("[Indicator] green (dim): warning zone"),
            Zone::Normal => log::debug!("[Indicator] off: normal zone"),
        }
    }

    fn off(&self) {
        log::debug!("[Indicator] off");
    }
}

/// Discards all updates.
#[derive(Default)]
pub struct NullIndicator;

impl Indicator for NullIndicator {
    fn set_zone(&self, _zone: Zone) {}
    fn off(&self) {}
}
