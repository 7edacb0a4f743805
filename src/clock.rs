//! Wall-clock seam.
//!
//! Measurements are stamped with local time because the daily log's
//! identity is the local date. The trait exists so tests can drive the
//! day-rollover and grace-period logic with a scripted clock.

use chrono::{Local, NaiveDateTime};

pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local system time.
#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Scripted clock: returns queued instants in order, then keeps repeating
/// the last one.
#[derive(Default)]
pub struct ManualClock {
    instants: std::cell::RefCell<Vec<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(mut instants: Vec<NaiveDateTime>) -> Self {
        instants.reverse();
        Self {
            instants: std::cell::RefCell::new(instants),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        let mut instants = self.instants.borrow_mut();
        if instants.len() > 1 {
            instants.pop().expect("non-empty")
        } else {
            *instants.last().expect("ManualClock needs at least one instant")
        }
    }
}
