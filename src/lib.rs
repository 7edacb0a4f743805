// Noise Monitor - ambient sound level monitoring
// A-weighted metering, infraction tracking, durable per-day logs

// Module declarations
pub mod capture;
pub mod clock;
pub mod config;
pub mod dsp;
pub mod error;
pub mod indicator;
pub mod live;
pub mod meter;
pub mod monitor;
pub mod storage;
pub mod tracker;
pub mod zone;

// Re-exports for convenience
pub use config::MonitorConfig;
pub use error::{CaptureError, LogError};
pub use monitor::{MonitorSession, SessionSummary};
pub use tracker::{InfractionEvent, TrackerState};
pub use zone::Zone;

/// Initialize logging from the environment (RUST_LOG).
pub fn init_logging() {
    env_logger::init();
}
