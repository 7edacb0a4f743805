//! Time-domain DSP primitives: the A-weighting filter and level math.

pub mod level;
pub mod weighting;

pub use level::{db_from_rms, rms};
pub use weighting::AWeighting;
