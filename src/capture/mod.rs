//! Audio acquisition boundary.
//!
//! The monitor loop only ever sees [`AudioSource::read_frame`]: a blocking
//! call that yields one fixed-size frame of signed 16-bit samples or a
//! transient [`CaptureError`]. The call is the loop's natural suspension
//! point; shutdown and cancellation are handled around it, never inside a
//! frame.

use crate::error::CaptureError;

/// One fixed-size frame of mono PCM samples.
pub type Frame = Vec<i16>;

/// Source of fixed-size audio frames.
///
/// Not `Send`: a cpal stream is pinned to the thread that opened it, and
/// the session runs its loop right there.
pub trait AudioSource {
    /// Block until a full frame is available.
    ///
    /// Errors are transient from the caller's perspective: count, log,
    /// retry on the next iteration. A source that can no longer produce
    /// frames at all keeps returning errors and the caller escalates.
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Samples per frame, fixed for the life of the source.
    fn frame_size(&self) -> usize;
}

mod cpal_source;
pub mod scripted;

pub use cpal_source::CpalSource;
pub use scripted::ScriptedSource;
