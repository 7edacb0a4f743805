// Error types for the noise monitor.
//
// Two families, matching how failures are actually recovered: capture errors
// are transient per-frame conditions the monitor loop counts and rides out,
// log errors cover both append failures (reported loudly, loop continues)
// and unparseable replay records (skipped, surfaced only as a count).

use std::fmt;
use std::path::PathBuf;

/// Audio acquisition errors.
///
/// A single occurrence is never fatal: the monitor loop increments its
/// error counter and requests the next frame. Only a sustained run of
/// failures escalates to ending the session.
#[derive(Debug)]
pub enum CaptureError {
    /// No input device available on the host
    NoDevice,

    /// Failed to open or start the input stream
    StreamOpenFailed { reason: String },

    /// Device delivers a sample format we cannot consume
    FormatUnsupported { format: String },

    /// No samples arrived within the read deadline
    Timeout { waited_ms: u64 },

    /// The capture side hung up (stream dropped or callback dead)
    Disconnected,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NoDevice => write!(f, "no default input device found"),
            CaptureError::StreamOpenFailed { reason } => {
                write!(f, "failed to open audio stream: {}", reason)
            }
            CaptureError::FormatUnsupported { format } => {
                write!(f, "unsupported input sample format: {}", format)
            }
            CaptureError::Timeout { waited_ms } => {
                write!(f, "no audio frame within {} ms", waited_ms)
            }
            CaptureError::Disconnected => write!(f, "audio source disconnected"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Daily-log errors.
#[derive(Debug)]
pub enum LogError {
    /// Filesystem failure while creating, opening, or appending to a log
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A replay record that could not be interpreted.
    ///
    /// Replay never returns this directly (malformed records are skipped
    /// and tallied), but parse helpers use it internally.
    Parse { line: String },
}

impl LogError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LogError::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::Io { path, source } => {
                write!(f, "log I/O failure on {}: {}", path.display(), source)
            }
            LogError::Parse { line } => write!(f, "unparseable log record: {:?}", line),
        }
    }
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LogError::Io { source, .. } => Some(source),
            LogError::Parse { .. } => None,
        }
    }
}
