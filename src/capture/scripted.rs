//! Deterministic audio source for tests and offline runs.

use std::collections::VecDeque;

use crate::error::CaptureError;

use super::{AudioSource, Frame};

/// Replays a fixed script of frames (or injected errors), then reports
/// itself disconnected.
pub struct ScriptedSource {
    script: VecDeque<Result<Frame, CaptureError>>,
    frame_size: usize,
}

impl ScriptedSource {
    pub fn new(frame_size: usize) -> Self {
        Self {
            script: VecDeque::new(),
            frame_size,
        }
    }

    /// Queue a frame of constant amplitude; the resulting level is
    /// predictable (20·log10(|amplitude|) after weighting settles).
    pub fn push_constant_frame(&mut self, amplitude: i16) -> &mut Self {
        self.script
            .push_back(Ok(vec![amplitude; self.frame_size]));
        self
    }

    pub fn push_frame(&mut self, frame: Frame) -> &mut Self {
        self.script.push_back(Ok(frame));
        self
    }

    pub fn push_error(&mut self, err: CaptureError) -> &mut Self {
        self.script.push_back(Err(err));
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl AudioSource for ScriptedSource {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        self.script
            .pop_front()
            .unwrap_or(Err(CaptureError::Disconnected))
    }

    fn frame_size(&self) -> usize {
        self.frame_size
    }
}
