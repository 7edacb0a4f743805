//! Microphone capture via cpal.
//!
//! The input callback runs on the audio thread and must stay allocation-
//! and lock-free: it de-interleaves the first channel and pushes raw
//! samples into a lock-free SPSC ring. The monitor loop side pops exactly
//! one frame's worth per `read_frame`, sleeping briefly while the ring is
//! empty.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, RingBuffer};

use crate::config::AudioConfig;
use crate::error::CaptureError;

use super::{AudioSource, Frame};

/// How long `read_frame` waits for samples before reporting a transient
/// acquisition failure. Generous next to a ~64 ms frame.
const READ_DEADLINE: Duration = Duration::from_secs(2);

/// Poll interval while the ring is empty.
const EMPTY_RING_SLEEP: Duration = Duration::from_millis(2);

pub struct CpalSource {
    // Held for its Drop: the stream stops when the source is released.
    _stream: cpal::Stream,
    consumer: Consumer<i16>,
    frame_size: usize,
    stream_alive: Arc<AtomicBool>,
}

impl CpalSource {
    /// Open the default input device and start capturing.
    pub fn open(audio: &AudioConfig) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;

        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::StreamOpenFailed {
                reason: format!("failed to get default input config: {:?}", e),
            })?;
        let stream_config: cpal::StreamConfig = supported.clone().into();
        let channels = stream_config.channels as usize;

        // Ring holds one second of audio: deep enough to ride out scheduler
        // hiccups on the consumer side without dropping samples.
        let (producer, consumer) = RingBuffer::<i16>::new(audio.sample_rate as usize);

        let stream_alive = Arc::new(AtomicBool::new(true));
        let err_alive = Arc::clone(&stream_alive);
        let err_fn = move |err: cpal::StreamError| {
            log::error!("[Capture] Input stream error: {}", err);
            err_alive.store(false, Ordering::Relaxed);
        };

        let stream = match supported.sample_format() {
            cpal::SampleFormat::I16 => {
                let mut producer = producer;
                device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[i16], _: &cpal::InputCallbackInfo| {
                            for frame in data.chunks(channels) {
                                if let Some(&sample) = frame.first() {
                                    // Ring full: drop the sample. Blocking here
                                    // would glitch the audio thread.
                                    let _ = producer.push(sample);
                                }
                            }
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|e| CaptureError::StreamOpenFailed {
                        reason: format!("{:?}", e),
                    })?
            }
            cpal::SampleFormat::F32 => {
                let mut producer = producer;
                device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            for frame in data.chunks(channels) {
                                if let Some(&sample) = frame.first() {
                                    let widened = (sample * i16::MAX as f32)
                                        .clamp(i16::MIN as f32, i16::MAX as f32)
                                        as i16;
                                    let _ = producer.push(widened);
                                }
                            }
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|e| CaptureError::StreamOpenFailed {
                        reason: format!("{:?}", e),
                    })?
            }
            other => {
                return Err(CaptureError::FormatUnsupported {
                    format: format!("{:?}", other),
                })
            }
        };

        stream.play().map_err(|e| CaptureError::StreamOpenFailed {
            reason: format!("input start failed: {}", e),
        })?;

        log::info!(
            "[Capture] Input stream open: {} Hz, {} channel(s), frame size {}",
            stream_config.sample_rate.0,
            channels,
            audio.frame_size
        );

        Ok(Self {
            _stream: stream,
            consumer,
            frame_size: audio.frame_size,
            stream_alive,
        })
    }
}

impl AudioSource for CpalSource {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let mut frame = Vec::with_capacity(self.frame_size);
        let deadline = Instant::now() + READ_DEADLINE;

        while frame.len() < self.frame_size {
            match self.consumer.pop() {
                Ok(sample) => frame.push(sample),
                Err(_) => {
                    if !self.stream_alive.load(Ordering::Relaxed) {
                        return Err(CaptureError::Disconnected);
                    }
                    if Instant::now() >= deadline {
                        return Err(CaptureError::Timeout {
                            waited_ms: READ_DEADLINE.as_millis() as u64,
                        });
                    }
                    std::thread::sleep(EMPTY_RING_SLEEP);
                }
            }
        }
        Ok(frame)
    }

    fn frame_size(&self) -> usize {
        self.frame_size
    }
}
