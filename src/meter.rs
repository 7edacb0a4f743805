//! Decibel computer: one raw audio frame in, one A-weighted level out.

use crate::dsp::{db_from_rms, rms, AWeighting};

/// Turns fixed-size PCM frames into A-weighted decibel measurements.
///
/// Owns the weighting filter (and its history between frames). Levels are
/// relative to raw i16 amplitude, the same scale the default thresholds
/// were chosen against. An all-zero frame yields `-inf`, never an error.
pub struct DecibelMeter {
    weighting: AWeighting,
}

impl DecibelMeter {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            weighting: AWeighting::new(sample_rate),
        }
    }

    /// Compute the weighted level of one frame:
    /// filter, RMS, then 20 * log10(rms).
    pub fn level_db(&mut self, frame: &[i16]) -> f64 {
        let samples: Vec<f64> = frame.iter().map(|&s| s as f64).collect();
        let weighted = self.weighting.process(&samples);
        db_from_rms(rms(&weighted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine_frame(freq: f64, amplitude: f64, sample_rate: u32, len: usize) -> Vec<i16> {
        (0..len)
            .map(|i| {
                (amplitude * (2.0 * PI * freq * i as f64 / sample_rate as f64).sin()) as i16
            })
            .collect()
    }

    #[test]
    fn silent_frame_reads_negative_infinity() {
        let mut meter = DecibelMeter::new(16_000);
        let level = meter.level_db(&[0; 1024]);
        assert!(level.is_infinite() && level < 0.0);
    }

    #[test]
    fn one_khz_tone_reads_near_unweighted_level() {
        let mut meter = DecibelMeter::new(16_000);
        // rms of a 10000-amplitude sine is ~7071 -> ~77 dB
        let frame = sine_frame(1000.0, 10_000.0, 16_000, 16_000);
        let level = meter.level_db(&frame);
        assert!((level - 77.0).abs() < 1.0, "level was {}", level);
    }

    #[test]
    fn louder_tone_reads_higher() {
        let mut quiet_meter = DecibelMeter::new(16_000);
        let mut loud_meter = DecibelMeter::new(16_000);

        let quiet = quiet_meter.level_db(&sine_frame(1000.0, 1_000.0, 16_000, 16_000));
        let loud = loud_meter.level_db(&sine_frame(1000.0, 10_000.0, 16_000, 16_000));

        assert!((loud - quiet - 20.0).abs() < 0.5);
    }
}
