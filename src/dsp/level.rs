//! Signal level math: RMS and decibel conversion.
//!
//! Levels are relative to raw 16-bit sample amplitude, not normalized
//! full scale, so the configured thresholds compare directly against the
//! values the capture pipeline produces.

/// Root-mean-square amplitude of a signal window.
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&x| x * x).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Convert an RMS amplitude to decibels.
///
/// Silence yields `-inf`, which downstream classification places in the
/// Normal zone; it is a value, not an error.
pub fn db_from_rms(rms: f64) -> f64 {
    20.0 * rms.log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_empty_is_zero() {
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn rms_of_constant_signal() {
        let samples = vec![100.0; 512];
        assert!((rms(&samples) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn rms_of_sine_is_amplitude_over_sqrt2() {
        let amplitude = 1000.0;
        let samples: Vec<f64> = (0..16_000)
            .map(|i| amplitude * (2.0 * std::f64::consts::PI * 440.0 * i as f64 / 16_000.0).sin())
            .collect();
        let expected = amplitude / 2.0_f64.sqrt();
        assert!((rms(&samples) - expected).abs() < 1.0);
    }

    #[test]
    fn silence_is_negative_infinity() {
        let level = db_from_rms(rms(&[0.0; 1024]));
        assert!(level.is_infinite() && level < 0.0);
    }

    #[test]
    fn db_of_full_scale_i16() {
        // 20 * log10(32767) ~ 90.3 dB
        let level = db_from_rms(32767.0);
        assert!((level - 90.3).abs() < 0.1);
    }

    #[test]
    fn halving_amplitude_drops_six_db() {
        let full = db_from_rms(20_000.0);
        let half = db_from_rms(10_000.0);
        assert!((full - half - 6.02).abs() < 0.01);
    }
}
