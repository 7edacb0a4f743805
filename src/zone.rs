//! Zone classification: a pure function of one level against two thresholds.

use serde::{Deserialize, Serialize};

use crate::config::ThresholdConfig;

/// Classification bucket for one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    Normal,
    Warning,
    Infraction,
}

impl Zone {
    /// Classify a level. Comparison is strictly greater-than: a value
    /// exactly equal to a threshold does not cross it.
    pub fn classify(level_db: f64, thresholds: &ThresholdConfig) -> Zone {
        if level_db > thresholds.infraction_level {
            Zone::Infraction
        } else if level_db > thresholds.warning_level {
            Zone::Warning
        } else {
            Zone::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> ThresholdConfig {
        ThresholdConfig {
            infraction_level: 75.0,
            warning_level: 65.0,
            ..ThresholdConfig::default()
        }
    }

    #[test]
    fn below_warning_is_normal() {
        assert_eq!(Zone::classify(40.0, &thresholds()), Zone::Normal);
        assert_eq!(Zone::classify(64.99, &thresholds()), Zone::Normal);
    }

    #[test]
    fn thresholds_themselves_do_not_cross() {
        assert_eq!(Zone::classify(65.0, &thresholds()), Zone::Normal);
        assert_eq!(Zone::classify(75.0, &thresholds()), Zone::Warning);
    }

    #[test]
    fn between_thresholds_is_warning() {
        assert_eq!(Zone::classify(65.01, &thresholds()), Zone::Warning);
        assert_eq!(Zone::classify(74.99, &thresholds()), Zone::Warning);
    }

    #[test]
    fn above_infraction_level_is_infraction() {
        assert_eq!(Zone::classify(75.01, &thresholds()), Zone::Infraction);
        assert_eq!(Zone::classify(120.0, &thresholds()), Zone::Infraction);
    }

    #[test]
    fn silence_is_normal() {
        assert_eq!(
            Zone::classify(f64::NEG_INFINITY, &thresholds()),
            Zone::Normal
        );
    }
}
