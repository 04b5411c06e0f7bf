//! Phase-timing configuration for generated timelines.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default duration of the trailing stance phase in seconds.
pub const DEFAULT_FINAL_STANCE: f64 = 0.55;

/// Durations and discretization step used when generating a phase sequence
/// from a starting stance and a stepping order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Duration of the optional leading stance phase (seconds).
    pub stance_initial: f64,
    /// Swing duration of each step phase (seconds).
    pub swing: f64,
    /// Duration of the optional trailing stance phase (seconds).
    /// Defaults to [`DEFAULT_FINAL_STANCE`].
    pub stance_final: f64,
    /// Fixed discretization step Δt (seconds, > 0).
    pub sample_step: f64,
    /// Whether to emit a leading stance phase.
    pub insert_initial_stance: bool,
    /// Whether to emit a trailing stance phase.
    pub insert_final_stance: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            stance_initial: 1.0,
            swing: 0.7,
            stance_final: DEFAULT_FINAL_STANCE,
            sample_step: 0.1,
            insert_initial_stance: true,
            insert_final_stance: true,
        }
    }
}

impl TimingConfig {
    /// Check that all durations are usable.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a non-positive sample step or a
    /// negative/non-finite phase duration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sample_step.is_finite() || self.sample_step <= 0.0 {
            return Err(ConfigError::InvalidSampleStep(self.sample_step));
        }
        for (id, duration) in [
            (0, self.stance_initial),
            (1, self.swing),
            (2, self.stance_final),
        ] {
            if !duration.is_finite() || duration < 0.0 {
                return Err(ConfigError::NegativePhaseDuration { id, duration });
            }
        }
        Ok(())
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the file cannot be read, parsed, or
    /// fails validation.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(TimingConfig::default().validate().is_ok());
    }

    #[test]
    fn default_trailing_stance() {
        let config = TimingConfig::default();
        assert!((config.stance_final - 0.55).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_zero_sample_step() {
        let config = TimingConfig {
            sample_step: 0.0,
            ..TimingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSampleStep(_))
        ));
    }

    #[test]
    fn rejects_negative_swing() {
        let config = TimingConfig {
            swing: -0.2,
            ..TimingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativePhaseDuration { .. })
        ));
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config: TimingConfig =
            toml::from_str("swing = 0.4\nsample_step = 0.05\n").expect("valid toml");
        assert!((config.swing - 0.4).abs() < f64::EPSILON);
        assert!((config.sample_step - 0.05).abs() < f64::EPSILON);
        assert!((config.stance_final - DEFAULT_FINAL_STANCE).abs() < f64::EPSILON);
        assert!(config.insert_initial_stance);
    }

    #[test]
    fn from_file_missing_path_is_io_error() {
        let err = TimingConfig::from_file("/nonexistent/timing.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
