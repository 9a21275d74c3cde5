use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{DopplerError, Result, Vector2};

pub const DEFAULT_SOUND_SPEED: f64 = 343.0;
pub const DEFAULT_EMITTED_FREQUENCY: f64 = 4.0;

/// Top-level configuration structure for the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Propagation speed of wavefronts in m/s.
    pub sound_speed: f64,
    /// Emission rate of the source in Hz; also the emitted tone.
    pub emitted_frequency: f64,
    /// Model seconds per real second.
    pub time_scale: f64,
    /// Speed multiplier on top of `time_scale`. Negative values rewind.
    pub time_speed: f64,
    /// Wavefronts older than this (model seconds) are pruned.
    pub max_wave_age: f64,
    pub snapshot_capacity: usize,
    pub waveform_len: usize,
    /// Upper bound on observed/emitted frequency near the sound barrier.
    pub max_frequency_ratio: f64,
    pub body: BodyConfig,
    pub microphone: MicrophoneConfig,
    pub trail: TrailConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sound_speed: DEFAULT_SOUND_SPEED,
            emitted_frequency: DEFAULT_EMITTED_FREQUENCY,
            time_scale: 1.0,
            time_speed: TimeSpeed::Normal.factor(),
            max_wave_age: 1.5,
            snapshot_capacity: 600,
            waveform_len: 256,
            max_frequency_ratio: 10.0,
            body: BodyConfig::default(),
            microphone: MicrophoneConfig::default(),
            trail: TrailConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Parses a JSON document and validates the result.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    /// Loads a JSON config file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Checks every field that would otherwise cause divisions by zero,
    /// runaway emission loops or unbounded buffers further down.
    pub fn validate(self) -> Result<Self> {
        check_positive("sound_speed", self.sound_speed)?;
        check_positive("emitted_frequency", self.emitted_frequency)?;
        check_positive("time_scale", self.time_scale)?;
        check_time_speed(self.time_speed)?;
        check_positive("max_wave_age", self.max_wave_age)?;
        check_positive("max_frequency_ratio", self.max_frequency_ratio)?;
        check_count("snapshot_capacity", self.snapshot_capacity)?;
        check_count("waveform_len", self.waveform_len)?;

        if !(self.body.decay_factor > 0.0 && self.body.decay_factor < 1.0) {
            return Err(DopplerError::invalid(
                "body.decay_factor",
                self.body.decay_factor,
            ));
        }
        check_non_negative("body.min_speed", self.body.min_speed)?;

        check_positive("microphone.tolerance", self.microphone.tolerance)?;
        check_non_negative("microphone.cooldown", self.microphone.cooldown)?;
        if !(self.microphone.position.x.is_finite() && self.microphone.position.y.is_finite()) {
            return Err(DopplerError::msg("microphone.position must be finite"));
        }

        check_positive("trail.sample_interval", self.trail.sample_interval)?;
        check_positive("trail.max_age", self.trail.max_age)?;
        check_count("trail.max_points", self.trail.max_points)?;

        Ok(self)
    }
}

pub(crate) fn check_positive(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(DopplerError::invalid(field, value))
    }
}

pub(crate) fn check_time_speed(value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DopplerError::invalid("time_speed", value))
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(DopplerError::invalid(field, value))
    }
}

fn check_count(field: &'static str, value: usize) -> Result<usize> {
    if value == 0 {
        Err(DopplerError::invalid(field, 0.0))
    } else {
        Ok(value)
    }
}

/// Velocity decay settings shared by source and observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Per-step multiplier applied to an uncontrolled body's velocity.
    pub decay_factor: f64,
    /// Speeds below this snap to zero.
    pub min_speed: f64,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            decay_factor: 0.95,
            min_speed: 0.5,
        }
    }
}

/// Microphone probe placement and detection tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicrophoneConfig {
    pub position: Vector2,
    pub enabled: bool,
    /// Max `|radius - distance|` in meters that counts as a crossing.
    pub tolerance: f64,
    /// Model seconds during which further crossings are ignored.
    pub cooldown: f64,
}

impl Default for MicrophoneConfig {
    fn default() -> Self {
        Self {
            position: Vector2::new(0.0, 40.0),
            enabled: false,
            tolerance: 5.0,
            cooldown: 0.1,
        }
    }
}

/// Bounds for the position history drawn behind each body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    pub sample_interval: f64,
    pub max_points: usize,
    pub max_age: f64,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            sample_interval: 0.05,
            max_points: 100,
            max_age: 2.0,
        }
    }
}

/// Named time-speed presets offered to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSpeed {
    Normal,
    Slow,
    Fast,
    Reverse,
}

impl TimeSpeed {
    pub fn factor(self) -> f64 {
        match self {
            TimeSpeed::Normal => 1.0,
            TimeSpeed::Slow => 0.25,
            TimeSpeed::Fast => 2.0,
            TimeSpeed::Reverse => -1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_sound_speed() {
        let config = SimulationConfig {
            sound_speed: 0.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("sound_speed"));
    }

    #[test]
    fn rejects_nan_frequency_and_bad_decay() {
        let config = SimulationConfig {
            emitted_frequency: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.body.decay_factor = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_time_speed_is_allowed() {
        let config = SimulationConfig {
            time_speed: TimeSpeed::Reverse.factor(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_partial_json_with_defaults() {
        let config = SimulationConfig::from_json_str(
            r#"{ "sound_speed": 300.0, "microphone": { "enabled": true } }"#,
        )
        .unwrap();

        assert_eq!(config.sound_speed, 300.0);
        assert!(config.microphone.enabled);
        assert_eq!(config.microphone.tolerance, 5.0);
        assert_eq!(config.emitted_frequency, DEFAULT_EMITTED_FREQUENCY);
    }

    #[test]
    fn json_with_invalid_values_is_rejected() {
        let err = SimulationConfig::from_json_str(r#"{ "emitted_frequency": -2.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            DopplerError::InvalidConfig {
                field: "emitted_frequency",
                ..
            }
        ));
    }
}
