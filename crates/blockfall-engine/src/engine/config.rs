use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Tunable constants of a game session.
///
/// The defaults reproduce the classic pacing: one cycle per second at the start,
/// slightly faster after every locked piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Gravity rate at the start of a game, in cycles per second.
    pub base_speed: f32,
    /// Added to the gravity rate after every locked piece.
    pub speed_increment: f32,
    /// Clock rate while soft drop is held, in cycles per second.
    pub soft_drop_speed: f32,
    /// Frames after a lock during which soft drop requests are ignored.
    pub drop_cooldown_frames: u32,
    /// Level is `floor(speed * level_factor)`.
    pub level_factor: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_speed: 1.0,
            speed_increment: 0.035,
            soft_drop_speed: 25.0,
            drop_cooldown_frames: 25,
            level_factor: 1.70,
        }
    }
}

impl SessionConfig {
    /// Checks that every rate is usable by the cycle clock.
    ///
    /// `speed_increment` may be zero for a game that never speeds up.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("base_speed", self.base_speed),
            ("soft_drop_speed", self.soft_drop_speed),
            ("level_factor", self.level_factor),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError { name, value });
            }
        }
        if !(self.speed_increment.is_finite() && self.speed_increment >= 0.0) {
            return Err(ConfigError {
                name: "speed_increment",
                value: self.speed_increment,
            });
        }
        Ok(())
    }

    /// Level shown for the given gravity rate.
    ///
    /// Monotonic in `speed`; it has no effect on gameplay.
    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub fn level_for_speed(&self, speed: f32) -> i32 {
        (speed * self.level_factor).floor() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_speed() {
        let config = SessionConfig::default();
        assert_eq!(config.level_for_speed(1.0), 1);
        assert_eq!(config.level_for_speed(1.2), 2);
        assert_eq!(config.level_for_speed(2.0), 3);
    }

    #[test]
    fn test_level_is_monotonic() {
        let config = SessionConfig::default();
        let mut speed = config.base_speed;
        let mut level = config.level_for_speed(speed);
        for _ in 0..500 {
            speed += config.speed_increment;
            let next = config.level_for_speed(speed);
            assert!(next >= level, "level dropped from {level} to {next} at speed {speed}");
            level = next;
        }
    }

    #[test]
    fn test_validate() {
        assert!(SessionConfig::default().validate().is_ok());

        let config = SessionConfig {
            base_speed: 0.0,
            ..SessionConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.name, "base_speed");

        let config = SessionConfig {
            soft_drop_speed: f32::NAN,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SessionConfig {
            speed_increment: 0.0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"base_speed": 2.0}"#).unwrap();
        assert!((config.base_speed - 2.0).abs() < f32::EPSILON);
        assert_eq!(config.drop_cooldown_frames, 25);
    }
}
