use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::movement::KeyBindings;
use crate::world::{Vec2, WindowLimits};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// World units per second at a speed multiplier of 1.
    pub base_speed: f32,
    pub max_frame_delta_ms: u64,
    /// Offset from the avatar position to its visual center.
    pub avatar_center_offset: Vec2,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            base_speed: 300.0,
            max_frame_delta_ms: 50,
            avatar_center_offset: Vec2::new(32.0, 32.0),
        }
    }
}

impl MovementConfig {
    pub fn max_frame_delta(&self) -> Duration {
        Duration::from_millis(self.max_frame_delta_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    pub title_bar_height: f32,
    pub border_inset: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            title_bar_height: 30.0,
            border_inset: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    pub icon_radius: f32,
    pub grab_radius: f32,
    /// Where an opened program appears relative to the avatar position.
    pub spawn_offset: Vec2,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            icon_radius: 80.0,
            grab_radius: 60.0,
            spawn_offset: Vec2::new(80.0, -40.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub min_send_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            min_send_interval_ms: 50,
        }
    }
}

impl NetworkConfig {
    pub fn min_send_interval(&self) -> Duration {
        Duration::from_millis(self.min_send_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub walk_frame_interval_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            walk_frame_interval_ms: 60,
        }
    }
}

impl AnimationConfig {
    pub fn walk_frame_interval(&self) -> Duration {
        Duration::from_millis(self.walk_frame_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    pub local_stall_ms: u64,
    pub local_check_interval_ms: u64,
    pub remote_stale_ms: u64,
    pub remote_sweep_interval_ms: u64,
    pub fallback_after_ms: u64,
    pub fallback_max_ms: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            local_stall_ms: 200,
            local_check_interval_ms: 100,
            remote_stale_ms: 5_000,
            remote_sweep_interval_ms: 1_000,
            fallback_after_ms: 200,
            fallback_max_ms: 2_000,
        }
    }
}

impl WatchdogConfig {
    pub fn local_stall(&self) -> Duration {
        Duration::from_millis(self.local_stall_ms)
    }

    pub fn local_check_interval(&self) -> Duration {
        Duration::from_millis(self.local_check_interval_ms)
    }

    pub fn remote_stale(&self) -> Duration {
        Duration::from_millis(self.remote_stale_ms)
    }

    pub fn remote_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.remote_sweep_interval_ms)
    }

    pub fn fallback_after(&self) -> Duration {
        Duration::from_millis(self.fallback_after_ms)
    }

    pub fn fallback_max(&self) -> Duration {
        Duration::from_millis(self.fallback_max_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub movement: MovementConfig,
    pub collision: CollisionConfig,
    pub proximity: ProximityConfig,
    pub windows: WindowLimits,
    pub network: NetworkConfig,
    pub animation: AnimationConfig,
    pub watchdog: WatchdogConfig,
    pub keys: KeyBindings,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} must be greater than zero milliseconds")]
    ZeroInterval { field: &'static str },
    #[error("windows.min_size {min_width}x{min_height} exceeds windows.max_size {max_width}x{max_height}")]
    InvertedWindowLimits {
        min_width: f32,
        min_height: f32,
        max_width: f32,
        max_height: f32,
    },
    #[error("keys must bind at least one key")]
    NoKeyBindings,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("movement.base_speed", self.movement.base_speed)?;
        require_interval("movement.max_frame_delta_ms", self.movement.max_frame_delta_ms)?;
        require_non_negative("collision.title_bar_height", self.collision.title_bar_height)?;
        require_non_negative("collision.border_inset", self.collision.border_inset)?;
        require_non_negative("proximity.icon_radius", self.proximity.icon_radius)?;
        require_non_negative("proximity.grab_radius", self.proximity.grab_radius)?;
        require_positive("windows.min_size.width", self.windows.min_size.width)?;
        require_positive("windows.min_size.height", self.windows.min_size.height)?;
        let limits = &self.windows;
        if limits.min_size.width > limits.max_size.width
            || limits.min_size.height > limits.max_size.height
        {
            return Err(ConfigError::InvertedWindowLimits {
                min_width: limits.min_size.width,
                min_height: limits.min_size.height,
                max_width: limits.max_size.width,
                max_height: limits.max_size.height,
            });
        }
        require_interval(
            "animation.walk_frame_interval_ms",
            self.animation.walk_frame_interval_ms,
        )?;
        require_interval("watchdog.local_stall_ms", self.watchdog.local_stall_ms)?;
        require_interval(
            "watchdog.local_check_interval_ms",
            self.watchdog.local_check_interval_ms,
        )?;
        require_interval("watchdog.remote_stale_ms", self.watchdog.remote_stale_ms)?;
        require_interval(
            "watchdog.remote_sweep_interval_ms",
            self.watchdog.remote_sweep_interval_ms,
        )?;
        if self.keys.is_empty() {
            return Err(ConfigError::NoKeyBindings);
        }
        Ok(())
    }
}

fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn require_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn require_interval(field: &'static str, value_ms: u64) -> Result<(), ConfigError> {
    if value_ms == 0 {
        Err(ConfigError::ZeroInterval { field })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Size;

    #[test]
    fn defaults_are_valid() {
        EngineConfig::default().validate().expect("default config");
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"movement":{"base_speed":120.0}}"#).expect("config");
        assert_eq!(config.movement.base_speed, 120.0);
        assert_eq!(config.movement.max_frame_delta_ms, 50);
        assert_eq!(config.collision, CollisionConfig::default());
        assert!(!config.keys.is_empty());
    }

    #[test]
    fn inverted_window_limits_are_rejected() {
        let mut config = EngineConfig::default();
        config.windows.min_size = Size::new(500.0, 100.0);
        config.windows.max_size = Size::new(400.0, 800.0);
        let error = config.validate().expect_err("inverted limits");
        assert!(matches!(error, ConfigError::InvertedWindowLimits { .. }));
    }

    #[test]
    fn zero_send_interval_is_allowed_but_zero_walk_interval_is_not() {
        let mut config = EngineConfig::default();
        config.network.min_send_interval_ms = 0;
        config.validate().expect("unthrottled network is valid");
        config.animation.walk_frame_interval_ms = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroInterval {
                field: "animation.walk_frame_interval_ms"
            })
        );
    }

    #[test]
    fn nan_speed_is_rejected() {
        let mut config = EngineConfig::default();
        config.movement.base_speed = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "movement.base_speed",
                ..
            })
        ));
    }
}
