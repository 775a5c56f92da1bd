use plaza_engine::{
    AvatarId, Icon, InputAction, KeyCode, MotionUpdate, Vec2, WindowId, WindowObject, WorldBounds,
};
use serde::Deserialize;

const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;
const DEFAULT_SETTLE_MS: u64 = 1_000;

/// Scripted session replayed by the headless loop.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Scenario {
    #[serde(default = "default_avatar")]
    pub(crate) avatar: AvatarId,
    #[serde(default)]
    pub(crate) spawn: Vec2,
    #[serde(default)]
    pub(crate) bounds: WorldBounds,
    #[serde(default)]
    pub(crate) icons: Vec<Icon>,
    #[serde(default)]
    pub(crate) windows: Vec<WindowObject>,
    #[serde(default = "default_frame_interval_ms")]
    pub(crate) frame_interval_ms: u64,
    /// Total virtual run time. Defaults to the last event plus a settle
    /// period.
    #[serde(default)]
    pub(crate) duration_ms: Option<u64>,
    #[serde(default)]
    pub(crate) timeline: Vec<TimedEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TimedEvent {
    pub(crate) at_ms: u64,
    pub(crate) event: ScenarioEvent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ScenarioEvent {
    Key {
        key: KeyCode,
        pressed: bool,
    },
    Action {
        action: InputAction,
        pressed: bool,
    },
    TextFocus {
        focused: bool,
    },
    Vehicle {
        #[serde(default)]
        vehicle: Option<String>,
        speed_multiplier: f32,
    },
    Teleport {
        position: Vec2,
    },
    Remote {
        peer: AvatarId,
        update: MotionUpdate,
    },
    RemoteLeft {
        peer: AvatarId,
    },
    WindowOpened {
        window: WindowObject,
    },
    WindowClosed {
        window: WindowId,
    },
    WindowMinimized {
        window: WindowId,
        minimized: bool,
    },
}

fn default_avatar() -> AvatarId {
    AvatarId(1)
}

fn default_frame_interval_ms() -> u64 {
    DEFAULT_FRAME_INTERVAL_MS
}

impl Scenario {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.frame_interval_ms == 0 {
            return Err("frame_interval_ms must be greater than zero".to_string());
        }
        if self.bounds.width <= 0.0 || self.bounds.height <= 0.0 {
            return Err(format!(
                "bounds must be positive, got {}x{}",
                self.bounds.width, self.bounds.height
            ));
        }
        if let Some(index) = self
            .timeline
            .windows(2)
            .position(|pair| pair[1].at_ms < pair[0].at_ms)
        {
            return Err(format!(
                "timeline[{}].at_ms goes backwards ({} after {})",
                index + 1,
                self.timeline[index + 1].at_ms,
                self.timeline[index].at_ms
            ));
        }
        Ok(())
    }

    pub(crate) fn end_ms(&self) -> u64 {
        self.duration_ms.unwrap_or_else(|| {
            self.timeline
                .last()
                .map_or(0, |event| event.at_ms)
                .saturating_add(DEFAULT_SETTLE_MS)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Scenario {
        serde_json::from_str(raw).expect("scenario json")
    }

    #[test]
    fn empty_scenario_uses_defaults() {
        let scenario = parse("{}");
        assert_eq!(scenario.avatar, AvatarId(1));
        assert_eq!(scenario.frame_interval_ms, 16);
        assert_eq!(scenario.bounds, WorldBounds::default());
        assert_eq!(scenario.end_ms(), 1_000);
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn timeline_events_parse_by_type_tag() {
        let scenario = parse(
            r#"{
                "timeline": [
                    {"at_ms": 0, "event": {"type": "key", "key": "KeyD", "pressed": true}},
                    {"at_ms": 5, "event": {"type": "action", "action": "grab", "pressed": true}},
                    {"at_ms": 9, "event": {"type": "window_closed", "window": 3}}
                ]
            }"#,
        );
        assert!(matches!(
            scenario.timeline[0].event,
            ScenarioEvent::Key {
                key: KeyCode::KeyD,
                pressed: true
            }
        ));
        assert!(matches!(
            scenario.timeline[1].event,
            ScenarioEvent::Action {
                action: InputAction::Grab,
                pressed: true
            }
        ));
        assert!(matches!(
            scenario.timeline[2].event,
            ScenarioEvent::WindowClosed {
                window: WindowId(3)
            }
        ));
        assert_eq!(scenario.end_ms(), 1_009);
    }

    #[test]
    fn out_of_order_timeline_is_rejected() {
        let scenario = parse(
            r#"{
                "timeline": [
                    {"at_ms": 50, "event": {"type": "text_focus", "focused": true}},
                    {"at_ms": 20, "event": {"type": "text_focus", "focused": false}}
                ]
            }"#,
        );
        let err = scenario.validate().expect_err("backwards timeline");
        assert!(err.contains("timeline[1]"), "{err}");
    }
}
