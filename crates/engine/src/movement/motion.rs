use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::world::Vec2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Left,
    #[default]
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoveDirection {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl MoveDirection {
    /// `horizontal` and `vertical` are -1, 0 or 1 in screen space (y grows
    /// downward).
    pub fn from_axes(horizontal: i8, vertical: i8) -> Option<Self> {
        match (horizontal.signum(), vertical.signum()) {
            (0, -1) => Some(Self::Up),
            (0, 1) => Some(Self::Down),
            (-1, 0) => Some(Self::Left),
            (1, 0) => Some(Self::Right),
            (-1, -1) => Some(Self::UpLeft),
            (1, -1) => Some(Self::UpRight),
            (-1, 1) => Some(Self::DownLeft),
            (1, 1) => Some(Self::DownRight),
            _ => None,
        }
    }
}

impl fmt::Display for MoveDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::UpLeft => "up-left",
            Self::UpRight => "up-right",
            Self::DownLeft => "down-left",
            Self::DownRight => "down-right",
        };
        f.write_str(label)
    }
}

/// One of the two discrete walk-cycle frames; travels as `1` or `2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum WalkFrame {
    #[default]
    One,
    Two,
}

impl WalkFrame {
    pub fn toggled(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

impl From<WalkFrame> for u8 {
    fn from(frame: WalkFrame) -> Self {
        match frame {
            WalkFrame::One => 1,
            WalkFrame::Two => 2,
        }
    }
}

impl TryFrom<u8> for WalkFrame {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(format!("walk frame must be 1 or 2, got {other}")),
        }
    }
}

/// Motion state of the locally controlled avatar.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarMotion {
    pub position: Vec2,
    pub facing: Facing,
    pub direction: Option<MoveDirection>,
    pub is_moving: bool,
    pub walk_frame: WalkFrame,
    pub is_sitting: bool,
    pub speed_multiplier: f32,
    pub vehicle: Option<String>,
    /// Time accumulated toward the next walk-frame toggle.
    pub(crate) walk_elapsed: Duration,
}

impl AvatarMotion {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            facing: Facing::default(),
            direction: None,
            is_moving: false,
            walk_frame: WalkFrame::One,
            is_sitting: false,
            speed_multiplier: 1.0,
            vehicle: None,
            walk_elapsed: Duration::ZERO,
        }
    }

    pub fn center(&self, offset: Vec2) -> Vec2 {
        self.position.add(offset)
    }

    pub(crate) fn toggle_walk_frame(&mut self) {
        self.walk_frame = self.walk_frame.toggled();
        self.walk_elapsed = Duration::ZERO;
    }

    pub(crate) fn reset_walk_cycle(&mut self) {
        self.walk_frame = WalkFrame::One;
        self.walk_elapsed = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_direction_combines_axes() {
        assert_eq!(MoveDirection::from_axes(-1, -1), Some(MoveDirection::UpLeft));
        assert_eq!(MoveDirection::from_axes(1, 1), Some(MoveDirection::DownRight));
        assert_eq!(MoveDirection::from_axes(0, 0), None);
    }

    #[test]
    fn walk_frame_travels_as_number() {
        assert_eq!(serde_json::to_string(&WalkFrame::Two).expect("json"), "2");
        let frame: WalkFrame = serde_json::from_str("1").expect("frame");
        assert_eq!(frame, WalkFrame::One);
        assert!(serde_json::from_str::<WalkFrame>("3").is_err());
    }

    #[test]
    fn direction_uses_kebab_case_labels() {
        assert_eq!(
            serde_json::to_string(&MoveDirection::DownLeft).expect("json"),
            "\"down-left\""
        );
        assert_eq!(MoveDirection::UpRight.to_string(), "up-right");
    }
}
