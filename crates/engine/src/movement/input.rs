use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Grab,
    ResizeModifier,
    Interact,
    SitToggle,
}

const ACTION_COUNT: usize = 8;

const MOVEMENT_ACTIONS: [InputAction; 4] = [
    InputAction::MoveUp,
    InputAction::MoveDown,
    InputAction::MoveLeft,
    InputAction::MoveRight,
];

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Grab => 4,
            InputAction::ResizeModifier => 5,
            InputAction::Interact => 6,
            InputAction::SitToggle => 7,
        }
    }

    pub const fn is_movement(self) -> bool {
        matches!(
            self,
            InputAction::MoveUp
                | InputAction::MoveDown
                | InputAction::MoveLeft
                | InputAction::MoveRight
        )
    }
}

/// The pressed-key set of one engine instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    /// Returns `true` when the state actually changed, so key repeat is not
    /// mistaken for a fresh press.
    pub fn set(&mut self, action: InputAction, is_down: bool) -> bool {
        let slot = &mut self.down[action.index()];
        let changed = *slot != is_down;
        *slot = is_down;
        changed
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub fn any_movement(&self) -> bool {
        MOVEMENT_ACTIONS.iter().any(|action| self.is_down(*action))
    }

    pub fn clear(&mut self) {
        self.down = [false; ACTION_COUNT];
    }

    pub fn with(mut self, action: InputAction) -> Self {
        self.set(action, true);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub action: InputAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings {
    bindings: Vec<KeyBinding>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let pairs = [
            (KeyCode::KeyW, InputAction::MoveUp),
            (KeyCode::ArrowUp, InputAction::MoveUp),
            (KeyCode::KeyS, InputAction::MoveDown),
            (KeyCode::ArrowDown, InputAction::MoveDown),
            (KeyCode::KeyA, InputAction::MoveLeft),
            (KeyCode::ArrowLeft, InputAction::MoveLeft),
            (KeyCode::KeyD, InputAction::MoveRight),
            (KeyCode::ArrowRight, InputAction::MoveRight),
            (KeyCode::KeyG, InputAction::Grab),
            (KeyCode::ShiftLeft, InputAction::ResizeModifier),
            (KeyCode::ShiftRight, InputAction::ResizeModifier),
            (KeyCode::KeyE, InputAction::Interact),
            (KeyCode::KeyX, InputAction::SitToggle),
        ];
        Self {
            bindings: pairs
                .into_iter()
                .map(|(key, action)| KeyBinding { key, action })
                .collect(),
        }
    }
}

impl KeyBindings {
    pub fn action_for(&self, key: KeyCode) -> Option<InputAction> {
        self.bindings
            .iter()
            .find(|binding| binding.key == key)
            .map(|binding| binding.action)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
