//! Keybinding system for remappable controls
//!
//! Maps physical keys to encounter actions. The input system reads
//! `ButtonInput<KeyCode>` through these bindings, so scripted key presses
//! (headless runs, tests) and real keyboards go through the same path.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All possible actions that can be bound to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameAction {
    // Movement
    MoveLeft,
    MoveRight,
    Jump,

    // Combat
    Shoot,

    // Abilities
    AntiGravity,
    TimeStop,
    TimeSlowDown,

    // Debug unlocks
    UnlockAntiGravity,
    UnlockTimeStop,
    UnlockTimeSlowDown,

    // Encounter
    Interact,
    Restart,
}

impl GameAction {
    pub fn description(&self) -> &'static str {
        match self {
            GameAction::MoveLeft => "Move Left",
            GameAction::MoveRight => "Move Right",
            GameAction::Jump => "Jump",
            GameAction::Shoot => "Shoot",
            GameAction::AntiGravity => "Toggle Anti Gravity",
            GameAction::TimeStop => "Time Stop",
            GameAction::TimeSlowDown => "Time Slow Down",
            GameAction::UnlockAntiGravity => "Unlock Anti Gravity",
            GameAction::UnlockTimeStop => "Unlock Time Stop",
            GameAction::UnlockTimeSlowDown => "Unlock Time Slow Down",
            GameAction::Interact => "Interact",
            GameAction::Restart => "Restart Encounter",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            GameAction::MoveLeft | GameAction::MoveRight | GameAction::Jump => "Movement",
            GameAction::Shoot => "Combat",
            GameAction::AntiGravity | GameAction::TimeStop | GameAction::TimeSlowDown => {
                "Abilities"
            }
            GameAction::UnlockAntiGravity
            | GameAction::UnlockTimeStop
            | GameAction::UnlockTimeSlowDown => "Debug",
            GameAction::Interact | GameAction::Restart => "Encounter",
        }
    }

    pub fn all() -> Vec<GameAction> {
        vec![
            GameAction::MoveLeft,
            GameAction::MoveRight,
            GameAction::Jump,
            GameAction::Shoot,
            GameAction::AntiGravity,
            GameAction::TimeStop,
            GameAction::TimeSlowDown,
            GameAction::UnlockAntiGravity,
            GameAction::UnlockTimeStop,
            GameAction::UnlockTimeSlowDown,
            GameAction::Interact,
            GameAction::Restart,
        ]
    }

    /// Look up an action by its variant name ("Jump", "TimeStop", ...).
    pub fn from_name(name: &str) -> Option<GameAction> {
        Self::all()
            .into_iter()
            .find(|action| format!("{:?}", action).eq_ignore_ascii_case(name))
    }
}

/// Parse a key from its `KeyCode` variant name. Only keys the encounter can
/// sensibly bind are recognized.
pub fn parse_key_code(name: &str) -> Option<KeyCode> {
    let key = match name {
        "Escape" => KeyCode::Escape,
        "Enter" => KeyCode::Enter,
        "Space" => KeyCode::Space,
        "Tab" => KeyCode::Tab,
        "ShiftLeft" => KeyCode::ShiftLeft,
        "ShiftRight" => KeyCode::ShiftRight,
        "ControlLeft" => KeyCode::ControlLeft,
        "KeyA" => KeyCode::KeyA,
        "KeyB" => KeyCode::KeyB,
        "KeyC" => KeyCode::KeyC,
        "KeyD" => KeyCode::KeyD,
        "KeyE" => KeyCode::KeyE,
        "KeyF" => KeyCode::KeyF,
        "KeyG" => KeyCode::KeyG,
        "KeyH" => KeyCode::KeyH,
        "KeyI" => KeyCode::KeyI,
        "KeyJ" => KeyCode::KeyJ,
        "KeyK" => KeyCode::KeyK,
        "KeyL" => KeyCode::KeyL,
        "KeyM" => KeyCode::KeyM,
        "KeyN" => KeyCode::KeyN,
        "KeyO" => KeyCode::KeyO,
        "KeyP" => KeyCode::KeyP,
        "KeyQ" => KeyCode::KeyQ,
        "KeyR" => KeyCode::KeyR,
        "KeyS" => KeyCode::KeyS,
        "KeyT" => KeyCode::KeyT,
        "KeyU" => KeyCode::KeyU,
        "KeyV" => KeyCode::KeyV,
        "KeyW" => KeyCode::KeyW,
        "KeyX" => KeyCode::KeyX,
        "KeyY" => KeyCode::KeyY,
        "KeyZ" => KeyCode::KeyZ,
        "Digit0" => KeyCode::Digit0,
        "Digit1" => KeyCode::Digit1,
        "Digit2" => KeyCode::Digit2,
        "Digit3" => KeyCode::Digit3,
        "Digit4" => KeyCode::Digit4,
        "Digit5" => KeyCode::Digit5,
        "ArrowUp" => KeyCode::ArrowUp,
        "ArrowDown" => KeyCode::ArrowDown,
        "ArrowLeft" => KeyCode::ArrowLeft,
        "ArrowRight" => KeyCode::ArrowRight,
        _ => return None,
    };
    Some(key)
}

/// Serializable wrapper for KeyCode (stores the variant name)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SerializableKeyCode(String);

impl From<KeyCode> for SerializableKeyCode {
    fn from(key: KeyCode) -> Self {
        Self(format!("{:?}", key))
    }
}

impl TryFrom<SerializableKeyCode> for KeyCode {
    type Error = String;

    fn try_from(sk: SerializableKeyCode) -> Result<Self, Self::Error> {
        parse_key_code(&sk.0).ok_or_else(|| format!("Unknown key '{}'", sk.0))
    }
}

/// Key binding with primary and optional secondary key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyBinding {
    #[serde(with = "keycode_serde")]
    pub primary: KeyCode,
    #[serde(default, with = "option_keycode_serde")]
    pub secondary: Option<KeyCode>,
}

mod keycode_serde {
    use super::*;
    use serde::{de::Error, Deserializer, Serializer};

    pub fn serialize<S>(key: &KeyCode, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        SerializableKeyCode::from(*key).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<KeyCode, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sk = SerializableKeyCode::deserialize(deserializer)?;
        KeyCode::try_from(sk).map_err(D::Error::custom)
    }
}

mod option_keycode_serde {
    use super::*;
    use serde::{de::Error, Deserializer, Serializer};

    pub fn serialize<S>(key: &Option<KeyCode>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match key {
            Some(k) => serializer.serialize_some(&SerializableKeyCode::from(*k)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<KeyCode>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt_sk: Option<SerializableKeyCode> = Option::deserialize(deserializer)?;
        opt_sk
            .map(|sk| KeyCode::try_from(sk).map_err(D::Error::custom))
            .transpose()
    }
}

impl KeyBinding {
    pub fn new(primary: KeyCode) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    pub fn with_secondary(primary: KeyCode, secondary: KeyCode) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    pub fn matches(&self, key: KeyCode) -> bool {
        self.primary == key || self.secondary == Some(key)
    }
}

/// Complete keybindings configuration
#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
pub struct Keybindings {
    bindings: HashMap<GameAction, KeyBinding>,
}

impl Default for Keybindings {
    fn default() -> Self {
        Self::create_defaults()
    }
}

impl Keybindings {
    /// Create default keybindings
    pub fn create_defaults() -> Self {
        let mut bindings = HashMap::new();

        bindings.insert(
            GameAction::MoveLeft,
            KeyBinding::with_secondary(KeyCode::KeyA, KeyCode::ArrowLeft),
        );
        bindings.insert(
            GameAction::MoveRight,
            KeyBinding::with_secondary(KeyCode::KeyD, KeyCode::ArrowRight),
        );
        bindings.insert(GameAction::Jump, KeyBinding::new(KeyCode::Space));
        bindings.insert(GameAction::Shoot, KeyBinding::new(KeyCode::KeyJ));

        bindings.insert(GameAction::AntiGravity, KeyBinding::new(KeyCode::KeyQ));
        bindings.insert(GameAction::TimeStop, KeyBinding::new(KeyCode::KeyF));
        bindings.insert(GameAction::TimeSlowDown, KeyBinding::new(KeyCode::ShiftLeft));

        bindings.insert(GameAction::UnlockAntiGravity, KeyBinding::new(KeyCode::Digit1));
        bindings.insert(GameAction::UnlockTimeStop, KeyBinding::new(KeyCode::Digit2));
        bindings.insert(GameAction::UnlockTimeSlowDown, KeyBinding::new(KeyCode::Digit3));

        bindings.insert(GameAction::Interact, KeyBinding::new(KeyCode::KeyE));
        bindings.insert(GameAction::Restart, KeyBinding::new(KeyCode::KeyP));

        Self { bindings }
    }

    /// Get the binding for an action
    pub fn get(&self, action: GameAction) -> Option<&KeyBinding> {
        self.bindings.get(&action)
    }

    /// Set a new binding for an action
    pub fn set(&mut self, action: GameAction, binding: KeyBinding) {
        self.bindings.insert(action, binding);
    }

    /// Reset all bindings to defaults
    pub fn reset_to_defaults(&mut self) {
        *self = Self::create_defaults();
    }

    /// Primary key for an action, used when scripts name actions instead of keys
    pub fn primary_key(&self, action: GameAction) -> Option<KeyCode> {
        self.get(action).map(|binding| binding.primary)
    }

    /// Check if an action is currently held
    pub fn action_pressed(&self, action: GameAction, keyboard: &ButtonInput<KeyCode>) -> bool {
        self.get(action).is_some_and(|binding| {
            keyboard.pressed(binding.primary)
                || binding.secondary.is_some_and(|key| keyboard.pressed(key))
        })
    }

    /// Check if an action was just pressed this frame
    pub fn action_just_pressed(&self, action: GameAction, keyboard: &ButtonInput<KeyCode>) -> bool {
        self.get(action).is_some_and(|binding| {
            keyboard.just_pressed(binding.primary)
                || binding.secondary.is_some_and(|key| keyboard.just_pressed(key))
        })
    }

    /// Check if an action was just released this frame
    pub fn action_just_released(
        &self,
        action: GameAction,
        keyboard: &ButtonInput<KeyCode>,
    ) -> bool {
        self.get(action).is_some_and(|binding| {
            keyboard.just_released(binding.primary)
                || binding.secondary.is_some_and(|key| keyboard.just_released(key))
        })
    }

    /// Check if a key is already bound to any action (for conflict detection)
    pub fn is_key_bound(&self, key: KeyCode, exclude_action: Option<GameAction>) -> Option<GameAction> {
        self.bindings
            .iter()
            .filter(|(action, _)| Some(**action) != exclude_action)
            .find(|(_, binding)| binding.matches(key))
            .map(|(action, _)| *action)
    }

    /// Get display string for a binding
    pub fn binding_display(&self, action: GameAction) -> String {
        match self.get(action) {
            Some(binding) => match binding.secondary {
                Some(secondary) => format!("{:?} / {:?}", binding.primary, secondary),
                None => format!("{:?}", binding.primary),
            },
            None => "Unbound".to_string(),
        }
    }
}
