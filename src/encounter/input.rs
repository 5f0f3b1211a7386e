//! Player input
//!
//! Collapses raw key state into the per-frame [`PlayerInput`] snapshot that
//! the gameplay systems read. Nothing downstream looks at the keyboard.

use bevy::prelude::*;

use super::abilities::AbilityType;
use crate::keybindings::{GameAction, Keybindings};

/// What the player asked for this frame.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct PlayerInput {
    /// -1 (left) to 1 (right)
    pub move_axis: f32,
    pub jump_pressed: bool,
    /// Jump let go this frame (short hop)
    pub jump_released: bool,
    pub shoot: bool,
    pub toggle_anti_gravity: bool,
    pub time_stop: bool,
    pub time_slow: bool,
    pub interact: bool,
    pub restart: bool,
    pub unlock: Option<AbilityType>,
}

impl PlayerInput {
    /// The ability the player tried to use this frame, if any.
    ///
    /// Only one per frame; anti gravity wins over the time abilities.
    pub fn requested_ability(&self) -> Option<AbilityType> {
        if self.toggle_anti_gravity {
            Some(AbilityType::AntiGravity)
        } else if self.time_stop {
            Some(AbilityType::TimeStop)
        } else if self.time_slow {
            Some(AbilityType::TimeSlowDown)
        } else {
            None
        }
    }
}

/// Read the keyboard through the keybindings.
pub fn read_player_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    keybindings: Res<Keybindings>,
    mut input: ResMut<PlayerInput>,
) {
    let pressed = |action| keybindings.action_pressed(action, &keyboard);
    let just = |action| keybindings.action_just_pressed(action, &keyboard);

    let mut axis = 0.0;
    if pressed(GameAction::MoveLeft) {
        axis -= 1.0;
    }
    if pressed(GameAction::MoveRight) {
        axis += 1.0;
    }

    let unlock = if just(GameAction::UnlockAntiGravity) {
        Some(AbilityType::AntiGravity)
    } else if just(GameAction::UnlockTimeStop) {
        Some(AbilityType::TimeStop)
    } else if just(GameAction::UnlockTimeSlowDown) {
        Some(AbilityType::TimeSlowDown)
    } else {
        None
    };

    *input = PlayerInput {
        move_axis: axis,
        jump_pressed: just(GameAction::Jump),
        jump_released: keybindings.action_just_released(GameAction::Jump, &keyboard),
        shoot: just(GameAction::Shoot),
        toggle_anti_gravity: just(GameAction::AntiGravity),
        time_stop: just(GameAction::TimeStop),
        time_slow: just(GameAction::TimeSlowDown),
        interact: just(GameAction::Interact),
        restart: just(GameAction::Restart),
        unlock,
    };
}
