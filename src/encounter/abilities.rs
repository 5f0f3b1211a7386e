//! Player Abilities
//!
//! Lifecycle of the player's three abilities:
//!
//! ```text
//! Locked -> Unlocked(Idle) -> Active -> Idle(Cooldown) -> Idle
//! ```
//!
//! - **AntiGravity**: toggle with no duration or cooldown; inverts gravity.
//! - **TimeStop**: holds the time scale near zero for a fixed duration.
//! - **TimeSlowDown**: holds a reduced time scale for a fixed duration.
//!
//! TimeStop and TimeSlowDown are mutually exclusive. The controller enforces
//! that itself and the [`TimeAuthority`] enforces it again at the slot level,
//! so a time ability is only ever active while it holds the slot.
//!
//! All timers here run on unscaled (real) time.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

use super::ability_config::{AbilityConfig, AbilityDefinitions};
use super::time_authority::{TimeAuthority, TimeScaleSource};

/// Every ability the player can unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityType {
    AntiGravity,
    TimeStop,
    TimeSlowDown,
}

impl AbilityType {
    pub const ALL: [AbilityType; 3] = [
        AbilityType::AntiGravity,
        AbilityType::TimeStop,
        AbilityType::TimeSlowDown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AbilityType::AntiGravity => "Anti Gravity",
            AbilityType::TimeStop => "Time Stop",
            AbilityType::TimeSlowDown => "Time Slow Down",
        }
    }

    /// The time-scale source this ability holds while active, if any.
    pub fn time_source(&self) -> Option<TimeScaleSource> {
        match self {
            AbilityType::AntiGravity => None,
            AbilityType::TimeStop => Some(TimeScaleSource::TimeStop),
            AbilityType::TimeSlowDown => Some(TimeScaleSource::TimeSlowDown),
        }
    }

    pub fn is_time_ability(&self) -> bool {
        self.time_source().is_some()
    }

    /// Parse the identifier used in config files ("TimeStop", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "AntiGravity" => Some(AbilityType::AntiGravity),
            "TimeStop" => Some(AbilityType::TimeStop),
            "TimeSlowDown" => Some(AbilityType::TimeSlowDown),
            _ => None,
        }
    }
}

/// Runtime state of one ability.
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityState {
    pub unlocked: bool,
    pub active: bool,
    pub remaining_duration: f32,
    pub remaining_cooldown: f32,
    /// Configured active time (0.0 = toggle)
    pub duration: f32,
    /// Configured cooldown
    pub cooldown: f32,
    pub time_scale: Option<f32>,
    pub requires_grounded: bool,
}

impl AbilityState {
    fn from_config(config: &AbilityConfig) -> Self {
        Self {
            unlocked: false,
            active: false,
            remaining_duration: 0.0,
            remaining_cooldown: 0.0,
            duration: config.duration.max(0.0),
            cooldown: config.cooldown.max(0.0),
            time_scale: config.time_scale,
            requires_grounded: config.requires_grounded,
        }
    }

    fn is_timed(&self) -> bool {
        self.duration > 0.0
    }
}

/// Why an activation request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationRejection {
    /// No state exists for this ability
    Unknown,
    Locked,
    AlreadyActive,
    CoolingDown,
    /// The other time ability is running
    OtherTimeAbilityActive(AbilityType),
    /// The time authority refused the scale request
    TimeScaleDenied,
    /// Ability can only be switched while grounded
    RequiresGround,
}

impl fmt::Display for ActivationRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationRejection::Unknown => write!(f, "unknown ability"),
            ActivationRejection::Locked => write!(f, "not unlocked"),
            ActivationRejection::AlreadyActive => write!(f, "already active"),
            ActivationRejection::CoolingDown => write!(f, "cooling down"),
            ActivationRejection::OtherTimeAbilityActive(other) => {
                write!(f, "{} is active", other.name())
            }
            ActivationRejection::TimeScaleDenied => write!(f, "time scale unavailable"),
            ActivationRejection::RequiresGround => write!(f, "must be grounded"),
        }
    }
}

/// Owns every ability's state for the session.
#[derive(Resource, Debug, Clone)]
pub struct AbilityController {
    states: HashMap<AbilityType, AbilityState>,
}

impl AbilityController {
    /// Build a controller with one locked state per defined ability.
    pub fn new(definitions: &AbilityDefinitions) -> Self {
        let states = definitions
            .iter()
            .map(|(ability, config)| (*ability, AbilityState::from_config(config)))
            .collect();
        Self { states }
    }

    pub fn state(&self, ability: AbilityType) -> Option<&AbilityState> {
        self.states.get(&ability)
    }

    /// Unlock an ability. Unlocking is permanent for the session.
    ///
    /// Returns true only if the ability was locked before.
    pub fn unlock(&mut self, ability: AbilityType) -> bool {
        match self.states.get_mut(&ability) {
            Some(state) if !state.unlocked => {
                state.unlocked = true;
                info!("Unlocked ability: {}", ability.name());
                true
            }
            Some(_) => false,
            None => {
                warn!("Cannot unlock {:?}: no definition loaded", ability);
                false
            }
        }
    }

    /// Try to activate an ability, reporting why it was refused.
    ///
    /// Nothing changes unless every precondition holds. For time abilities the
    /// scale request is made last so a refusal leaves the authority untouched.
    pub fn try_activate(
        &mut self,
        ability: AbilityType,
        authority: &mut TimeAuthority,
    ) -> Result<(), ActivationRejection> {
        let state = self
            .states
            .get(&ability)
            .ok_or(ActivationRejection::Unknown)?;

        if !state.unlocked {
            return Err(ActivationRejection::Locked);
        }
        if state.active {
            return Err(ActivationRejection::AlreadyActive);
        }
        if state.remaining_cooldown > 0.0 {
            return Err(ActivationRejection::CoolingDown);
        }

        if let Some(source) = ability.time_source() {
            if let Some(other) = self.active_time_ability() {
                return Err(ActivationRejection::OtherTimeAbilityActive(other));
            }
            let scale = state.time_scale.unwrap_or(1.0);
            if !authority.request_scale(source, scale) {
                return Err(ActivationRejection::TimeScaleDenied);
            }
        }

        if let Some(state) = self.states.get_mut(&ability) {
            state.active = true;
            state.remaining_duration = state.duration;
            state.remaining_cooldown = state.cooldown;
        }

        Ok(())
    }

    /// Boolean form of [`Self::try_activate`].
    pub fn activate(&mut self, ability: AbilityType, authority: &mut TimeAuthority) -> bool {
        self.try_activate(ability, authority).is_ok()
    }

    /// End an active ability. Idempotent.
    ///
    /// Returns true if the ability was active.
    pub fn deactivate(&mut self, ability: AbilityType, authority: &mut TimeAuthority) -> bool {
        let Some(state) = self.states.get_mut(&ability) else {
            return false;
        };
        if !state.active {
            return false;
        }

        state.active = false;
        state.remaining_duration = 0.0;
        if let Some(source) = ability.time_source() {
            authority.release(source);
        }
        true
    }

    /// Flip a toggle ability. Returns the new active flag.
    pub fn toggle(
        &mut self,
        ability: AbilityType,
        authority: &mut TimeAuthority,
    ) -> Result<bool, ActivationRejection> {
        if self.is_active(ability) {
            self.deactivate(ability, authority);
            Ok(false)
        } else {
            self.try_activate(ability, authority).map(|_| true)
        }
    }

    /// Advance all timers by `unscaled_dt` and return the abilities that expired.
    ///
    /// Cooldowns count down whether or not the ability is active.
    pub fn tick(
        &mut self,
        unscaled_dt: f32,
        authority: &mut TimeAuthority,
    ) -> SmallVec<[AbilityType; 3]> {
        let dt = unscaled_dt.max(0.0);
        let mut expired = SmallVec::new();

        for (ability, state) in self.states.iter_mut() {
            state.remaining_cooldown = (state.remaining_cooldown - dt).max(0.0);

            if state.active && state.is_timed() {
                state.remaining_duration = (state.remaining_duration - dt).max(0.0);
                if state.remaining_duration <= 0.0 {
                    expired.push(*ability);
                }
            }
        }

        for ability in &expired {
            self.deactivate(*ability, authority);
        }

        expired
    }

    /// End every active ability and clear all cooldowns. Unlocks are kept.
    ///
    /// Returns the abilities that were active.
    pub fn reset(&mut self, authority: &mut TimeAuthority) -> SmallVec<[AbilityType; 3]> {
        let mut ended = SmallVec::new();
        for ability in AbilityType::ALL {
            if self.deactivate(ability, authority) {
                ended.push(ability);
            }
        }
        for state in self.states.values_mut() {
            state.remaining_cooldown = 0.0;
        }
        ended
    }

    pub fn is_active(&self, ability: AbilityType) -> bool {
        self.states.get(&ability).is_some_and(|s| s.active)
    }

    pub fn is_unlocked(&self, ability: AbilityType) -> bool {
        self.states.get(&ability).is_some_and(|s| s.unlocked)
    }

    pub fn requires_grounded(&self, ability: AbilityType) -> bool {
        self.states.get(&ability).is_some_and(|s| s.requires_grounded)
    }

    pub fn remaining_duration(&self, ability: AbilityType) -> f32 {
        self.states.get(&ability).map_or(0.0, |s| s.remaining_duration)
    }

    pub fn remaining_cooldown(&self, ability: AbilityType) -> f32 {
        self.states.get(&ability).map_or(0.0, |s| s.remaining_cooldown)
    }

    pub fn total_duration(&self, ability: AbilityType) -> f32 {
        self.states.get(&ability).map_or(0.0, |s| s.duration)
    }

    pub fn total_cooldown(&self, ability: AbilityType) -> f32 {
        self.states.get(&ability).map_or(0.0, |s| s.cooldown)
    }

    /// The time ability currently running, if any.
    pub fn active_time_ability(&self) -> Option<AbilityType> {
        AbilityType::ALL
            .into_iter()
            .filter(|a| a.is_time_ability())
            .find(|a| self.is_active(*a))
    }

    pub fn any_time_ability_active(&self) -> bool {
        self.active_time_ability().is_some()
    }

    /// Validates ability invariants (debug builds only).
    pub fn debug_validate(&self, authority: &TimeAuthority) {
        for (ability, state) in &self.states {
            debug_assert!(
                !state.active || state.unlocked,
                "{:?} is active but locked",
                ability
            );
            debug_assert!(
                state.remaining_duration >= 0.0 && state.remaining_cooldown >= 0.0,
                "{:?} has a negative timer",
                ability
            );
            if let (true, Some(source)) = (state.active, ability.time_source()) {
                debug_assert_eq!(
                    authority.holder(),
                    Some(source),
                    "{:?} is active without holding the time scale",
                    ability
                );
            }
        }
        let active_time = AbilityType::ALL
            .iter()
            .filter(|a| a.is_time_ability() && self.is_active(**a))
            .count();
        debug_assert!(active_time <= 1, "Both time abilities are active");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::ability_config::parse_ability_definitions;

    fn controller() -> AbilityController {
        let defs = parse_ability_definitions(
            r#"(abilities: {
                AntiGravity: (name: "Anti Gravity", requires_grounded: true),
                TimeStop: (name: "Time Stop", duration: 3.0, cooldown: 10.0, time_scale: Some(0.01)),
                TimeSlowDown: (name: "Time Slow Down", duration: 5.0, cooldown: 8.0, time_scale: Some(0.3)),
            })"#,
        )
        .unwrap();
        AbilityController::new(&defs)
    }

    #[test]
    fn test_locked_ability_cannot_activate() {
        let mut abilities = controller();
        let mut authority = TimeAuthority::default();
        assert_eq!(
            abilities.try_activate(AbilityType::TimeStop, &mut authority),
            Err(ActivationRejection::Locked)
        );
        assert_eq!(authority.effective_scale(), 1.0);
    }

    #[test]
    fn test_unlock_is_reported_once() {
        let mut abilities = controller();
        assert!(abilities.unlock(AbilityType::TimeStop));
        assert!(!abilities.unlock(AbilityType::TimeStop));
        assert!(abilities.is_unlocked(AbilityType::TimeStop));
    }

    #[test]
    fn test_time_stop_full_cycle() {
        let mut abilities = controller();
        let mut authority = TimeAuthority::default();
        abilities.unlock(AbilityType::TimeStop);

        assert!(abilities.activate(AbilityType::TimeStop, &mut authority));
        assert_eq!(authority.effective_scale(), 0.01);
        assert_eq!(abilities.remaining_cooldown(AbilityType::TimeStop), 10.0);

        let mut expired = SmallVec::<[AbilityType; 3]>::new();
        for _ in 0..6 {
            expired.extend(abilities.tick(0.5, &mut authority));
        }

        assert_eq!(expired.as_slice(), &[AbilityType::TimeStop]);
        assert!(!abilities.is_active(AbilityType::TimeStop));
        assert_eq!(authority.effective_scale(), 1.0);
        assert!((abilities.remaining_cooldown(AbilityType::TimeStop) - 7.0).abs() < 1e-3);

        // Still cooling down
        assert_eq!(
            abilities.try_activate(AbilityType::TimeStop, &mut authority),
            Err(ActivationRejection::CoolingDown)
        );
    }

    #[test]
    fn test_anti_gravity_toggles_without_expiry() {
        let mut abilities = controller();
        let mut authority = TimeAuthority::default();
        abilities.unlock(AbilityType::AntiGravity);

        assert_eq!(abilities.toggle(AbilityType::AntiGravity, &mut authority), Ok(true));
        for _ in 0..100 {
            assert!(abilities.tick(1.0, &mut authority).is_empty());
        }
        assert!(abilities.is_active(AbilityType::AntiGravity));
        assert_eq!(authority.effective_scale(), 1.0);

        assert_eq!(abilities.toggle(AbilityType::AntiGravity, &mut authority), Ok(false));
        assert!(!abilities.is_active(AbilityType::AntiGravity));
    }

    #[test]
    fn test_deactivate_is_idempotent() {
        let mut abilities = controller();
        let mut authority = TimeAuthority::default();
        abilities.unlock(AbilityType::TimeSlowDown);
        abilities.activate(AbilityType::TimeSlowDown, &mut authority);

        assert!(abilities.deactivate(AbilityType::TimeSlowDown, &mut authority));
        assert!(!abilities.deactivate(AbilityType::TimeSlowDown, &mut authority));
        assert_eq!(authority.effective_scale(), 1.0);
        // Cooldown keeps running after manual deactivation
        assert_eq!(abilities.remaining_cooldown(AbilityType::TimeSlowDown), 8.0);
    }

    #[test]
    fn test_deactivate_does_not_release_foreign_holder() {
        let mut abilities = controller();
        let mut authority = TimeAuthority::default();
        abilities.unlock(AbilityType::TimeStop);
        abilities.activate(AbilityType::TimeStop, &mut authority);

        // TimeSlowDown is not active, so this must not touch the slot
        abilities.deactivate(AbilityType::TimeSlowDown, &mut authority);
        assert_eq!(authority.holder(), Some(TimeScaleSource::TimeStop));
    }

    #[test]
    fn test_tick_floors_timers_at_zero() {
        let mut abilities = controller();
        let mut authority = TimeAuthority::default();
        abilities.unlock(AbilityType::TimeStop);
        abilities.activate(AbilityType::TimeStop, &mut authority);

        abilities.tick(1000.0, &mut authority);
        assert_eq!(abilities.remaining_duration(AbilityType::TimeStop), 0.0);
        assert_eq!(abilities.remaining_cooldown(AbilityType::TimeStop), 0.0);

        // Negative deltas are ignored
        abilities.tick(-5.0, &mut authority);
        assert_eq!(abilities.remaining_cooldown(AbilityType::TimeStop), 0.0);
    }

    #[test]
    fn test_reset_clears_cooldowns_and_keeps_unlocks() {
        let mut abilities = controller();
        let mut authority = TimeAuthority::default();
        abilities.unlock(AbilityType::TimeStop);
        abilities.unlock(AbilityType::TimeSlowDown);
        assert!(abilities.activate(AbilityType::TimeStop, &mut authority));

        let ended = abilities.reset(&mut authority);
        assert_eq!(ended.as_slice(), &[AbilityType::TimeStop]);
        assert_eq!(authority.effective_scale(), 1.0);
        assert_eq!(abilities.remaining_cooldown(AbilityType::TimeStop), 0.0);
        assert!(abilities.is_unlocked(AbilityType::TimeStop));
        assert!(abilities.activate(AbilityType::TimeStop, &mut authority));
    }
}
