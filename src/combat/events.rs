//! Combat events
//!
//! Events raised during an encounter. Gameplay systems send them; combat
//! resolution, the encounter log and any presentation layer (animation,
//! audio) consume them. Presentation cues are fire-and-forget: nothing in
//! the simulation waits on them.

use bevy::prelude::*;

use crate::encounter::abilities::{AbilityType, ActivationRejection};
use crate::encounter::boss_ai::{BossAnimation, BossPhase};
use crate::encounter::components::Faction;
use crate::encounter::player::PlayerAnimation;

/// What caused a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageCause {
    Projectile,
    /// Touching the boss
    Contact,
    /// Injected from outside the simulation (scripts, tests)
    Scripted,
}

/// Event fired when something should take damage
#[derive(Event, Debug, Clone)]
pub struct DamageEvent {
    /// Side that dealt the damage
    pub source: Faction,
    /// Entity receiving the damage
    pub target: Entity,
    pub amount: f32,
    /// Where the hit came from; knockback pushes away from here
    pub source_position: Vec2,
    pub knockback_force: f32,
    pub cause: DamageCause,
}

/// Event fired when healing should be applied
#[derive(Event, Debug, Clone)]
pub struct HealingEvent {
    pub target: Entity,
    pub amount: f32,
    /// Where the healing came from (e.g. "Sugar")
    pub source_name: String,
}

/// Event fired when a combatant's health reaches zero. Sent exactly once per combatant.
#[derive(Event, Debug, Clone)]
pub struct CombatantDeathEvent {
    pub victim: Entity,
    pub faction: Faction,
}

/// Why an ability stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeactivationReason {
    /// Ran out of duration
    Expired,
    /// Switched off by the player
    Toggled,
    /// Encounter was reset
    Reset,
}

/// Event fired when the player unlocks an ability
#[derive(Event, Debug, Clone)]
pub struct AbilityUnlockedEvent {
    pub ability: AbilityType,
}

/// Event fired when an ability was successfully activated
#[derive(Event, Debug, Clone)]
pub struct AbilityActivatedEvent {
    pub ability: AbilityType,
}

/// Event fired when an active ability ends
#[derive(Event, Debug, Clone)]
pub struct AbilityDeactivatedEvent {
    pub ability: AbilityType,
    pub reason: DeactivationReason,
}

/// Event fired when an activation request was refused
#[derive(Event, Debug, Clone)]
pub struct AbilityRejectedEvent {
    pub ability: AbilityType,
    pub reason: ActivationRejection,
}

/// Event fired when the boss changes phase
#[derive(Event, Debug, Clone)]
pub struct BossPhaseChangedEvent {
    pub from: BossPhase,
    pub to: BossPhase,
}

/// Named animation states and visual toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationCue {
    Player(PlayerAnimation),
    Boss(BossAnimation),
    /// Sprite shown / hidden (invincibility blink)
    Visibility(bool),
    /// Sprite flipped upside down (anti gravity)
    GravityFlip(bool),
    /// Sprite mirrored horizontally
    FacingLeft(bool),
}

/// Event asking the animation collaborator to play a state
#[derive(Event, Debug, Clone)]
pub struct AnimationCueEvent {
    pub entity: Entity,
    pub cue: AnimationCue,
}

/// One-shot sounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Jump,
    Shoot,
    PlayerHurt,
    Ability,
    BossHurt,
    BossDeath,
    Pickup,
}

/// Event asking the audio collaborator to play a one-shot sound
#[derive(Event, Debug, Clone)]
pub struct SoundCueEvent {
    pub sound: SoundCue,
}
