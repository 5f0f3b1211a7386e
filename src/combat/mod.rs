//! Combat system
//!
//! Event plumbing and bookkeeping shared by every encounter:
//! - Damage, healing and death events
//! - Ability and boss phase notifications
//! - Animation and sound cues for presentation collaborators
//! - Encounter logging

use bevy::prelude::*;

pub mod events;
pub mod log;
pub mod systems;

use events::*;

/// Registers combat events and the encounter log.
///
/// Systems are scheduled by `encounter::systems::add_core_encounter_systems`.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app
            // Combat events
            .add_event::<DamageEvent>()
            .add_event::<HealingEvent>()
            .add_event::<CombatantDeathEvent>()
            // Abilities
            .add_event::<AbilityUnlockedEvent>()
            .add_event::<AbilityActivatedEvent>()
            .add_event::<AbilityDeactivatedEvent>()
            .add_event::<AbilityRejectedEvent>()
            // Boss
            .add_event::<BossPhaseChangedEvent>()
            // Presentation cues
            .add_event::<AnimationCueEvent>()
            .add_event::<SoundCueEvent>()
            // Resources
            .init_resource::<log::CombatLog>();
    }
}
