//! Encounter Systems API
//!
//! Stable entry point for scheduling the encounter simulation. Hosts (the
//! headless runner, a windowed game, tests) import from here rather than
//! from the individual modules.
//!
//! ## System Phases
//!
//! Encounter systems run in three ordered phases each frame:
//!
//! 1. **TimersAndInput** - Frame clock, input snapshot, abilities, time scale, hit timers
//! 2. **AiAndMovement** - Player motion and shooting, boss AI, projectile flight, pickups
//! 3. **CombatResolution** - Hits, damage and healing, outcome, restart
//!
//! ## Usage
//!
//! ```ignore
//! use chronoboss::encounter::systems;
//!
//! systems::configure_encounter_system_ordering(&mut app);
//! systems::add_core_encounter_systems(&mut app, || true);
//! ```

use bevy::prelude::*;

// === Phase 1: Timers and Input ===
pub use super::time_authority::{advance_frame_clock, apply_time_scale};
pub use crate::combat::systems::track_encounter_time;
pub use super::input::read_player_input;
pub use super::player::{apply_ability_effects, handle_ability_input, handle_unlock_input, tick_abilities};
pub use crate::combat::systems::{log_ability_events, tick_combat_entities};

// === Phase 2: AI and Movement ===
pub use super::player::{move_player, player_shoot};
pub use super::boss_ai::systems::update_boss_ai;
pub use super::projectiles::move_projectiles;
pub use super::encounter_flow::use_pickups;

// === Phase 3: Combat Resolution ===
pub use super::projectiles::{boss_contact_damage, process_projectile_hits};
pub use crate::combat::systems::{log_boss_phase_events, process_damage_events, process_healing_events};
pub use super::encounter_flow::{check_encounter_outcome, restart_encounter};

// === Components and Resources ===
pub use super::abilities::AbilityController;
pub use super::boss_ai::BossAi;
pub use super::combat_model::CombatEntity;
pub use super::components::{Boss, EncounterEntity, GameRng, Player};
pub use super::encounter_flow::{EncounterOutcome, EncounterState};
pub use super::input::PlayerInput;
pub use super::player::PlayerBody;
pub use super::time_authority::{FrameClock, TimeAuthority};

/// System set labels for encounter system ordering.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum EncounterSystemPhase {
    /// Phase 1: Clock, input, abilities, time scale, invincibility
    TimersAndInput,
    /// Phase 2: Player, boss, projectiles
    AiAndMovement,
    /// Phase 3: Damage, outcome, restart
    CombatResolution,
}

/// Configures the ordering between encounter system phases.
///
/// Call this once during app setup before adding encounter systems.
pub fn configure_encounter_system_ordering(app: &mut App) {
    app.configure_sets(
        Update,
        (
            EncounterSystemPhase::TimersAndInput,
            EncounterSystemPhase::AiAndMovement,
            EncounterSystemPhase::CombatResolution,
        )
            .chain(),
    );
}

/// Adds the encounter simulation systems to the app.
///
/// # Arguments
/// * `app` - The Bevy App to add systems to
/// * `run_condition` - A run condition (`|| true` to always run)
pub fn add_core_encounter_systems<M>(app: &mut App, run_condition: impl Condition<M> + Clone)
where
    M: 'static,
{
    // Phase 1: Timers and Input
    app.add_systems(
        Update,
        (
            advance_frame_clock,
            track_encounter_time,
            read_player_input,
            handle_unlock_input,
            handle_ability_input,
            tick_abilities,
            // Scale is final for this frame once abilities have been processed
            apply_time_scale,
            apply_ability_effects,
            tick_combat_entities,
            log_ability_events,
        )
            .chain()
            .in_set(EncounterSystemPhase::TimersAndInput)
            .run_if(run_condition.clone()),
    );

    // Flush deferred commands between phases
    app.add_systems(
        Update,
        apply_deferred
            .after(EncounterSystemPhase::TimersAndInput)
            .before(EncounterSystemPhase::AiAndMovement)
            .run_if(run_condition.clone()),
    );

    // Phase 2: AI and Movement
    app.add_systems(
        Update,
        (
            move_player,
            player_shoot,
            update_boss_ai,
            move_projectiles,
            use_pickups,
        )
            .chain()
            .in_set(EncounterSystemPhase::AiAndMovement)
            .run_if(run_condition.clone()),
    );

    app.add_systems(
        Update,
        apply_deferred
            .after(EncounterSystemPhase::AiAndMovement)
            .before(EncounterSystemPhase::CombatResolution)
            .run_if(run_condition.clone()),
    );

    // Phase 3: Combat Resolution
    app.add_systems(
        Update,
        (
            process_projectile_hits,
            boss_contact_damage,
            process_damage_events,
            process_healing_events,
            log_boss_phase_events,
            check_encounter_outcome,
            restart_encounter,
        )
            .chain()
            .in_set(EncounterSystemPhase::CombatResolution)
            .run_if(run_condition),
    );
}
