//! Boss encounter simulation
//!
//! The core of the game: time scale ownership, the player's abilities, the
//! boss brain and the shared combat model, plus the ECS glue that drives
//! them each frame.
//!
//! Every core type has plain methods taking explicit delta times, so it can
//! be exercised without an `App`. [`EncounterPlugin`] wires them into Bevy.

use bevy::prelude::*;

pub mod abilities;
pub mod ability_config;
pub mod boss_ai;
pub mod combat_model;
pub mod components;
pub mod constants;
pub mod encounter_flow;
pub mod input;
pub mod player;
pub mod projectiles;
pub mod stage;
pub mod systems;
pub mod time_authority;
pub mod tunables;

pub use abilities::{AbilityController, AbilityType, ActivationRejection};
pub use ability_config::{AbilityConfigPlugin, AbilityDefinitions};
pub use boss_ai::{BossAi, BossPhase};
pub use combat_model::{CombatEntity, DamageOutcome};
pub use components::GameRng;
pub use encounter_flow::{EncounterOutcome, EncounterState};
pub use stage::{CollisionWorld, Stage};
pub use time_authority::{FrameClock, TimeAuthority};
pub use tunables::{EncounterTunables, TunablesPlugin};

use crate::combat::CombatPlugin;
use crate::keybindings::Keybindings;

/// Inserts the encounter resources and schedules the simulation.
///
/// Resources already present (a seeded [`GameRng`], custom tunables or
/// ability definitions, user keybindings) are left alone.
pub struct EncounterPlugin;

impl Plugin for EncounterPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<CombatPlugin>() {
            app.add_plugins(CombatPlugin);
        }
        app.add_plugins((TunablesPlugin, AbilityConfigPlugin));

        let world = app.world();
        let stage = Stage::from_tunables(&world.resource::<EncounterTunables>().stage);
        let controller = AbilityController::new(world.resource::<AbilityDefinitions>());

        if !world.contains_resource::<GameRng>() {
            info!("Using non-deterministic RNG (no seed provided)");
            app.insert_resource(GameRng::from_entropy());
        }
        if !app.world().contains_resource::<Keybindings>() {
            app.init_resource::<Keybindings>();
        }

        app.insert_resource(stage)
            .insert_resource(controller)
            .init_resource::<TimeAuthority>()
            .init_resource::<FrameClock>()
            .init_resource::<input::PlayerInput>()
            .init_resource::<EncounterState>();

        systems::configure_encounter_system_ordering(app);
        systems::add_core_encounter_systems(app, || true);

        app.add_systems(Startup, encounter_flow::setup_encounter);
    }
}
