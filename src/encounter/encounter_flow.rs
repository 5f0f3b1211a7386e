//! Encounter Flow Systems
//!
//! Handles the overall flow of an encounter:
//! - Spawning the player, the boss and pickups
//! - Interacting with pickups (healing, ability unlocks)
//! - Victory / defeat detection
//! - Restarting without losing unlocked abilities

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::abilities::{AbilityController, AbilityType};
use super::boss_ai::BossAi;
use super::combat_model::CombatEntity;
use super::components::{Boss, EncounterEntity, Player};
use super::input::PlayerInput;
use super::player::PlayerBody;
use super::time_authority::TimeAuthority;
use super::tunables::EncounterTunables;
use crate::combat::events::{
    AbilityDeactivatedEvent, AbilityUnlockedEvent, CombatantDeathEvent, DeactivationReason,
    HealingEvent, SoundCue, SoundCueEvent,
};
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::encounter::components::Faction;

/// Pickups can be used from this far away
pub const PICKUP_RANGE: f32 = 1.5;

/// How an encounter ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterOutcome {
    /// Boss defeated and removed
    Victory,
    /// Player died
    Defeat,
    /// Time limit reached
    Timeout,
}

impl EncounterOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            EncounterOutcome::Victory => "Victory",
            EncounterOutcome::Defeat => "Defeat",
            EncounterOutcome::Timeout => "Timeout",
        }
    }
}

/// Session-level encounter state.
#[derive(Resource, Debug, Default)]
pub struct EncounterState {
    pub outcome: Option<EncounterOutcome>,
    /// Number of restarts this session
    pub attempts: u32,
    /// Pickups placed at the start of each attempt
    pub pickups: Vec<PickupSpawn>,
}

impl EncounterState {
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }
}

/// What a pickup does when used
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PickupKind {
    /// Restores health
    Heal { amount: f32 },
    /// Grants an ability
    Unlock { ability: AbilityType },
}

impl PickupKind {
    pub fn describe(&self) -> String {
        match self {
            PickupKind::Heal { amount } => format!("Sugar (+{:.0} HP)", amount),
            PickupKind::Unlock { ability } => format!("{} relic", ability.name()),
        }
    }
}

/// Where a pickup appears
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickupSpawn {
    pub kind: PickupKind,
    pub position: (f32, f32),
}

/// An interactable item lying in the stage.
#[derive(Component, Debug, Clone, Copy)]
pub struct Pickup {
    pub kind: PickupKind,
}

/// Spawn the player, the boss and the configured pickups.
pub fn spawn_encounter(commands: &mut Commands, tunables: &EncounterTunables, pickups: &[PickupSpawn]) {
    let (px, py) = tunables.stage.player_spawn;
    commands.spawn((
        Player,
        PlayerBody::new(tunables.player.max_jumps),
        CombatEntity::player(&tunables.player),
        Transform::from_xyz(px, py, 0.0),
        EncounterEntity,
    ));

    let (bx, by) = tunables.stage.boss_spawn;
    commands.spawn((
        Boss,
        BossAi::new(tunables.boss.clone(), Vec2::new(bx, by)),
        CombatEntity::boss(&tunables.boss),
        Transform::from_xyz(bx, by, 0.0),
        EncounterEntity,
    ));

    for spawn in pickups {
        let (x, y) = spawn.position;
        commands.spawn((
            Pickup { kind: spawn.kind },
            Transform::from_xyz(x, y, 0.0),
            EncounterEntity,
        ));
    }
}

/// Startup system: first attempt.
pub fn setup_encounter(
    mut commands: Commands,
    tunables: Res<EncounterTunables>,
    state: Res<EncounterState>,
    mut combat_log: ResMut<CombatLog>,
) {
    combat_log.clear();
    combat_log.log(
        CombatLogEventType::EncounterEvent,
        "Encounter started".to_string(),
    );
    spawn_encounter(&mut commands, &tunables, &state.pickups);
    info!(
        "Encounter setup complete: player at {:?}, boss at {:?}",
        tunables.stage.player_spawn, tunables.stage.boss_spawn
    );
}

/// Use the nearest pickup in range when the player interacts.
pub fn use_pickups(
    mut commands: Commands,
    input: Res<PlayerInput>,
    mut controller: ResMut<AbilityController>,
    players: Query<(Entity, &Transform, &CombatEntity), With<Player>>,
    pickups: Query<(Entity, &Transform, &Pickup), Without<Player>>,
    mut healing_events: EventWriter<HealingEvent>,
    mut unlocked_events: EventWriter<AbilityUnlockedEvent>,
    mut sound_events: EventWriter<SoundCueEvent>,
) {
    if !input.interact {
        return;
    }
    let Ok((player, player_transform, combat)) = players.get_single() else {
        return;
    };
    if !combat.is_alive() {
        return;
    }

    let player_pos = player_transform.translation.truncate();
    let nearest = pickups
        .iter()
        .map(|(entity, transform, pickup)| {
            (entity, pickup, transform.translation.truncate().distance(player_pos))
        })
        .filter(|(_, _, distance)| *distance <= PICKUP_RANGE)
        .min_by(|a, b| a.2.total_cmp(&b.2));

    let Some((entity, pickup, _)) = nearest else {
        return;
    };

    match pickup.kind {
        PickupKind::Heal { amount } => {
            healing_events.send(HealingEvent {
                target: player,
                amount,
                source_name: "Sugar".to_string(),
            });
        }
        PickupKind::Unlock { ability } => {
            if controller.unlock(ability) {
                unlocked_events.send(AbilityUnlockedEvent { ability });
            }
        }
    }
    info!("Picked up {}", pickup.kind.describe());
    sound_events.send(SoundCueEvent {
        sound: SoundCue::Pickup,
    });
    commands.entity(entity).despawn_recursive();
}

/// Decide victory or defeat.
///
/// Defeat as soon as the player dies; victory once the dead boss has been
/// removed from the stage.
pub fn check_encounter_outcome(
    mut state: ResMut<EncounterState>,
    mut death_events: EventReader<CombatantDeathEvent>,
    bosses: Query<(), With<Boss>>,
    players: Query<(), With<Player>>,
    mut combat_log: ResMut<CombatLog>,
) {
    if state.is_over() {
        death_events.clear();
        return;
    }

    let player_died = death_events
        .read()
        .any(|event| event.faction == Faction::Player);

    let outcome = if player_died {
        Some(EncounterOutcome::Defeat)
    } else if bosses.is_empty() && !players.is_empty() {
        Some(EncounterOutcome::Victory)
    } else {
        None
    };

    if let Some(outcome) = outcome {
        info!("Encounter over: {}", outcome.name());
        combat_log.log(
            CombatLogEventType::EncounterEvent,
            format!("Encounter over: {}", outcome.name()),
        );
        state.outcome = Some(outcome);
    }
}

/// Tear down and respawn the encounter. Unlocked abilities carry over.
pub fn restart_encounter(
    mut commands: Commands,
    input: Res<PlayerInput>,
    tunables: Res<EncounterTunables>,
    mut state: ResMut<EncounterState>,
    mut controller: ResMut<AbilityController>,
    mut authority: ResMut<TimeAuthority>,
    entities: Query<Entity, With<EncounterEntity>>,
    mut deactivated_events: EventWriter<AbilityDeactivatedEvent>,
    mut combat_log: ResMut<CombatLog>,
) {
    if !input.restart {
        return;
    }

    for ability in controller.reset(&mut authority) {
        deactivated_events.send(AbilityDeactivatedEvent {
            ability,
            reason: DeactivationReason::Reset,
        });
    }

    for entity in entities.iter() {
        commands.entity(entity).despawn_recursive();
    }
    spawn_encounter(&mut commands, &tunables, &state.pickups);

    state.outcome = None;
    state.attempts += 1;
    info!("Encounter restarted (attempt {})", state.attempts + 1);
    combat_log.log(
        CombatLogEventType::EncounterEvent,
        format!("Encounter restarted (attempt {})", state.attempts + 1),
    );
}
