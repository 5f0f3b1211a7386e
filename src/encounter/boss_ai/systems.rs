//! ECS glue for the boss AI.

use bevy::prelude::*;

use super::{BossAi, BossContext};
use crate::combat::events::{AnimationCue, AnimationCueEvent, BossPhaseChangedEvent};
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::encounter::combat_model::CombatEntity;
use crate::encounter::components::{Boss, GameRng, Player};
use crate::encounter::projectiles::spawn_boss_shots;
use crate::encounter::time_authority::FrameClock;

/// Tick every boss on scaled time and apply what it asks for.
pub fn update_boss_ai(
    mut commands: Commands,
    clock: Res<FrameClock>,
    mut rng: ResMut<GameRng>,
    mut combat_log: ResMut<CombatLog>,
    players: Query<&Transform, (With<Player>, Without<Boss>)>,
    mut bosses: Query<(Entity, &mut Transform, &mut BossAi, &CombatEntity), With<Boss>>,
    mut phase_events: EventWriter<BossPhaseChangedEvent>,
    mut animation_events: EventWriter<AnimationCueEvent>,
) {
    let Ok(player_transform) = players.get_single() else {
        return;
    };
    let player_position = player_transform.translation.truncate();

    for (entity, mut transform, mut ai, combat) in bosses.iter_mut() {
        let mut ctx = BossContext {
            dt: clock.scaled,
            position: transform.translation.truncate(),
            player_position,
            health: combat.health,
            max_health: combat.max_health,
            rng: &mut rng,
        };
        let out = ai.tick(&mut ctx);
        ai.debug_validate();

        transform.translation.x = out.position.x;
        transform.translation.y = out.position.y;
        transform.rotation = Quat::from_rotation_z(out.facing_degrees.to_radians());

        if out.activated {
            combat_log.log(
                CombatLogEventType::EncounterEvent,
                "The boss awakens".to_string(),
            );
        }

        for (from, to) in out.phase_changes.iter().copied() {
            info!("Boss phase {} -> {}", from.name(), to.name());
            phase_events.send(BossPhaseChangedEvent { from, to });
        }

        for animation in out.animations.iter().copied() {
            animation_events.send(AnimationCueEvent {
                entity,
                cue: AnimationCue::Boss(animation),
            });
        }

        if let Some((from, to)) = out.teleport {
            debug!("Boss teleported {:?} -> {:?}", from, to);
            combat_log.log(
                CombatLogEventType::EncounterEvent,
                format!("Boss teleports to ({:.1}, {:.1})", to.x, to.y),
            );
        }

        if !out.shots.is_empty() {
            spawn_boss_shots(&mut commands, out.position, &out.shots, &ai.tunables);
        }

        if out.remove {
            combat_log.log(
                CombatLogEventType::EncounterEvent,
                "The boss crumbles".to_string(),
            );
            commands.entity(entity).despawn_recursive();
        }
    }
}
