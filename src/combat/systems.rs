//! Combat systems
//!
//! ECS systems that resolve damage and healing against [`CombatEntity`]
//! components and record the results.

use bevy::prelude::*;

use super::events::*;
use super::log::{CombatLog, CombatLogEventType};
use crate::encounter::boss_ai::{BossAi, BossAnimation};
use crate::encounter::combat_model::{CombatEntity, DamageOutcome};
use crate::encounter::components::{Faction, GameRng, Player};
use crate::encounter::time_authority::FrameClock;

fn faction_of(is_player: bool) -> Faction {
    if is_player {
        Faction::Player
    } else {
        Faction::Boss
    }
}

fn cause_name(cause: DamageCause) -> &'static str {
    match cause {
        DamageCause::Projectile => "Bullet",
        DamageCause::Contact => "Contact",
        DamageCause::Scripted => "Scripted Hit",
    }
}

/// Keep the log clock in step with the encounter.
pub fn track_encounter_time(clock: Res<FrameClock>, mut combat_log: ResMut<CombatLog>) {
    combat_log.encounter_time = clock.elapsed;
}

/// Advance invincibility, blink and control lock on unscaled time.
pub fn tick_combat_entities(
    clock: Res<FrameClock>,
    mut combatants: Query<(Entity, &mut CombatEntity)>,
    mut animation_events: EventWriter<AnimationCueEvent>,
) {
    for (entity, mut combat) in combatants.iter_mut() {
        let report = combat.tick(clock.unscaled);
        if report.blink_toggled {
            let visible = combat.invincibility().map_or(true, |inv| inv.visible);
            animation_events.send(AnimationCueEvent {
                entity,
                cue: AnimationCue::Visibility(visible),
            });
        }
        combat.debug_validate();
    }
}

/// Apply queued damage, react to it and record it.
pub fn process_damage_events(
    mut damage_events: EventReader<DamageEvent>,
    mut rng: ResMut<GameRng>,
    mut combatants: Query<(&Transform, &mut CombatEntity, Has<Player>, Option<&mut BossAi>)>,
    players: Query<&Transform, With<Player>>,
    mut combat_log: ResMut<CombatLog>,
    mut death_events: EventWriter<CombatantDeathEvent>,
    mut animation_events: EventWriter<AnimationCueEvent>,
    mut sound_events: EventWriter<SoundCueEvent>,
) {
    let player_position = players
        .get_single()
        .map(|t| t.translation.truncate())
        .ok();
    let mut dealt_by_player = 0.0;
    let mut dealt_by_boss = 0.0;

    for event in damage_events.read() {
        let Ok((transform, mut combat, is_player, boss_ai)) = combatants.get_mut(event.target)
        else {
            continue;
        };
        let position = transform.translation.truncate();
        let target_faction = faction_of(is_player);

        let outcome = combat.take_damage(
            event.amount,
            event.source_position,
            position,
            event.knockback_force,
        );
        let DamageOutcome::Applied { amount, died } = outcome else {
            debug!("{} ignored hit: {:?}", target_faction.name(), outcome);
            continue;
        };

        match event.source {
            Faction::Player => dealt_by_player += amount,
            Faction::Boss => dealt_by_boss += amount,
        }

        let cause = cause_name(event.cause);
        let message = format!(
            "{}'s {} hits {} for {:.0} damage ({:.0} HP left)",
            event.source.name(),
            cause,
            target_faction.name(),
            amount,
            combat.health
        );
        combat_log.log_damage(
            event.source.name().to_string(),
            target_faction.name().to_string(),
            cause.to_string(),
            amount,
            died,
            message,
        );

        if let Some(mut ai) = boss_ai {
            let reaction = ai.on_damaged(
                position,
                player_position.unwrap_or(event.source_position),
                died,
                &mut rng,
            );
            if reaction.hurt {
                animation_events.send(AnimationCueEvent {
                    entity: event.target,
                    cue: AnimationCue::Boss(BossAnimation::Hurt),
                });
                sound_events.send(SoundCueEvent {
                    sound: SoundCue::BossHurt,
                });
            }
            if reaction.escape_started {
                combat_log.log(
                    CombatLogEventType::EncounterEvent,
                    "Boss dashes away".to_string(),
                );
            }
            if reaction.died {
                animation_events.send(AnimationCueEvent {
                    entity: event.target,
                    cue: AnimationCue::Boss(BossAnimation::Death),
                });
                sound_events.send(SoundCueEvent {
                    sound: SoundCue::BossDeath,
                });
            }
        } else if is_player {
            sound_events.send(SoundCueEvent {
                sound: SoundCue::PlayerHurt,
            });
        }

        if died {
            info!("{} has been defeated", target_faction.name());
            combat_log.log(
                CombatLogEventType::Death,
                format!("{} has been defeated", target_faction.name()),
            );
            death_events.send(CombatantDeathEvent {
                victim: event.target,
                faction: target_faction,
            });
        }
    }

    if dealt_by_player > 0.0 || dealt_by_boss > 0.0 {
        for (_, mut combat, is_player, _) in combatants.iter_mut() {
            combat.damage_dealt += if is_player { dealt_by_player } else { dealt_by_boss };
        }
    }
}

/// Apply queued healing and record it.
pub fn process_healing_events(
    mut healing_events: EventReader<HealingEvent>,
    mut combatants: Query<(&mut CombatEntity, Has<Player>)>,
    mut combat_log: ResMut<CombatLog>,
) {
    for event in healing_events.read() {
        let Ok((mut combat, is_player)) = combatants.get_mut(event.target) else {
            continue;
        };
        let restored = combat.heal(event.amount);
        if restored <= 0.0 {
            continue;
        }

        let target = faction_of(is_player).name();
        combat_log.log_healing(
            target.to_string(),
            event.source_name.clone(),
            restored,
            format!(
                "{} heals {:.0} from {} ({:.0} HP)",
                target, restored, event.source_name, combat.health
            ),
        );
    }
}

/// Record ability lifecycle events.
pub fn log_ability_events(
    mut combat_log: ResMut<CombatLog>,
    mut unlocked_events: EventReader<AbilityUnlockedEvent>,
    mut activated_events: EventReader<AbilityActivatedEvent>,
    mut deactivated_events: EventReader<AbilityDeactivatedEvent>,
    mut rejected_events: EventReader<AbilityRejectedEvent>,
) {
    for event in unlocked_events.read() {
        combat_log.log(
            CombatLogEventType::EncounterEvent,
            format!("Unlocked {}", event.ability.name()),
        );
    }
    for event in activated_events.read() {
        combat_log.log(
            CombatLogEventType::AbilityUsed,
            format!("Player uses {}", event.ability.name()),
        );
    }
    for event in deactivated_events.read() {
        combat_log.log(
            CombatLogEventType::AbilityEnded,
            format!("{} ended ({:?})", event.ability.name(), event.reason),
        );
    }
    for event in rejected_events.read() {
        combat_log.log(
            CombatLogEventType::AbilityRejected,
            format!("{} refused: {}", event.ability.name(), event.reason),
        );
    }
}

/// Record boss phase transitions.
pub fn log_boss_phase_events(
    mut combat_log: ResMut<CombatLog>,
    mut phase_events: EventReader<BossPhaseChangedEvent>,
) {
    for event in phase_events.read() {
        combat_log.log_phase_change(event.from.name(), event.to.name());
    }
}
