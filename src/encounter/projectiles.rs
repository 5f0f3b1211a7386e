//! Projectile Systems
//!
//! Straight-line bullets for both sides. Boss bullets live on scaled time so
//! slowing time slows them down; player bullets ignore the time scale.
//! Hits become [`DamageEvent`]s and the bullet is consumed even when the
//! target is invincible.

use bevy::prelude::*;

use super::combat_model::CombatEntity;
use super::components::{Boss, EncounterEntity, Faction, Player};
use super::stage::{CollisionWorld, Stage};
use super::time_authority::FrameClock;
use super::tunables::{BossTunables, EncounterTunables};
use crate::combat::events::{DamageCause, DamageEvent};

/// Radius used for boss bullets
const BOSS_BULLET_RADIUS: f32 = 0.3;

/// A bullet in flight.
#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub owner: Faction,
    /// Unit travel direction
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub knockback: f32,
    /// Seconds left before it fizzles
    pub lifetime: f32,
    pub ignores_time_scale: bool,
    pub radius: f32,
}

impl Projectile {
    /// A boss bullet heading along `direction`.
    pub fn boss_shot(direction: Vec2, tunables: &BossTunables) -> Self {
        Self {
            owner: Faction::Boss,
            direction: direction.normalize_or_zero(),
            speed: tunables.bullet_speed,
            damage: tunables.bullet_damage,
            knockback: tunables.bullet_knockback,
            lifetime: tunables.bullet_lifetime,
            ignores_time_scale: false,
            radius: BOSS_BULLET_RADIUS,
        }
    }

    /// Delta time this bullet lives on.
    pub fn delta(&self, clock: &FrameClock) -> f32 {
        if self.ignores_time_scale {
            clock.unscaled
        } else {
            clock.scaled
        }
    }

    /// Advance one frame. Returns false once the bullet has expired.
    pub fn advance(&mut self, position: Vec2, dt: f32) -> (Vec2, bool) {
        self.lifetime -= dt;
        (position + self.direction * self.speed * dt, self.lifetime > 0.0)
    }
}

/// Spawn one boss bullet per direction at `origin`.
pub fn spawn_boss_shots(
    commands: &mut Commands,
    origin: Vec2,
    directions: &[Vec2],
    tunables: &BossTunables,
) {
    for direction in directions {
        commands.spawn((
            Projectile::boss_shot(*direction, tunables),
            Transform::from_translation(origin.extend(0.0)),
            EncounterEntity,
        ));
    }
}

/// Move bullets and remove the ones that expired or hit the stage.
pub fn move_projectiles(
    mut commands: Commands,
    clock: Res<FrameClock>,
    stage: Res<Stage>,
    mut projectiles: Query<(Entity, &mut Projectile, &mut Transform)>,
) {
    for (entity, mut projectile, mut transform) in projectiles.iter_mut() {
        let dt = projectile.delta(&clock);
        let (next, alive) = projectile.advance(transform.translation.truncate(), dt);
        transform.translation.x = next.x;
        transform.translation.y = next.y;

        if !alive || stage.is_solid(next) {
            commands.entity(entity).despawn_recursive();
        }
    }
}

/// Check bullets against the opposing side and queue damage.
pub fn process_projectile_hits(
    mut commands: Commands,
    tunables: Res<EncounterTunables>,
    projectiles: Query<(Entity, &Projectile, &Transform)>,
    players: Query<(Entity, &Transform, &CombatEntity), (With<Player>, Without<Projectile>)>,
    bosses: Query<(Entity, &Transform, &CombatEntity), (With<Boss>, Without<Projectile>)>,
    mut damage_events: EventWriter<DamageEvent>,
) {
    let player = players.get_single().ok();
    let boss = bosses.get_single().ok();

    for (entity, projectile, transform) in projectiles.iter() {
        let position = transform.translation.truncate();

        let (target, target_radius) = match projectile.owner {
            Faction::Boss => (player, tunables.player.body_half_size),
            Faction::Player => (boss, tunables.boss.body_radius),
        };
        let Some((target_entity, target_transform, target_combat)) = target else {
            continue;
        };
        // Dead bodies are not targets
        if !target_combat.is_alive() {
            continue;
        }

        let reach = target_radius + projectile.radius;
        if position.distance(target_transform.translation.truncate()) > reach {
            continue;
        }

        damage_events.send(DamageEvent {
            source: projectile.owner,
            target: target_entity,
            amount: projectile.damage,
            source_position: position,
            knockback_force: projectile.knockback,
            cause: DamageCause::Projectile,
        });
        commands.entity(entity).despawn_recursive();
    }
}

/// Touching a living boss hurts the player.
pub fn boss_contact_damage(
    tunables: Res<EncounterTunables>,
    players: Query<(Entity, &Transform, &CombatEntity), With<Player>>,
    bosses: Query<(&Transform, &CombatEntity), With<Boss>>,
    mut damage_events: EventWriter<DamageEvent>,
) {
    let Ok((player_entity, player_transform, player_combat)) = players.get_single() else {
        return;
    };
    if !player_combat.is_alive() || player_combat.is_invincible() {
        return;
    }

    let player_pos = player_transform.translation.truncate();
    for (boss_transform, boss_combat) in bosses.iter() {
        if !boss_combat.is_alive() {
            continue;
        }
        let boss_pos = boss_transform.translation.truncate();
        let reach = tunables.boss.body_radius + tunables.player.body_half_size;
        if boss_pos.distance(player_pos) <= reach {
            damage_events.send(DamageEvent {
                source: Faction::Boss,
                target: player_entity,
                amount: tunables.boss.contact_damage,
                source_position: boss_pos,
                knockback_force: tunables.boss.contact_knockback,
                cause: DamageCause::Contact,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boss_shot_uses_tunables() {
        let tunables = BossTunables::default();
        let shot = Projectile::boss_shot(Vec2::new(3.0, 0.0), &tunables);
        assert_eq!(shot.direction, Vec2::X);
        assert_eq!(shot.damage, tunables.bullet_damage);
        assert!(!shot.ignores_time_scale);
    }

    #[test]
    fn test_boss_bullets_follow_scaled_time() {
        let mut clock = FrameClock::default();
        clock.apply_scale(0.25);
        clock.begin_frame(0.5);

        let boss_shot = Projectile::boss_shot(Vec2::X, &BossTunables::default());
        assert_eq!(boss_shot.delta(&clock), 0.125);

        let player_shot = Projectile {
            ignores_time_scale: true,
            ..boss_shot
        };
        assert_eq!(player_shot.delta(&clock), 0.5);
    }

    #[test]
    fn test_lifetime_expires() {
        let mut shot = Projectile::boss_shot(Vec2::X, &BossTunables::default());
        shot.lifetime = 0.5;
        let (pos, alive) = shot.advance(Vec2::ZERO, 0.25);
        assert!(alive);
        assert_eq!(pos, Vec2::new(shot.speed * 0.25, 0.0));
        let (_, alive) = shot.advance(pos, 0.25);
        assert!(!alive);
    }

    fn contact_app(boss_alive: bool) -> App {
        let tunables = EncounterTunables::default();
        let mut app = App::new();
        app.add_event::<DamageEvent>()
            .add_systems(Update, boss_contact_damage);

        app.world_mut().spawn((
            Player,
            Transform::from_xyz(0.5, 0.0, 0.0),
            CombatEntity::player(&tunables.player),
        ));
        let mut boss = CombatEntity::boss(&tunables.boss);
        if !boss_alive {
            boss.take_damage(boss.max_health, Vec2::ZERO, Vec2::ZERO, 0.0);
        }
        // A freshly spawned boss is still dormant
        app.world_mut().spawn((Boss, Transform::default(), boss));
        app.insert_resource(tunables);
        app
    }

    #[test]
    fn test_touching_dormant_boss_hurts() {
        let mut app = contact_app(true);
        app.update();
        let hits: Vec<_> = app
            .world()
            .resource::<Events<DamageEvent>>()
            .iter_current_update_events()
            .cloned()
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].cause, DamageCause::Contact);
        assert_eq!(hits[0].source, Faction::Boss);
    }

    #[test]
    fn test_dead_boss_does_not_hurt() {
        let mut app = contact_app(false);
        app.update();
        assert!(app.world().resource::<Events<DamageEvent>>().is_empty());
    }
}
