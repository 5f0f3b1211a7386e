//! Player character
//!
//! Platformer body integration plus the systems that turn [`PlayerInput`]
//! into motion, shots and ability requests.
//!
//! Motion follows the dual-time rule: horizontal control, jump impulses and
//! position integration run on unscaled time, gravity runs on
//! `unscaled * scale`. Slowing time therefore makes the player float while
//! still steering at full speed.

use bevy::prelude::*;

use super::abilities::{AbilityController, AbilityType, ActivationRejection};
use super::combat_model::CombatEntity;
use super::components::{Faction, Player};
use super::input::PlayerInput;
use super::projectiles::Projectile;
use super::stage::{CollisionWorld, Stage};
use super::time_authority::{FrameClock, TimeAuthority};
use super::tunables::{EncounterTunables, PlayerTunables};
use crate::combat::events::{
    AbilityActivatedEvent, AbilityDeactivatedEvent, AbilityRejectedEvent, AbilityUnlockedEvent,
    AnimationCue, AnimationCueEvent, DeactivationReason, SoundCue, SoundCueEvent,
};
use crate::encounter::components::EncounterEntity;

/// Distance used for ground and wall probes
const PROBE_DISTANCE: f32 = 0.05;

/// Below this speed the body counts as standing still
const ANIMATION_SPEED_THRESHOLD: f32 = 0.05;

/// Shots spawn this far in front of the player
const MUZZLE_OFFSET: f32 = 1.0;

/// Named player animation states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerAnimation {
    #[default]
    Idle,
    Run,
    Jump,
    Fall,
}

/// What a motion step changed, for cues.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionReport {
    pub jumped: bool,
    pub animation: Option<PlayerAnimation>,
    pub facing_left: Option<bool>,
}

/// Kinematic state of the player character.
#[derive(Component, Debug, Clone)]
pub struct PlayerBody {
    pub velocity: Vec2,
    /// 1.0 falls down, -1.0 falls up
    pub gravity_sign: f32,
    pub grounded: bool,
    pub remaining_jumps: u32,
    pub facing_left: bool,
    pub time_slowed: bool,
    /// Velocity captured when time stopped, restored when it resumes
    saved_velocity: Option<Vec2>,
    shoot_cooldown: f32,
    animation: PlayerAnimation,
}

impl PlayerBody {
    pub fn new(max_jumps: u32) -> Self {
        Self {
            velocity: Vec2::ZERO,
            gravity_sign: 1.0,
            grounded: false,
            remaining_jumps: max_jumps,
            facing_left: false,
            time_slowed: false,
            saved_velocity: None,
            shoot_cooldown: 0.0,
            animation: PlayerAnimation::Idle,
        }
    }

    pub fn animation(&self) -> PlayerAnimation {
        self.animation
    }

    pub fn is_time_stopped(&self) -> bool {
        self.saved_velocity.is_some()
    }

    pub fn is_gravity_inverted(&self) -> bool {
        self.gravity_sign < 0.0
    }

    /// Direction shots leave the muzzle.
    pub fn aim(&self) -> Vec2 {
        if self.facing_left {
            Vec2::NEG_X
        } else {
            Vec2::X
        }
    }

    fn ground_offset(&self) -> Vec2 {
        Vec2::new(0.0, -self.gravity_sign * PROBE_DISTANCE)
    }

    fn probe_ground(&mut self, position: Vec2, tunables: &PlayerTunables, world: &impl CollisionWorld) {
        self.grounded = world.would_collide(position, self.ground_offset(), tunables.body_half_size);
        if self.grounded {
            self.remaining_jumps = tunables.max_jumps;
            // Velocity pointing into the ground is absorbed
            if self.velocity.y * self.gravity_sign < 0.0 {
                self.velocity.y = 0.0;
            }
        }
    }

    /// Advance the body one frame and return its new position.
    pub fn step(
        &mut self,
        position: Vec2,
        input: &PlayerInput,
        control_locked: bool,
        clock: &FrameClock,
        tunables: &PlayerTunables,
        world: &impl CollisionWorld,
    ) -> (Vec2, MotionReport) {
        let dt = clock.unscaled;
        let mut report = MotionReport::default();
        self.probe_ground(position, tunables, world);

        if !control_locked {
            let target = input.move_axis.clamp(-1.0, 1.0) * tunables.max_move_speed;
            let moving = input.move_axis != 0.0;
            let rate = match (self.grounded, moving) {
                (true, true) => tunables.ground_acceleration,
                (true, false) => tunables.ground_deceleration,
                (false, true) => tunables.air_acceleration,
                (false, false) => tunables.air_deceleration,
            };
            self.velocity.x = move_towards_f32(self.velocity.x, target, rate * dt);

            let facing_left = if input.move_axis < 0.0 {
                true
            } else if input.move_axis > 0.0 {
                false
            } else {
                self.facing_left
            };
            if facing_left != self.facing_left {
                self.facing_left = facing_left;
                report.facing_left = Some(facing_left);
            }

            if input.jump_pressed && self.remaining_jumps > 0 {
                self.velocity.y = self.gravity_sign * tunables.jump_velocity();
                self.remaining_jumps -= 1;
                self.grounded = false;
                report.jumped = true;
            }
        }

        // Short hop: letting go while rising cuts the jump
        if input.jump_released && self.velocity.y * self.gravity_sign > 0.0 {
            self.velocity.y *= tunables.jump_release_factor;
        }

        if self.velocity.x != 0.0 {
            let wall_probe = Vec2::new(self.velocity.x.signum() * PROBE_DISTANCE, 0.0);
            if world.would_collide(position, wall_probe, tunables.body_half_size) {
                self.velocity.x = 0.0;
            }
        }

        if !self.grounded {
            let gravity_dt = dt * clock.scale;
            self.velocity.y -= self.gravity_sign * tunables.gravity() * gravity_dt;
        }

        let unclamped = position + self.velocity * dt;
        let next = world.clamp_inside(unclamped, tunables.body_half_size);
        if next.y != unclamped.y {
            self.velocity.y = 0.0;
        }
        if next.x != unclamped.x {
            self.velocity.x = 0.0;
        }

        self.probe_ground(next, tunables, world);

        let animation = self.pick_animation();
        if animation != self.animation {
            self.animation = animation;
            report.animation = Some(animation);
        }

        (next, report)
    }

    fn pick_animation(&self) -> PlayerAnimation {
        if self.grounded {
            if self.velocity.x.abs() > ANIMATION_SPEED_THRESHOLD {
                PlayerAnimation::Run
            } else {
                PlayerAnimation::Idle
            }
        } else if self.velocity.y * self.gravity_sign > ANIMATION_SPEED_THRESHOLD {
            PlayerAnimation::Jump
        } else {
            PlayerAnimation::Fall
        }
    }

    /// Count down the gun and fire if asked. Runs on unscaled time.
    pub fn try_shoot(&mut self, wants_to_shoot: bool, unscaled_dt: f32, cooldown: f32) -> bool {
        self.shoot_cooldown = (self.shoot_cooldown - unscaled_dt).max(0.0);
        if wants_to_shoot && self.shoot_cooldown <= 0.0 {
            self.shoot_cooldown = cooldown;
            true
        } else {
            false
        }
    }

    /// Apply the body-side effect of an ability turning on.
    pub fn on_ability_activated(&mut self, ability: AbilityType) {
        match ability {
            AbilityType::AntiGravity => {
                self.gravity_sign = -1.0;
                self.grounded = false;
            }
            AbilityType::TimeStop => {
                self.saved_velocity = Some(self.velocity);
            }
            AbilityType::TimeSlowDown => {
                self.time_slowed = true;
            }
        }
    }

    /// Undo the body-side effect of an ability turning off.
    pub fn on_ability_deactivated(&mut self, ability: AbilityType) {
        match ability {
            AbilityType::AntiGravity => {
                self.gravity_sign = 1.0;
                self.grounded = false;
            }
            AbilityType::TimeStop => {
                if let Some(saved) = self.saved_velocity.take() {
                    self.velocity = saved;
                }
            }
            AbilityType::TimeSlowDown => {
                self.time_slowed = false;
            }
        }
    }

    /// Knockback owns the position; momentum is dropped.
    pub fn follow_knockback(&mut self) {
        self.velocity = Vec2::ZERO;
    }
}

/// Move a scalar toward a target by at most `max_delta`.
pub fn move_towards_f32(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

// ============================================================================
// Systems
// ============================================================================

/// Handle unlock keys.
pub fn handle_unlock_input(
    input: Res<PlayerInput>,
    mut controller: ResMut<AbilityController>,
    mut unlocked_events: EventWriter<AbilityUnlockedEvent>,
) {
    let Some(ability) = input.unlock else {
        return;
    };
    if controller.unlock(ability) {
        unlocked_events.send(AbilityUnlockedEvent { ability });
    }
}

/// Turn ability keys into controller requests.
///
/// Anti gravity is a toggle and needs the player on the ground; the time
/// abilities only switch on and run out on their own.
pub fn handle_ability_input(
    input: Res<PlayerInput>,
    mut controller: ResMut<AbilityController>,
    mut authority: ResMut<TimeAuthority>,
    players: Query<(&PlayerBody, &CombatEntity), With<Player>>,
    mut activated_events: EventWriter<AbilityActivatedEvent>,
    mut deactivated_events: EventWriter<AbilityDeactivatedEvent>,
    mut rejected_events: EventWriter<AbilityRejectedEvent>,
) {
    let Some(ability) = input.requested_ability() else {
        return;
    };
    let Ok((body, combat)) = players.get_single() else {
        return;
    };
    if !combat.is_alive() {
        return;
    }

    let result = if controller.requires_grounded(ability) && !body.grounded {
        Err(ActivationRejection::RequiresGround)
    } else if ability == AbilityType::AntiGravity {
        controller.toggle(ability, &mut authority)
    } else {
        controller.try_activate(ability, &mut authority).map(|_| true)
    };

    match result {
        Ok(true) => {
            info!("{} activated", ability.name());
            activated_events.send(AbilityActivatedEvent { ability });
        }
        Ok(false) => {
            info!("{} toggled off", ability.name());
            deactivated_events.send(AbilityDeactivatedEvent {
                ability,
                reason: DeactivationReason::Toggled,
            });
        }
        Err(reason) => {
            debug!("{} rejected: {}", ability.name(), reason);
            rejected_events.send(AbilityRejectedEvent { ability, reason });
        }
    }

    controller.debug_validate(&authority);
}

/// Count ability timers down on unscaled time and end expired abilities.
pub fn tick_abilities(
    clock: Res<FrameClock>,
    mut controller: ResMut<AbilityController>,
    mut authority: ResMut<TimeAuthority>,
    mut deactivated_events: EventWriter<AbilityDeactivatedEvent>,
) {
    for ability in controller.tick(clock.unscaled, &mut authority) {
        info!("{} expired", ability.name());
        deactivated_events.send(AbilityDeactivatedEvent {
            ability,
            reason: DeactivationReason::Expired,
        });
    }
}

/// Apply ability side effects to the player body and emit their cues.
pub fn apply_ability_effects(
    mut activated_events: EventReader<AbilityActivatedEvent>,
    mut deactivated_events: EventReader<AbilityDeactivatedEvent>,
    mut players: Query<(Entity, &mut PlayerBody), With<Player>>,
    mut animation_events: EventWriter<AnimationCueEvent>,
    mut sound_events: EventWriter<SoundCueEvent>,
) {
    let Ok((entity, mut body)) = players.get_single_mut() else {
        activated_events.clear();
        deactivated_events.clear();
        return;
    };

    for event in activated_events.read() {
        body.on_ability_activated(event.ability);
        if event.ability == AbilityType::AntiGravity {
            animation_events.send(AnimationCueEvent {
                entity,
                cue: AnimationCue::GravityFlip(true),
            });
        }
        if event.ability.is_time_ability() {
            sound_events.send(SoundCueEvent {
                sound: SoundCue::Ability,
            });
        }
    }

    for event in deactivated_events.read() {
        body.on_ability_deactivated(event.ability);
        if event.ability == AbilityType::AntiGravity {
            animation_events.send(AnimationCueEvent {
                entity,
                cue: AnimationCue::GravityFlip(false),
            });
        }
    }
}

/// Integrate the player body, or follow an in-flight knockback.
pub fn move_player(
    clock: Res<FrameClock>,
    input: Res<PlayerInput>,
    tunables: Res<EncounterTunables>,
    stage: Res<Stage>,
    mut players: Query<(Entity, &mut Transform, &mut PlayerBody, &mut CombatEntity), With<Player>>,
    mut animation_events: EventWriter<AnimationCueEvent>,
    mut sound_events: EventWriter<SoundCueEvent>,
) {
    let player_tunables = &tunables.player;

    for (entity, mut transform, mut body, mut combat) in players.iter_mut() {
        if !combat.is_alive() {
            continue;
        }

        let position = transform.translation.truncate();

        if let Some(knockback) = combat.knockback().copied() {
            let pushed = stage.clamp_inside(knockback.position(), player_tunables.body_half_size);
            transform.translation.x = pushed.x;
            transform.translation.y = pushed.y;
            body.follow_knockback();
            combat.finish_knockback();
            continue;
        }

        let (next, report) = body.step(
            position,
            &input,
            combat.is_control_locked(),
            &clock,
            player_tunables,
            stage.as_ref(),
        );
        transform.translation.x = next.x;
        transform.translation.y = next.y;

        if report.jumped {
            sound_events.send(SoundCueEvent {
                sound: SoundCue::Jump,
            });
        }
        if let Some(animation) = report.animation {
            animation_events.send(AnimationCueEvent {
                entity,
                cue: AnimationCue::Player(animation),
            });
        }
        if let Some(facing_left) = report.facing_left {
            animation_events.send(AnimationCueEvent {
                entity,
                cue: AnimationCue::FacingLeft(facing_left),
            });
        }
    }
}

/// Fire the player's gun. Player shots ignore the time scale.
pub fn player_shoot(
    mut commands: Commands,
    clock: Res<FrameClock>,
    input: Res<PlayerInput>,
    tunables: Res<EncounterTunables>,
    mut players: Query<(&Transform, &mut PlayerBody, &CombatEntity), With<Player>>,
    mut sound_events: EventWriter<SoundCueEvent>,
) {
    let player_tunables = &tunables.player;

    for (transform, mut body, combat) in players.iter_mut() {
        let wants_to_shoot = input.shoot && combat.is_alive() && !combat.is_control_locked();
        if !body.try_shoot(wants_to_shoot, clock.unscaled, player_tunables.shoot_cooldown) {
            continue;
        }

        let direction = body.aim();
        let muzzle = transform.translation.truncate() + direction * MUZZLE_OFFSET;
        commands.spawn((
            Projectile {
                owner: Faction::Player,
                direction,
                speed: player_tunables.bullet_speed,
                damage: player_tunables.bullet_damage,
                knockback: 0.0,
                lifetime: player_tunables.bullet_lifetime,
                ignores_time_scale: true,
                radius: 0.2,
            },
            Transform::from_translation(muzzle.extend(0.0)),
            EncounterEntity,
        ));
        sound_events.send(SoundCueEvent {
            sound: SoundCue::Shoot,
        });
    }
}
