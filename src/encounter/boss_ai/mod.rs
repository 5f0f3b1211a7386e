//! Boss AI
//!
//! Layered phase state machine driving the boss. The AI is a plain component
//! ticked with the scaled delta; it reads the player's position and its own
//! health ratio and reports everything it wants to happen (new position,
//! projectiles, cues) in a [`BossTickOutput`]. The ECS glue in `systems`
//! applies that output.
//!
//! ## Phases
//!
//! ```text
//! Idle --(player in activation range, then delay)--> Normal
//! Normal --> RotationAttack | SpreadAttack | CrossAttack --> Normal
//! any --(health ratio < rage threshold)--> RageMode --(routine done)--> Normal
//! ```
//!
//! ## Per-tick order
//!
//! 1. Timers decrement
//! 2. Forced and triggered phase transitions
//! 3. Attack routine advance / dispatch
//! 4. Movement (escape, teleport, target selection)
//!
//! Because transitions run before dispatch, a forced rotation beats a routine
//! that would have completed on the same tick.

pub mod routines;
pub mod systems;

use bevy::prelude::*;
use smallvec::SmallVec;

use super::components::GameRng;
use super::constants::{ARRIVAL_EPSILON, RAGE_INTERVAL_MULTIPLIER, RAGE_SPEED_MULTIPLIER, TELEPORT_VOLLEY_DELAY};
use super::tunables::BossTunables;
use routines::*;

/// The boss's top-level behavior phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BossPhase {
    Idle,
    Normal,
    RotationAttack,
    SpreadAttack,
    RageMode,
    CrossAttack,
}

impl BossPhase {
    pub fn name(&self) -> &'static str {
        match self {
            BossPhase::Idle => "Idle",
            BossPhase::Normal => "Normal",
            BossPhase::RotationAttack => "Rotation Attack",
            BossPhase::SpreadAttack => "Spread Attack",
            BossPhase::RageMode => "Rage Mode",
            BossPhase::CrossAttack => "Cross Attack",
        }
    }
}

/// Animation states the boss asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossAnimation {
    Idle,
    Move,
    Attack,
    Hurt,
    Death,
}

/// Which branch a reposition took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositionChoice {
    /// A point near the player
    Chase,
    /// Anywhere in the arena
    Wander,
}

/// Read-only view of the world for one tick.
pub struct BossContext<'a> {
    /// Scaled delta time
    pub dt: f32,
    pub position: Vec2,
    pub player_position: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub rng: &'a mut GameRng,
}

impl BossContext<'_> {
    fn health_ratio(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    fn player_distance(&self) -> f32 {
        self.position.distance(self.player_position)
    }
}

/// Everything a tick wants applied to the world.
#[derive(Debug, Default)]
pub struct BossTickOutput {
    pub position: Vec2,
    pub facing_degrees: f32,
    /// Directions of projectiles to spawn at `position`
    pub shots: Shots,
    pub phase_changes: SmallVec<[(BossPhase, BossPhase); 2]>,
    pub animations: SmallVec<[BossAnimation; 2]>,
    /// (from, to) when the boss teleported this tick
    pub teleport: Option<(Vec2, Vec2)>,
    /// The boss finished waking up this tick
    pub activated: bool,
    /// The death delay ran out; the boss should be removed
    pub remove: bool,
}

/// What happened when the boss was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BossDamageReaction {
    pub hurt: bool,
    pub escape_started: bool,
    pub died: bool,
}

/// Countdown timers, all on scaled time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossTimers {
    pub attack: f32,
    pub rotation: f32,
    pub reposition: f32,
    pub teleport: f32,
    pub cross: f32,
}

impl BossTimers {
    fn new(tunables: &BossTunables) -> Self {
        Self {
            attack: tunables.attack_interval,
            rotation: tunables.rotation_attack_interval,
            reposition: tunables.reposition_interval,
            teleport: tunables.teleport_cooldown,
            cross: tunables.cross_attack_interval,
        }
    }

    fn tick(&mut self, dt: f32) {
        self.attack = (self.attack - dt).max(0.0);
        self.rotation = (self.rotation - dt).max(0.0);
        self.reposition = (self.reposition - dt).max(0.0);
        self.teleport = (self.teleport - dt).max(0.0);
        self.cross = (self.cross - dt).max(0.0);
    }
}

/// Boss brain. Lives on the boss entity next to its `CombatEntity`.
#[derive(Component, Debug, Clone)]
pub struct BossAi {
    pub tunables: BossTunables,
    phase: BossPhase,
    activated: bool,
    /// Remaining wake-up delay once the player has been spotted
    activation_delay: Option<f32>,
    pub timers: BossTimers,
    /// Arena center, fixed at spawn
    center: Vec2,
    target: Vec2,
    pub move_speed: f32,
    pub attack_interval: f32,
    routine: Option<AttackRoutine>,
    escape: Option<EscapeRoutine>,
    pending_fan: Option<PendingFan>,
    facing_degrees: f32,
    was_moving: bool,
    /// Health at the last spread trigger
    last_spread_health: f32,
    dead: bool,
    death_timer: f32,
    removed: bool,
}

impl BossAi {
    pub fn new(tunables: BossTunables, spawn: Vec2) -> Self {
        Self {
            phase: BossPhase::Idle,
            activated: false,
            activation_delay: None,
            timers: BossTimers::new(&tunables),
            center: spawn,
            target: spawn,
            move_speed: tunables.move_speed,
            attack_interval: tunables.attack_interval,
            routine: None,
            escape: None,
            pending_fan: None,
            facing_degrees: 0.0,
            was_moving: false,
            last_spread_health: tunables.max_health,
            dead: false,
            death_timer: 0.0,
            removed: false,
            tunables,
        }
    }

    pub fn phase(&self) -> BossPhase {
        self.phase
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_escaping(&self) -> bool {
        self.escape.is_some()
    }

    pub fn routine(&self) -> Option<&AttackRoutine> {
        self.routine.as_ref()
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Keep a point inside the boss's arena rectangle.
    pub fn clamp_to_arena(&self, point: Vec2) -> Vec2 {
        let half = Vec2::new(self.tunables.arena_width, self.tunables.arena_height) / 2.0;
        point.clamp(self.center - half, self.center + half)
    }

    /// Advance the AI by one tick.
    pub fn tick(&mut self, ctx: &mut BossContext) -> BossTickOutput {
        let mut out = BossTickOutput {
            position: ctx.position,
            facing_degrees: self.facing_degrees,
            ..default()
        };

        if self.dead {
            self.tick_death(ctx.dt, &mut out);
            return out;
        }

        if !self.activated {
            self.tick_activation(ctx, &mut out);
            if !self.activated {
                return out;
            }
        }

        // 1. Timers
        self.timers.tick(ctx.dt);

        // 2. Transitions
        self.update_phase(ctx, &mut out);

        // 3. Attacks
        self.update_attacks(ctx, &mut out);

        // 4. Movement
        self.update_movement(ctx, &mut out);

        out.facing_degrees = self.facing_degrees;
        out
    }

    fn tick_activation(&mut self, ctx: &BossContext, out: &mut BossTickOutput) {
        match self.activation_delay {
            None => {
                if ctx.player_distance() <= self.tunables.activation_range {
                    info!("Boss spotted the player");
                    self.activation_delay = Some(self.tunables.activation_delay);
                }
            }
            Some(remaining) => {
                let remaining = remaining - ctx.dt;
                if remaining <= 0.0 {
                    self.activation_delay = None;
                    self.activated = true;
                    out.activated = true;
                    self.set_phase(BossPhase::Normal, out);
                } else {
                    self.activation_delay = Some(remaining);
                }
            }
        }
    }

    fn set_phase(&mut self, phase: BossPhase, out: &mut BossTickOutput) {
        if self.phase != phase {
            out.phase_changes.push((self.phase, phase));
            self.phase = phase;
        }
    }

    /// Drop the routine in flight, undoing any stat changes it made.
    fn cancel_routine(&mut self) {
        if let Some(AttackRoutine::Rage { saved, .. }) = self.routine.take() {
            self.move_speed = saved.move_speed;
            self.attack_interval = saved.attack_interval;
        }
        self.facing_degrees = 0.0;
    }

    fn update_phase(&mut self, ctx: &mut BossContext, out: &mut BossTickOutput) {
        // Healing above the last trigger point moves it up
        self.last_spread_health = self.last_spread_health.max(ctx.health);

        if self.timers.rotation <= 0.0 {
            self.timers.rotation = self.tunables.rotation_attack_interval;
            if self.phase != BossPhase::RageMode {
                self.cancel_routine();
                self.timers.reposition = self.tunables.reposition_interval;
                self.set_phase(BossPhase::RotationAttack, out);
            }
        }

        if ctx.health_ratio() < self.tunables.rage_threshold && self.phase != BossPhase::RageMode {
            self.cancel_routine();
            self.set_phase(BossPhase::RageMode, out);
        }

        let cross_due = self.timers.cross <= 0.0;
        if cross_due {
            self.timers.cross = self.tunables.cross_attack_interval;
        }

        if self.phase == BossPhase::Normal {
            if self.last_spread_health - ctx.health >= self.tunables.spread_health_step {
                self.last_spread_health = ctx.health;
                self.set_phase(BossPhase::SpreadAttack, out);
            } else if cross_due {
                self.set_phase(BossPhase::CrossAttack, out);
            }
        }
    }

    fn start_routine(&mut self, ctx: &mut BossContext) -> Option<AttackRoutine> {
        match self.phase {
            BossPhase::RotationAttack => Some(AttackRoutine::Rotation(RotationRoutine::new(
                ctx.rng.coin_flip(),
            ))),
            BossPhase::SpreadAttack => Some(AttackRoutine::Spread(ScriptedRoutine::spread(
                self.tunables.spread_windup,
            ))),
            BossPhase::CrossAttack => Some(AttackRoutine::Cross(ScriptedRoutine::cross())),
            BossPhase::RageMode => {
                let saved = SavedStats {
                    move_speed: self.move_speed,
                    attack_interval: self.attack_interval,
                };
                self.move_speed *= RAGE_SPEED_MULTIPLIER;
                self.attack_interval *= RAGE_INTERVAL_MULTIPLIER;
                info!(
                    "Boss enraged: speed {:.1} -> {:.1}, interval {:.2} -> {:.2}",
                    saved.move_speed, self.move_speed, saved.attack_interval, self.attack_interval
                );
                Some(AttackRoutine::Rage {
                    script: ScriptedRoutine::rage(),
                    saved,
                })
            }
            BossPhase::Idle | BossPhase::Normal => None,
        }
    }

    fn update_attacks(&mut self, ctx: &mut BossContext, out: &mut BossTickOutput) {
        if let Some(fan) = self.pending_fan.as_mut() {
            fan.delay -= ctx.dt;
            if fan.delay <= 0.0 {
                self.pending_fan = None;
                out.shots.extend(fan_toward(ctx.player_position - ctx.position));
                out.animations.push(BossAnimation::Attack);
            }
        }

        let in_range = ctx.player_distance() <= self.tunables.attack_range;

        if self.routine.is_none() && in_range && !self.is_escaping() {
            if self.phase == BossPhase::Normal {
                if self.timers.attack <= 0.0 {
                    let aim = (ctx.player_position - ctx.position).normalize_or_zero();
                    if aim != Vec2::ZERO {
                        out.shots.push(aim);
                        out.animations.push(BossAnimation::Attack);
                    }
                    self.timers.attack = self.attack_interval;
                }
            } else {
                self.routine = self.start_routine(ctx);
            }
        }

        let Some(routine) = self.routine.as_mut() else {
            return;
        };

        let tick = routine.advance(ctx.dt);
        out.shots.extend(tick.shots);
        if tick.attack_cue {
            out.animations.push(BossAnimation::Attack);
        }
        if let Some(facing) = tick.facing_degrees {
            self.facing_degrees = facing;
        }

        if tick.finished {
            if let Some(AttackRoutine::Rage { saved, .. }) = self.routine.take() {
                self.move_speed = saved.move_speed;
                self.attack_interval = saved.attack_interval;
            }
            self.facing_degrees = 0.0;
            self.set_phase(BossPhase::Normal, out);
        }
    }

    /// Pick the next movement target and report which branch was taken.
    pub fn pick_reposition_target(
        &self,
        player_position: Vec2,
        rng: &mut GameRng,
    ) -> (RepositionChoice, Vec2) {
        if rng.chance(self.tunables.chase_player_chance) {
            let offset = rng.inside_unit_circle() * self.tunables.attack_range;
            (RepositionChoice::Chase, self.clamp_to_arena(player_position + offset))
        } else {
            let half_w = self.tunables.arena_width / 2.0;
            let half_h = self.tunables.arena_height / 2.0;
            let point = Vec2::new(
                rng.random_range(self.center.x - half_w, self.center.x + half_w),
                rng.random_range(self.center.y - half_h, self.center.y + half_h),
            );
            (RepositionChoice::Wander, self.clamp_to_arena(point))
        }
    }

    fn update_movement(&mut self, ctx: &mut BossContext, out: &mut BossTickOutput) {
        if let Some(escape) = self.escape {
            let step = escape.direction * self.tunables.escape_speed * ctx.dt;
            out.position = self.clamp_to_arena(ctx.position + step);
            let remaining = escape.remaining - ctx.dt;
            self.escape = (remaining > 0.0).then_some(EscapeRoutine {
                remaining,
                ..escape
            });
            return;
        }

        if self.phase == BossPhase::Normal
            && self.timers.teleport <= 0.0
            && ctx.rng.chance(self.tunables.teleport_chance)
        {
            let destination = self.clamp_to_arena(
                ctx.position + ctx.rng.unit_direction() * self.tunables.teleport_range,
            );
            out.teleport = Some((ctx.position, destination));
            out.position = destination;
            self.target = destination;
            self.timers.teleport = self.tunables.teleport_cooldown;
            self.pending_fan = Some(PendingFan {
                delay: TELEPORT_VOLLEY_DELAY,
            });
            return;
        }

        match self.phase {
            BossPhase::SpreadAttack | BossPhase::RotationAttack => {
                self.target = self.center;
            }
            BossPhase::Normal if self.timers.reposition <= 0.0 => {
                let (_, target) = self.pick_reposition_target(ctx.player_position, ctx.rng);
                self.target = target;
                self.timers.reposition = self.tunables.reposition_interval;
            }
            _ => {}
        }

        self.target = self.clamp_to_arena(self.target);
        let next = move_towards(ctx.position, self.target, self.move_speed * ctx.dt);
        out.position = next;

        let moving = next.distance(self.target) > ARRIVAL_EPSILON;
        if moving != self.was_moving {
            out.animations.push(if moving {
                BossAnimation::Move
            } else {
                BossAnimation::Idle
            });
            self.was_moving = moving;
        }
    }

    /// React to a hit that has already been applied to the boss's health.
    pub fn on_damaged(
        &mut self,
        position: Vec2,
        player_position: Vec2,
        died: bool,
        rng: &mut GameRng,
    ) -> BossDamageReaction {
        let mut reaction = BossDamageReaction::default();
        if self.dead {
            return reaction;
        }

        if died {
            self.dead = true;
            self.death_timer = self.tunables.death_delay;
            self.cancel_routine();
            self.escape = None;
            self.pending_fan = None;
            reaction.died = true;
            return reaction;
        }

        reaction.hurt = true;
        if self.escape.is_none() && rng.chance(self.tunables.escape_chance) {
            let away = (position - player_position).normalize_or_zero();
            let direction = if away == Vec2::ZERO {
                rng.unit_direction()
            } else {
                away
            };
            self.escape = Some(EscapeRoutine {
                direction,
                remaining: self.tunables.escape_duration,
            });
            reaction.escape_started = true;
        }
        reaction
    }

    fn tick_death(&mut self, dt: f32, out: &mut BossTickOutput) {
        if self.removed {
            return;
        }
        self.death_timer -= dt;
        if self.death_timer <= 0.0 {
            self.removed = true;
            out.remove = true;
        }
    }

    /// Validates AI invariants (debug builds only).
    pub fn debug_validate(&self) {
        debug_assert!(
            self.move_speed > 0.0 && self.attack_interval > 0.0,
            "Boss stats must stay positive"
        );
        debug_assert!(
            !matches!(self.routine, Some(AttackRoutine::Rage { .. }))
                || self.phase == BossPhase::RageMode,
            "Rage routine running outside rage phase"
        );
        debug_assert!(
            self.activated || self.phase == BossPhase::Idle,
            "Dormant boss left Idle"
        );
    }
}

/// Move `from` toward `to` by at most `max_step`.
pub fn move_towards(from: Vec2, to: Vec2, max_step: f32) -> Vec2 {
    let delta = to - from;
    let distance = delta.length();
    if distance <= max_step || distance <= f32::EPSILON {
        to
    } else {
        from + delta / distance * max_step
    }
}
