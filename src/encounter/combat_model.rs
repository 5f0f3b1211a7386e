//! Combat Model
//!
//! Health, damage, knockback and invincibility shared by the player and the boss.
//!
//! A [`CombatEntity`] is configured per owner:
//! - the player rounds damage to whole hit points, gets a post-hit
//!   invincibility window with a blink cue, is knocked back and briefly
//!   loses control;
//! - the boss takes fractional damage and has none of the above.
//!
//! Every timer in this module runs on unscaled time, so a time stop never
//! stretches invincibility or freezes a knockback mid-flight.

use bevy::prelude::*;

/// How incoming damage is converted before being subtracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthRounding {
    /// Round to the nearest whole point, ties to even
    Whole,
    Fractional,
}

impl HealthRounding {
    fn apply(&self, amount: f32) -> f32 {
        match self {
            HealthRounding::Whole => amount.round_ties_even(),
            HealthRounding::Fractional => amount,
        }
    }
}

/// Shape of the displacement applied when knocked back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnockbackProfile {
    /// Scales the attacker's knockback force into a distance
    pub multiplier: f32,
    pub duration: f32,
    /// Added to the unit direction away from the attacker before renormalizing
    pub up_bias: f32,
}

/// Post-hit reactions an entity has. `None` fields mean the reaction is off.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HitReactions {
    pub invincibility: Option<f32>,
    pub blink_interval: f32,
    pub knockback: Option<KnockbackProfile>,
    pub control_lock: Option<f32>,
}

/// An in-flight knockback: eased displacement from `origin` over `duration`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knockback {
    pub origin: Vec2,
    pub displacement: Vec2,
    pub elapsed: f32,
    pub duration: f32,
}

impl Knockback {
    pub fn new(origin: Vec2, displacement: Vec2, duration: f32) -> Self {
        Self {
            origin,
            displacement,
            elapsed: 0.0,
            duration: duration.max(f32::EPSILON),
        }
    }

    pub fn progress(&self) -> f32 {
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    /// Quadratic ease-out of the linear progress.
    pub fn eased_progress(&self) -> f32 {
        let p = self.progress();
        1.0 - (1.0 - p) * (1.0 - p)
    }

    /// Where the knocked-back body should be right now.
    pub fn position(&self) -> Vec2 {
        self.origin + self.displacement * self.eased_progress()
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Post-hit invincibility window with a visibility blink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Invincibility {
    pub remaining: f32,
    pub blink_interval: f32,
    pub blink_timer: f32,
    /// Whether the sprite should currently be drawn
    pub visible: bool,
}

impl Invincibility {
    fn new(duration: f32, blink_interval: f32) -> Self {
        Self {
            remaining: duration,
            blink_interval,
            blink_timer: blink_interval,
            visible: false,
        }
    }
}

/// Result of [`CombatEntity::take_damage`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Dropped because the entity is invincible
    Invincible,
    /// Dropped because the entity is already dead
    AlreadyDead,
    Applied {
        /// Health actually removed (after rounding and clamping)
        amount: f32,
        /// True only on the hit that killed
        died: bool,
    },
}

impl DamageOutcome {
    pub fn applied_amount(&self) -> f32 {
        match self {
            DamageOutcome::Applied { amount, .. } => *amount,
            _ => 0.0,
        }
    }

    pub fn killed(&self) -> bool {
        matches!(self, DamageOutcome::Applied { died: true, .. })
    }
}

/// Per-frame changes reported by [`CombatEntity::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CombatTick {
    /// Visibility flipped this frame (blink cue)
    pub blink_toggled: bool,
    pub invincibility_ended: bool,
    pub knockback_ended: bool,
    pub control_restored: bool,
}

/// Health and hit reactions of one combatant.
#[derive(Component, Debug, Clone)]
pub struct CombatEntity {
    pub health: f32,
    pub max_health: f32,
    alive: bool,
    rounding: HealthRounding,
    reactions: HitReactions,
    invincibility: Option<Invincibility>,
    knockback: Option<Knockback>,
    control_lock: f32,
    pub damage_taken: f32,
    pub damage_dealt: f32,
    pub healing_received: f32,
}

impl CombatEntity {
    pub fn new(max_health: f32, rounding: HealthRounding, reactions: HitReactions) -> Self {
        Self {
            health: max_health,
            max_health,
            alive: max_health > 0.0,
            rounding,
            reactions,
            invincibility: None,
            knockback: None,
            control_lock: 0.0,
            damage_taken: 0.0,
            damage_dealt: 0.0,
            healing_received: 0.0,
        }
    }

    /// Configuration used for the player character.
    pub fn player(tunables: &super::tunables::PlayerTunables) -> Self {
        Self::new(
            tunables.max_health,
            HealthRounding::Whole,
            HitReactions {
                invincibility: Some(tunables.invincibility_duration),
                blink_interval: tunables.blink_interval,
                knockback: Some(KnockbackProfile {
                    multiplier: tunables.knockback_multiplier,
                    duration: tunables.knockback_duration,
                    up_bias: tunables.knockback_up_bias,
                }),
                control_lock: Some(tunables.control_lock_duration),
            },
        )
    }

    /// Configuration used for the boss.
    pub fn boss(tunables: &super::tunables::BossTunables) -> Self {
        Self::new(
            tunables.max_health,
            HealthRounding::Fractional,
            HitReactions::default(),
        )
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_invincible(&self) -> bool {
        self.invincibility.is_some()
    }

    pub fn invincibility(&self) -> Option<&Invincibility> {
        self.invincibility.as_ref()
    }

    pub fn knockback(&self) -> Option<&Knockback> {
        self.knockback.as_ref()
    }

    pub fn is_control_locked(&self) -> bool {
        self.control_lock > 0.0
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            self.health / self.max_health
        }
    }

    /// Apply a hit from `source_position` to an entity standing at `position`.
    ///
    /// Ignored while invincible or dead. Starts a knockback (replacing any in
    /// flight), the invincibility window and the control lock when the entity
    /// has those reactions. Death is reported exactly once.
    pub fn take_damage(
        &mut self,
        amount: f32,
        source_position: Vec2,
        position: Vec2,
        knockback_force: f32,
    ) -> DamageOutcome {
        if !self.alive {
            return DamageOutcome::AlreadyDead;
        }
        if self.is_invincible() {
            return DamageOutcome::Invincible;
        }

        let rounded = self.rounding.apply(amount.max(0.0));
        let before = self.health;
        self.health = (self.health - rounded).clamp(0.0, self.max_health);
        let applied = before - self.health;
        self.damage_taken += applied;

        if let Some(duration) = self.reactions.invincibility {
            if duration > 0.0 {
                self.invincibility = Some(Invincibility::new(duration, self.reactions.blink_interval));
            }
        }

        if let Some(profile) = self.reactions.knockback {
            let away = (position - source_position).normalize_or_zero();
            let direction = (away + Vec2::Y * profile.up_bias).normalize_or_zero();
            let distance = knockback_force.max(0.0) * profile.multiplier;
            self.knockback = Some(Knockback::new(position, direction * distance, profile.duration));
        }

        if let Some(lock) = self.reactions.control_lock {
            self.control_lock = self.control_lock.max(lock);
        }

        let died = self.health <= 0.0;
        if died {
            self.alive = false;
            self.invincibility = None;
        }

        self.debug_validate();
        DamageOutcome::Applied {
            amount: applied,
            died,
        }
    }

    /// Restore health, clamped to max. Returns the amount actually restored.
    ///
    /// Has no effect on the dead and does not touch invincibility.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !self.alive {
            return 0.0;
        }
        let before = self.health;
        let amount = self.rounding.apply(amount.max(0.0));
        self.health = (self.health + amount).clamp(0.0, self.max_health);
        let restored = self.health - before;
        self.healing_received += restored;
        restored
    }

    /// Advance reaction timers by `unscaled_dt`.
    pub fn tick(&mut self, unscaled_dt: f32) -> CombatTick {
        let dt = unscaled_dt.max(0.0);
        let mut report = CombatTick::default();

        if let Some(inv) = self.invincibility.as_mut() {
            inv.remaining -= dt;
            if inv.blink_interval > 0.0 {
                inv.blink_timer -= dt;
                while inv.blink_timer <= 0.0 {
                    inv.blink_timer += inv.blink_interval;
                    inv.visible = !inv.visible;
                    report.blink_toggled = !report.blink_toggled;
                }
            }
            if inv.remaining <= 0.0 {
                if !inv.visible {
                    report.blink_toggled = !report.blink_toggled;
                }
                self.invincibility = None;
                report.invincibility_ended = true;
            }
        }

        if let Some(knockback) = self.knockback.as_mut() {
            knockback.elapsed += dt;
        }

        if self.control_lock > 0.0 {
            self.control_lock = (self.control_lock - dt).max(0.0);
            report.control_restored = self.control_lock <= 0.0;
        }

        report
    }

    /// Take the finished knockback out of the entity, if it just completed.
    pub fn finish_knockback(&mut self) -> Option<Knockback> {
        if self.knockback.is_some_and(|k| k.is_finished()) {
            self.knockback.take()
        } else {
            None
        }
    }

    /// Cancel any knockback in flight.
    pub fn cancel_knockback(&mut self) {
        self.knockback = None;
    }

    /// Validates health invariants (debug builds only).
    pub fn debug_validate(&self) {
        debug_assert!(
            self.health >= 0.0,
            "Combat entity health cannot be negative: {}",
            self.health
        );
        debug_assert!(
            self.health <= self.max_health,
            "Combat entity health ({}) cannot exceed max_health ({})",
            self.health,
            self.max_health
        );
        debug_assert!(
            self.alive || self.health <= 0.0,
            "Dead combat entity still has {} health",
            self.health
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::tunables::{BossTunables, PlayerTunables};

    #[test]
    fn test_player_damage_is_rounded() {
        let mut player = CombatEntity::player(&PlayerTunables::default());
        let outcome = player.take_damage(0.6, Vec2::ZERO, Vec2::X, 0.0);
        assert_eq!(outcome.applied_amount(), 1.0);
        assert_eq!(player.health, 2.0);
    }

    #[test]
    fn test_rounding_ties_to_even() {
        let mut player = CombatEntity::player(&PlayerTunables::default());
        player.take_damage(2.5, Vec2::ZERO, Vec2::X, 0.0);
        assert_eq!(player.health, 1.0);

        let mut player = CombatEntity::player(&PlayerTunables::default());
        player.take_damage(0.5, Vec2::ZERO, Vec2::X, 0.0);
        assert_eq!(player.health, 3.0, "0.5 rounds to 0");
    }

    #[test]
    fn test_boss_damage_is_fractional() {
        let mut boss = CombatEntity::boss(&BossTunables::default());
        boss.take_damage(0.25, Vec2::ZERO, Vec2::X, 0.0);
        assert_eq!(boss.health, 49.75);
        assert!(!boss.is_invincible());
        assert!(boss.knockback().is_none());
    }

    #[test]
    fn test_invincibility_blocks_then_expires() {
        let mut player = CombatEntity::player(&PlayerTunables::default());
        player.take_damage(1.0, Vec2::ZERO, Vec2::X, 5.0);
        assert!(player.is_invincible());
        assert_eq!(
            player.take_damage(1.0, Vec2::ZERO, Vec2::X, 5.0),
            DamageOutcome::Invincible
        );

        let mut ended = false;
        for _ in 0..16 {
            ended |= player.tick(0.1).invincibility_ended;
        }
        assert!(ended);
        assert!(!player.is_invincible());
        assert!(matches!(
            player.take_damage(1.0, Vec2::ZERO, Vec2::X, 5.0),
            DamageOutcome::Applied { .. }
        ));
    }

    #[test]
    fn test_knockback_moves_away_with_upward_bias() {
        let mut player = CombatEntity::player(&PlayerTunables::default());
        player.take_damage(1.0, Vec2::new(-1.0, 0.0), Vec2::ZERO, 10.0);
        let knockback = *player.knockback().unwrap();
        assert!(knockback.displacement.x > 0.0);
        assert!(knockback.displacement.y > 0.0);
        assert!((knockback.displacement.length() - 25.0).abs() < 1e-3);

        player.tick(0.06);
        let halfway = player.knockback().unwrap().eased_progress();
        assert!((halfway - 0.75).abs() < 1e-3);

        player.tick(0.1);
        let finished = player.finish_knockback().unwrap();
        assert_eq!(finished.position(), knockback.origin + knockback.displacement);
        assert!(player.knockback().is_none());
    }

    #[test]
    fn test_heal_clamps_and_ignores_dead() {
        let mut player = CombatEntity::player(&PlayerTunables::default());
        player.take_damage(1.0, Vec2::ZERO, Vec2::X, 0.0);
        assert_eq!(player.heal(10.0), 1.0);
        assert_eq!(player.health, 3.0);
        assert!(player.is_invincible(), "healing does not cancel invincibility");

        let mut boss = CombatEntity::boss(&BossTunables::default());
        boss.take_damage(100.0, Vec2::ZERO, Vec2::X, 0.0);
        assert_eq!(boss.heal(10.0), 0.0);
    }

    #[test]
    fn test_control_lock_expires() {
        let mut player = CombatEntity::player(&PlayerTunables::default());
        player.take_damage(1.0, Vec2::ZERO, Vec2::X, 0.0);
        assert!(player.is_control_locked());
        player.tick(0.1);
        assert!(player.is_control_locked());
        let report = player.tick(0.15);
        assert!(report.control_restored);
        assert!(!player.is_control_locked());
    }
}
