//! Integration tests for the shared combat model
//!
//! These tests verify that:
//! - Health is clamped and death is reported exactly once
//! - Invincibility blocks damage until it runs out
//! - A new hit replaces the knockback in flight

use bevy::math::Vec2;
use chronoboss::encounter::tunables::{BossTunables, PlayerTunables};
use chronoboss::encounter::{CombatEntity, DamageOutcome};

#[test]
fn test_overkill_clamps_to_zero_and_dies_once() {
    let mut player = CombatEntity::player(&PlayerTunables::default());
    assert_eq!(player.health, 3.0);

    let outcome = player.take_damage(100.0, Vec2::new(-1.0, 0.0), Vec2::ZERO, 5.0);
    assert_eq!(
        outcome,
        DamageOutcome::Applied {
            amount: 3.0,
            died: true
        }
    );
    assert_eq!(player.health, 0.0);
    assert!(!player.is_alive());
    assert_eq!(player.damage_taken, 3.0);

    let again = player.take_damage(1.0, Vec2::new(-1.0, 0.0), Vec2::ZERO, 5.0);
    assert_eq!(again, DamageOutcome::AlreadyDead);
    assert_eq!(player.heal(2.0), 0.0, "the dead cannot be healed");
}

#[test]
fn test_invincibility_blocks_until_expired() {
    let tunables = PlayerTunables::default();
    let mut player = CombatEntity::player(&tunables);

    assert!(!player.take_damage(1.0, Vec2::X, Vec2::ZERO, 0.0).killed());
    assert!(player.is_invincible());
    assert_eq!(
        player.take_damage(1.0, Vec2::X, Vec2::ZERO, 0.0),
        DamageOutcome::Invincible
    );
    assert_eq!(player.health, 2.0);

    // Tick past the window in 50 ms steps
    let steps = (tunables.invincibility_duration / 0.05).ceil() as usize + 1;
    for _ in 0..steps {
        player.tick(0.05);
    }
    assert!(!player.is_invincible());
    assert!(player.take_damage(1.0, Vec2::X, Vec2::ZERO, 0.0).applied_amount() > 0.0);
    assert_eq!(player.health, 1.0);
}

#[test]
fn test_player_damage_rounds_to_whole_points() {
    let mut player = CombatEntity::player(&PlayerTunables::default());
    player.take_damage(0.5, Vec2::X, Vec2::ZERO, 0.0);
    assert_eq!(player.health, 3.0, "0.5 rounds to even (0)");
}

#[test]
fn test_boss_takes_fractional_damage_without_reactions() {
    let mut boss = CombatEntity::boss(&BossTunables::default());
    boss.take_damage(0.5, Vec2::ZERO, Vec2::X, 10.0);
    boss.take_damage(0.5, Vec2::ZERO, Vec2::X, 10.0);
    assert_eq!(boss.health, 49.0);
    assert!(!boss.is_invincible());
    assert!(boss.knockback().is_none());
}

#[test]
fn test_heal_is_clamped_to_max() {
    let mut player = CombatEntity::player(&PlayerTunables::default());
    player.take_damage(2.0, Vec2::X, Vec2::ZERO, 0.0);
    assert_eq!(player.heal(5.0), 2.0);
    assert_eq!(player.health, player.max_health);
    assert_eq!(player.healing_received, 2.0);
}

#[test]
fn test_knockback_pushes_away_and_is_replaced() {
    let tunables = PlayerTunables {
        invincibility_duration: 0.0,
        ..PlayerTunables::default()
    };
    let mut player = CombatEntity::player(&tunables);

    player.take_damage(1.0, Vec2::new(-2.0, 0.0), Vec2::ZERO, 4.0);
    let first = *player.knockback().expect("hit starts a knockback");
    assert!(first.displacement.x > 0.0, "pushed away from a source on the left");

    player.tick(tunables.knockback_duration / 2.0);
    let mid = player.knockback().unwrap().position();
    player.take_damage(1.0, mid + Vec2::new(2.0, 0.0), mid, 4.0);
    let second = *player.knockback().unwrap();
    assert_eq!(second.origin, mid);
    assert!(second.displacement.x < 0.0, "new hit from the right pushes left");
    assert_eq!(second.elapsed, 0.0);
}

#[test]
fn test_control_lock_lifts_after_duration() {
    let tunables = PlayerTunables::default();
    let mut player = CombatEntity::player(&tunables);
    player.take_damage(1.0, Vec2::X, Vec2::ZERO, 1.0);
    assert!(player.is_control_locked());

    let mut restored = false;
    for _ in 0..100 {
        restored |= player.tick(0.01).control_restored;
    }
    assert!(restored);
    assert!(!player.is_control_locked());
}
