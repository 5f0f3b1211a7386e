//! Integration tests for the boss brain
//!
//! These tests drive `BossAi` directly with a seeded RNG and verify that:
//! - Rage mode starts once health drops below the threshold
//! - Reposition targets favor the player at the configured rate
//! - Attacks stay silent while the player is out of range

use bevy::math::Vec2;
use chronoboss::encounter::boss_ai::{BossContext, RepositionChoice};
use chronoboss::encounter::tunables::BossTunables;
use chronoboss::encounter::{BossAi, BossPhase, GameRng};

/// Wake a boss at the origin with the player standing next to it
fn awake_boss(rng: &mut GameRng) -> BossAi {
    let mut boss = BossAi::new(BossTunables::default(), Vec2::ZERO);
    let mut ctx = BossContext {
        dt: 0.5,
        position: Vec2::ZERO,
        player_position: Vec2::new(4.0, 0.0),
        health: 50.0,
        max_health: 50.0,
        rng,
    };
    for _ in 0..4 {
        boss.tick(&mut ctx);
    }
    assert!(boss.is_activated());
    boss
}

#[test]
fn test_fifty_to_ten_health_enters_rage() {
    let mut rng = GameRng::from_seed(11);
    let mut boss = awake_boss(&mut rng);
    let mut ctx = BossContext {
        dt: 1.0 / 60.0,
        position: Vec2::ZERO,
        player_position: Vec2::new(4.0, 0.0),
        health: 10.0,
        max_health: 50.0,
        rng: &mut rng,
    };

    let out = boss.tick(&mut ctx);
    assert_eq!(boss.phase(), BossPhase::RageMode);
    assert!(out
        .phase_changes
        .iter()
        .any(|(_, to)| *to == BossPhase::RageMode));
    assert!(boss.move_speed > boss.tunables.move_speed);
    assert!(boss.attack_interval < boss.tunables.attack_interval);
}

#[test]
fn test_health_above_threshold_stays_out_of_rage() {
    let mut rng = GameRng::from_seed(12);
    let mut boss = awake_boss(&mut rng);
    let mut ctx = BossContext {
        dt: 1.0 / 60.0,
        position: Vec2::ZERO,
        player_position: Vec2::new(100.0, 0.0),
        health: 16.0,
        max_health: 50.0,
        rng: &mut rng,
    };
    for _ in 0..60 {
        ctx.position = boss.tick(&mut ctx).position;
        assert_ne!(boss.phase(), BossPhase::RageMode);
    }
}

#[test]
fn test_reposition_chases_player_about_seventy_percent() {
    let mut rng = GameRng::from_seed(2024);
    let boss = BossAi::new(BossTunables::default(), Vec2::ZERO);
    let player = Vec2::new(3.0, -2.0);

    let chases = (0..1000)
        .filter(|_| {
            let (choice, target) = boss.pick_reposition_target(player, &mut rng);
            assert_eq!(target, boss.clamp_to_arena(target));
            choice == RepositionChoice::Chase
        })
        .count();

    assert!(
        (650..=750).contains(&chases),
        "expected roughly 700 chases out of 1000, got {}",
        chases
    );
}

#[test]
fn test_no_shots_while_player_out_of_range() {
    let mut rng = GameRng::from_seed(13);
    let mut boss = awake_boss(&mut rng);
    let mut ctx = BossContext {
        dt: 1.0 / 60.0,
        position: Vec2::ZERO,
        player_position: Vec2::new(40.0, 0.0),
        health: 50.0,
        max_health: 50.0,
        rng: &mut rng,
    };
    // Long enough for several attack intervals, short of the rotation timer
    for _ in 0..(60 * 5) {
        let out = boss.tick(&mut ctx);
        assert!(out.shots.is_empty());
        ctx.position = out.position;
    }
}

#[test]
fn test_same_seed_gives_same_boss_path() {
    let run = |seed: u64| {
        let mut rng = GameRng::from_seed(seed);
        let mut boss = awake_boss(&mut rng);
        let mut ctx = BossContext {
            dt: 1.0 / 60.0,
            position: Vec2::ZERO,
            player_position: Vec2::new(4.0, 0.0),
            health: 50.0,
            max_health: 50.0,
            rng: &mut rng,
        };
        let mut path = Vec::new();
        for _ in 0..600 {
            let out = boss.tick(&mut ctx);
            ctx.position = out.position;
            path.push((out.position, out.shots.len()));
        }
        path
    };
    assert_eq!(run(99), run(99));
}

#[test]
fn test_escape_suppresses_attacks_and_moves_away() {
    let mut rng = GameRng::from_seed(14);
    let mut boss = awake_boss(&mut rng);
    boss.tunables.escape_chance = 1.0;
    boss.timers.attack = 0.0;

    let player = Vec2::new(4.0, 0.0);
    let reaction = boss.on_damaged(Vec2::ZERO, player, false, &mut rng);
    assert!(reaction.hurt);
    assert!(reaction.escape_started);
    assert!(boss.is_escaping());

    let mut ctx = BossContext {
        dt: 1.0 / 60.0,
        position: Vec2::ZERO,
        player_position: player,
        health: 49.0,
        max_health: 50.0,
        rng: &mut rng,
    };
    for _ in 0..30 {
        let out = boss.tick(&mut ctx);
        assert!(out.shots.is_empty(), "no attacks while escaping");
        ctx.position = out.position;
    }
    assert!(ctx.position.x < 0.0, "escape heads away from the player");
}

#[test]
fn test_teleport_stays_in_arena() {
    let mut rng = GameRng::from_seed(15);
    let mut boss = awake_boss(&mut rng);
    boss.tunables.teleport_chance = 1.0;
    boss.tunables.teleport_range = 100.0;
    boss.timers.teleport = 0.0;

    let mut ctx = BossContext {
        dt: 1.0 / 60.0,
        position: Vec2::ZERO,
        player_position: Vec2::new(4.0, 0.0),
        health: 50.0,
        max_health: 50.0,
        rng: &mut rng,
    };
    let out = boss.tick(&mut ctx);
    let (from, to) = out.teleport.expect("teleport should trigger");
    assert_eq!(from, Vec2::ZERO);
    assert_eq!(out.position, to);
    assert!(to.x.abs() <= boss.tunables.arena_width / 2.0 + 1e-4);
    assert!(to.y.abs() <= boss.tunables.arena_height / 2.0 + 1e-4);
    assert_eq!(boss.timers.teleport, boss.tunables.teleport_cooldown);
}
