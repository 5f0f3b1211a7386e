//! Shared Components and Resources
//!
//! Markers and small resources used by more than one encounter module.
//! The larger per-entity state lives next to the logic that owns it
//! (`CombatEntity` in `combat_model`, `BossAi` in `boss_ai`, `PlayerBody`
//! in `player`).

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::f32::consts::TAU;

// ============================================================================
// Resources
// ============================================================================

/// Seeded random number generator for deterministic encounter simulation.
///
/// When a seed is provided (e.g., via headless config), the same seed and the
/// same inputs always produce the same encounter. Without a seed, uses system
/// entropy.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Generate a random f32 in the range [0.0, 1.0)
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Generate a random f32 in the given range
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.random_f32() * (max - min)
    }

    /// Returns true with probability `p`
    pub fn chance(&mut self, p: f32) -> bool {
        self.random_f32() < p
    }

    pub fn coin_flip(&mut self) -> bool {
        self.rng.gen()
    }

    /// Uniformly distributed direction of length 1
    pub fn unit_direction(&mut self) -> Vec2 {
        Vec2::from_angle(self.random_f32() * TAU)
    }

    /// Uniformly distributed point inside the unit disc
    pub fn inside_unit_circle(&mut self) -> Vec2 {
        let radius = self.random_f32().sqrt();
        self.unit_direction() * radius
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

// ============================================================================
// Markers
// ============================================================================

/// The player-controlled character.
#[derive(Component, Debug, Default)]
pub struct Player;

/// The boss.
#[derive(Component, Debug, Default)]
pub struct Boss;

/// Anything spawned for an encounter; despawned on teardown.
#[derive(Component, Debug, Default)]
pub struct EncounterEntity;

/// Which team a projectile or hit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Faction {
    Player,
    Boss,
}

impl Faction {
    pub fn name(&self) -> &'static str {
        match self {
            Faction::Player => "Player",
            Faction::Boss => "Boss",
        }
    }
}
