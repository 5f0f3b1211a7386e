//! Encounter Tunables
//!
//! Flat, versioned records for every number a designer is expected to tweak:
//! player movement and combat, boss behavior, and the stage rectangle.
//! Loaded once at session start from `assets/config/encounter.ron`.
//!
//! Every field has a compiled default, so a config file only needs to list
//! the values it changes. `schema_version` must match [`TUNABLES_SCHEMA_VERSION`].

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Default location of the encounter tunables file.
pub const ENCOUNTER_CONFIG_PATH: &str = "assets/config/encounter.ron";

/// Bump when a field changes meaning.
pub const TUNABLES_SCHEMA_VERSION: u32 = 1;

/// Player movement and combat numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTunables {
    pub max_health: f32,
    /// Horizontal speed cap
    pub max_move_speed: f32,
    pub ground_acceleration: f32,
    pub ground_deceleration: f32,
    pub air_acceleration: f32,
    pub air_deceleration: f32,
    /// Apex height of a full jump
    pub jump_height: f32,
    /// Seconds from takeoff to apex
    pub jump_time_to_apex: f32,
    pub max_jumps: u32,
    /// Upward velocity kept when jump is released early
    pub jump_release_factor: f32,
    /// Half extent of the player's square collider
    pub body_half_size: f32,
    pub invincibility_duration: f32,
    pub blink_interval: f32,
    /// Applied to every knockback force the player receives
    pub knockback_multiplier: f32,
    pub knockback_duration: f32,
    pub knockback_up_bias: f32,
    /// Input is ignored for this long after a hit
    pub control_lock_duration: f32,
    pub shoot_cooldown: f32,
    pub bullet_speed: f32,
    pub bullet_damage: f32,
    pub bullet_lifetime: f32,
}

impl Default for PlayerTunables {
    fn default() -> Self {
        Self {
            max_health: 3.0,
            max_move_speed: 9.0,
            ground_acceleration: 75.0,
            ground_deceleration: 70.0,
            air_acceleration: 20.0,
            air_deceleration: 10.0,
            jump_height: 3.0,
            jump_time_to_apex: 0.4,
            max_jumps: 2,
            jump_release_factor: 0.5,
            body_half_size: 0.5,
            invincibility_duration: 1.5,
            blink_interval: 0.1,
            knockback_multiplier: 2.5,
            knockback_duration: 0.12,
            knockback_up_bias: 0.2,
            control_lock_duration: 0.2,
            shoot_cooldown: 0.2,
            bullet_speed: 15.0,
            bullet_damage: 1.0,
            bullet_lifetime: 2.0,
        }
    }
}

impl PlayerTunables {
    /// Gravity magnitude that produces `jump_height` at `jump_time_to_apex`.
    pub fn gravity(&self) -> f32 {
        2.0 * self.jump_height / (self.jump_time_to_apex * self.jump_time_to_apex)
    }

    /// Initial vertical speed of a jump.
    pub fn jump_velocity(&self) -> f32 {
        2.0 * self.jump_height / self.jump_time_to_apex
    }
}

/// Boss behavior numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTunables {
    pub max_health: f32,
    pub move_speed: f32,
    /// Seconds between aimed shots in Normal phase
    pub attack_interval: f32,
    /// Player must be this close for the boss to fire
    pub attack_range: f32,
    pub rotation_attack_interval: f32,
    pub cross_attack_interval: f32,
    /// Health lost since the last spread that triggers the next one
    pub spread_health_step: f32,
    /// Wind-up before the first spread ring
    pub spread_windup: f32,
    /// Health ratio under which rage mode starts
    pub rage_threshold: f32,
    pub arena_width: f32,
    pub arena_height: f32,
    pub reposition_interval: f32,
    /// Probability of picking a point near the player when repositioning
    pub chase_player_chance: f32,
    pub contact_damage: f32,
    pub contact_knockback: f32,
    /// Radius used for both contact damage and being hit by projectiles
    pub body_radius: f32,
    pub bullet_speed: f32,
    pub bullet_lifetime: f32,
    pub bullet_damage: f32,
    pub bullet_knockback: f32,
    pub teleport_cooldown: f32,
    pub teleport_range: f32,
    pub teleport_chance: f32,
    pub escape_speed: f32,
    pub escape_duration: f32,
    pub escape_chance: f32,
    /// Player distance that wakes the boss
    pub activation_range: f32,
    pub activation_delay: f32,
    /// Seconds between death and removal
    pub death_delay: f32,
}

impl Default for BossTunables {
    fn default() -> Self {
        Self {
            max_health: 50.0,
            move_speed: 6.0,
            attack_interval: 1.5,
            attack_range: 12.0,
            rotation_attack_interval: 15.0,
            cross_attack_interval: 11.0,
            spread_health_step: 4.0,
            spread_windup: 0.5,
            rage_threshold: 0.3,
            arena_width: 15.0,
            arena_height: 12.0,
            reposition_interval: 4.0,
            chase_player_chance: 0.7,
            contact_damage: 1.0,
            contact_knockback: 10.0,
            body_radius: 1.0,
            bullet_speed: 12.0,
            bullet_lifetime: 4.0,
            bullet_damage: 2.0,
            bullet_knockback: 5.0,
            teleport_cooldown: 8.0,
            teleport_range: 8.0,
            teleport_chance: 0.3,
            escape_speed: 10.0,
            escape_duration: 1.5,
            escape_chance: 0.4,
            activation_range: 15.0,
            activation_delay: 1.0,
            death_delay: 1.0,
        }
    }
}

/// The playable rectangle, centered on the world origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTunables {
    pub half_width: f32,
    pub half_height: f32,
    pub player_spawn: (f32, f32),
    pub boss_spawn: (f32, f32),
}

impl Default for StageTunables {
    fn default() -> Self {
        Self {
            half_width: 9.0,
            half_height: 6.5,
            player_spawn: (-7.0, -6.0),
            boss_spawn: (0.0, 1.0),
        }
    }
}

/// Root of encounter.ron
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncounterTunables {
    pub schema_version: u32,
    #[serde(default)]
    pub player: PlayerTunables,
    #[serde(default)]
    pub boss: BossTunables,
    #[serde(default)]
    pub stage: StageTunables,
}

impl Default for EncounterTunables {
    fn default() -> Self {
        Self {
            schema_version: TUNABLES_SCHEMA_VERSION,
            player: PlayerTunables::default(),
            boss: BossTunables::default(),
            stage: StageTunables::default(),
        }
    }
}

fn check_positive(name: &str, value: f32) -> Result<(), String> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(format!("{} must be positive, got {}", name, value))
    }
}

fn check_chance(name: &str, value: f32) -> Result<(), String> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{} must be within [0, 1], got {}", name, value))
    }
}

impl EncounterTunables {
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != TUNABLES_SCHEMA_VERSION {
            return Err(format!(
                "Unsupported schema_version {} (expected {})",
                self.schema_version, TUNABLES_SCHEMA_VERSION
            ));
        }

        let p = &self.player;
        check_positive("player.max_health", p.max_health)?;
        check_positive("player.max_move_speed", p.max_move_speed)?;
        check_positive("player.jump_height", p.jump_height)?;
        check_positive("player.jump_time_to_apex", p.jump_time_to_apex)?;
        check_positive("player.body_half_size", p.body_half_size)?;
        check_positive("player.blink_interval", p.blink_interval)?;
        check_positive("player.bullet_speed", p.bullet_speed)?;
        check_chance("player.jump_release_factor", p.jump_release_factor)?;
        if p.max_jumps == 0 {
            return Err("player.max_jumps must be at least 1".to_string());
        }

        let b = &self.boss;
        check_positive("boss.max_health", b.max_health)?;
        check_positive("boss.move_speed", b.move_speed)?;
        check_positive("boss.attack_interval", b.attack_interval)?;
        check_positive("boss.rotation_attack_interval", b.rotation_attack_interval)?;
        check_positive("boss.cross_attack_interval", b.cross_attack_interval)?;
        check_positive("boss.spread_health_step", b.spread_health_step)?;
        check_positive("boss.arena_width", b.arena_width)?;
        check_positive("boss.arena_height", b.arena_height)?;
        check_positive("boss.reposition_interval", b.reposition_interval)?;
        check_positive("boss.bullet_speed", b.bullet_speed)?;
        check_chance("boss.rage_threshold", b.rage_threshold)?;
        check_chance("boss.chase_player_chance", b.chase_player_chance)?;
        check_chance("boss.teleport_chance", b.teleport_chance)?;
        check_chance("boss.escape_chance", b.escape_chance)?;

        let s = &self.stage;
        check_positive("stage.half_width", s.half_width)?;
        check_positive("stage.half_height", s.half_height)?;

        Ok(())
    }
}

/// Parse tunables from RON text.
pub fn parse_encounter_tunables(contents: &str) -> Result<EncounterTunables, String> {
    let tunables: EncounterTunables =
        ron::from_str(contents).map_err(|e| format!("Failed to parse tunables: {}", e))?;
    tunables.validate()?;
    Ok(tunables)
}

/// Load tunables from assets/config/encounter.ron
pub fn load_encounter_tunables() -> Result<EncounterTunables, String> {
    let contents = std::fs::read_to_string(ENCOUNTER_CONFIG_PATH)
        .map_err(|e| format!("Failed to read {}: {}", ENCOUNTER_CONFIG_PATH, e))?;

    let tunables = parse_encounter_tunables(&contents)
        .map_err(|e| format!("{}: {}", ENCOUNTER_CONFIG_PATH, e))?;

    info!(
        "Loaded encounter tunables (schema v{}) from {}",
        tunables.schema_version, ENCOUNTER_CONFIG_PATH
    );
    Ok(tunables)
}

/// Inserts [`EncounterTunables`], falling back to compiled defaults when the
/// file is missing or invalid.
pub struct TunablesPlugin;

impl Plugin for TunablesPlugin {
    fn build(&self, app: &mut App) {
        if app.world().contains_resource::<EncounterTunables>() {
            return;
        }

        let tunables = match load_encounter_tunables() {
            Ok(tunables) => tunables,
            Err(e) => {
                warn!("{} - using built-in tunables", e);
                EncounterTunables::default()
            }
        };
        app.insert_resource(tunables);
    }
}
