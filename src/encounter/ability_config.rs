//! Data-Driven Ability Configuration
//!
//! Ability durations, cooldowns and time scales are loaded from
//! `assets/config/abilities.ron` instead of being hardcoded, so balance
//! changes don't require recompilation. When the file cannot be loaded the
//! built-in table from [`AbilityDefinitions::builtin`] is used.
//!
//! ## Usage
//! ```ignore
//! fn my_system(abilities: Res<AbilityDefinitions>) {
//!     let def = abilities.get_unchecked(&AbilityType::TimeStop);
//!     println!("Time Stop lasts {}s", def.duration);
//! }
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::abilities::AbilityType;

/// Default location of the ability definitions file.
pub const ABILITIES_CONFIG_PATH: &str = "assets/config/abilities.ron";

/// Configuration of a single player ability.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AbilityConfig {
    /// Display name of the ability
    pub name: String,
    /// Active time in seconds. 0.0 means the ability is a toggle with no expiry.
    #[serde(default)]
    pub duration: f32,
    /// Cooldown in seconds, started at activation
    #[serde(default)]
    pub cooldown: f32,
    /// Time scale requested while active (time abilities only)
    #[serde(default)]
    pub time_scale: Option<f32>,
    /// Can only be switched on or off while the player stands on a surface
    #[serde(default)]
    pub requires_grounded: bool,
}

impl AbilityConfig {
    /// Returns true if this ability has no expiry
    pub fn is_toggle(&self) -> bool {
        self.duration <= 0.0
    }
}

/// Root structure for the abilities.ron file
#[derive(Debug, Serialize, Deserialize)]
pub struct AbilitiesConfig {
    pub abilities: HashMap<AbilityType, AbilityConfig>,
}

/// Resource containing all ability definitions.
#[derive(Resource, Debug, Clone)]
pub struct AbilityDefinitions {
    definitions: HashMap<AbilityType, AbilityConfig>,
}

impl Default for AbilityDefinitions {
    /// Load ability definitions from the default config file, or the
    /// built-in table if it is missing or invalid.
    fn default() -> Self {
        load_ability_definitions().unwrap_or_else(|e| {
            warn!("{} - using built-in ability definitions", e);
            Self::builtin()
        })
    }
}

impl AbilityDefinitions {
    /// Create from a loaded config
    pub fn new(config: AbilitiesConfig) -> Self {
        Self {
            definitions: config.abilities,
        }
    }

    /// Compiled-in timings matching the shipped abilities.ron
    pub fn builtin() -> Self {
        let entry = |name: &str, duration, cooldown, time_scale, requires_grounded| AbilityConfig {
            name: name.to_string(),
            duration,
            cooldown,
            time_scale,
            requires_grounded,
        };
        let definitions = HashMap::from([
            (
                AbilityType::AntiGravity,
                entry("Anti Gravity", 0.0, 0.0, None, true),
            ),
            (
                AbilityType::TimeStop,
                entry("Time Stop", 3.0, 10.0, Some(0.01), false),
            ),
            (
                AbilityType::TimeSlowDown,
                entry("Time Slow Down", 5.0, 8.0, Some(0.3), false),
            ),
        ]);
        Self { definitions }
    }

    /// Get the configuration for an ability type
    pub fn get(&self, ability: &AbilityType) -> Option<&AbilityConfig> {
        self.definitions.get(ability)
    }

    /// Get the configuration for an ability type, panicking if not found.
    /// Use this when you know the ability must exist (validated at startup).
    pub fn get_unchecked(&self, ability: &AbilityType) -> &AbilityConfig {
        self.definitions
            .get(ability)
            .unwrap_or_else(|| panic!("Ability {:?} not found in definitions", ability))
    }

    /// Check that every ability is defined with sane values.
    pub fn validate(&self) -> Result<(), String> {
        let missing: Vec<AbilityType> = AbilityType::ALL
            .into_iter()
            .filter(|ability| !self.definitions.contains_key(ability))
            .collect();

        if !missing.is_empty() {
            return Err(format!("Missing ability definitions: {:?}", missing));
        }

        for (ability, def) in &self.definitions {
            if def.duration < 0.0 || def.cooldown < 0.0 {
                return Err(format!(
                    "{:?} has a negative duration or cooldown",
                    ability
                ));
            }

            match (ability.time_source(), def.time_scale) {
                (Some(_), Some(scale)) if scale > 0.0 && scale <= 1.0 => {}
                (Some(_), Some(scale)) => {
                    return Err(format!(
                        "{:?} time_scale {} must be within (0, 1]",
                        ability, scale
                    ));
                }
                (Some(_), None) => {
                    return Err(format!("{:?} is a time ability but has no time_scale", ability));
                }
                (None, Some(_)) => {
                    return Err(format!("{:?} cannot request a time_scale", ability));
                }
                (None, None) => {}
            }
        }

        Ok(())
    }

    /// Iterate over every defined ability
    pub fn iter(&self) -> impl Iterator<Item = (&AbilityType, &AbilityConfig)> {
        self.definitions.iter()
    }
}

/// Parse ability definitions from RON text.
pub fn parse_ability_definitions(contents: &str) -> Result<AbilityDefinitions, String> {
    let config: AbilitiesConfig =
        ron::from_str(contents).map_err(|e| format!("Failed to parse abilities: {}", e))?;

    let definitions = AbilityDefinitions::new(config);
    definitions.validate()?;
    Ok(definitions)
}

/// Load ability definitions from assets/config/abilities.ron
pub fn load_ability_definitions() -> Result<AbilityDefinitions, String> {
    let contents = std::fs::read_to_string(ABILITIES_CONFIG_PATH)
        .map_err(|e| format!("Failed to read {}: {}", ABILITIES_CONFIG_PATH, e))?;

    let definitions = parse_ability_definitions(&contents)
        .map_err(|e| format!("{}: {}", ABILITIES_CONFIG_PATH, e))?;

    info!(
        "Loaded {} ability definitions from {}",
        definitions.definitions.len(),
        ABILITIES_CONFIG_PATH
    );

    Ok(definitions)
}

/// Bevy plugin for ability configuration loading
pub struct AbilityConfigPlugin;

impl Plugin for AbilityConfigPlugin {
    fn build(&self, app: &mut App) {
        if app.world().contains_resource::<AbilityDefinitions>() {
            return;
        }

        let definitions = match load_ability_definitions() {
            Ok(definitions) => definitions,
            Err(e) => {
                warn!("{} - using built-in ability definitions", e);
                AbilityDefinitions::builtin()
            }
        };
        app.insert_resource(definitions);
    }
}
