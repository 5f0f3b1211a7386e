//! JSON configuration parsing for headless mode
//!
//! A headless encounter is fully described by its config: the seed, what is
//! unlocked up front, which keys get pressed when, where pickups lie, and
//! whether the built-in autopilot plays.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::encounter::abilities::AbilityType;
use crate::encounter::encounter_flow::PickupSpawn;
use crate::keybindings::{parse_key_code, GameAction};

/// One scripted key press
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedInput {
    /// Seconds after the start of the encounter
    pub at: f32,
    /// Action name ("Jump", "TimeStop", ...), pressed through its primary key
    #[serde(default)]
    pub action: Option<String>,
    /// Raw key name ("KeyF", "Space", ...)
    #[serde(default)]
    pub key: Option<String>,
    /// How long the key stays down (0 = a single-frame tap)
    #[serde(default)]
    pub hold: f32,
}

/// Headless encounter configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessEncounterConfig {
    /// Custom output path for the encounter log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// Maximum encounter duration in seconds (default: 120)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Random seed for deterministic reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Abilities unlocked before the first frame ("AntiGravity", "TimeStop", "TimeSlowDown")
    #[serde(default)]
    pub unlocked_abilities: Vec<String>,
    /// Key presses replayed at fixed encounter times
    #[serde(default)]
    pub input_script: Vec<ScriptedInput>,
    /// Pickups placed in the stage
    #[serde(default)]
    pub pickups: Vec<PickupSpawn>,
    /// Let the built-in player bot fight (default: true)
    #[serde(default = "default_autopilot")]
    pub autopilot: bool,
    /// User settings file supplying the keybindings (built-in bindings when unset)
    #[serde(default)]
    pub settings_path: Option<String>,
}

fn default_max_duration() -> f32 {
    120.0
}

fn default_autopilot() -> bool {
    true
}

impl Default for HeadlessEncounterConfig {
    fn default() -> Self {
        Self {
            output_path: None,
            max_duration_secs: default_max_duration(),
            random_seed: None,
            unlocked_abilities: Vec::new(),
            input_script: Vec::new(),
            pickups: Vec::new(),
            autopilot: default_autopilot(),
            settings_path: None,
        }
    }
}

impl HeadlessEncounterConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_json(&contents)
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json(contents: &str) -> Result<Self, String> {
        let config: HeadlessEncounterConfig = serde_json::from_str(contents)
            .map_err(|e| format!("Failed to parse JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.max_duration_secs > 0.0) {
            return Err("max_duration_secs must be positive".to_string());
        }

        for name in &self.unlocked_abilities {
            Self::parse_ability(name)?;
        }

        for (i, entry) in self.input_script.iter().enumerate() {
            if !(entry.at >= 0.0) || !(entry.hold >= 0.0) {
                return Err(format!(
                    "input_script[{}]: 'at' and 'hold' must be non-negative",
                    i
                ));
            }
            match (&entry.action, &entry.key) {
                (Some(action), None) => {
                    GameAction::from_name(action).ok_or_else(|| {
                        format!("input_script[{}]: unknown action '{}'", i, action)
                    })?;
                }
                (None, Some(key)) => {
                    parse_key_code(key)
                        .ok_or_else(|| format!("input_script[{}]: unknown key '{}'", i, key))?;
                }
                _ => {
                    return Err(format!(
                        "input_script[{}]: exactly one of 'action' or 'key' is required",
                        i
                    ));
                }
            }
        }

        Ok(())
    }

    /// Parse an ability name string into AbilityType
    pub fn parse_ability(name: &str) -> Result<AbilityType, String> {
        AbilityType::from_name(name).ok_or_else(|| {
            format!(
                "Unknown ability: '{}'. Valid abilities: AntiGravity, TimeStop, TimeSlowDown",
                name
            )
        })
    }

    /// Abilities to unlock at startup
    pub fn unlocked(&self) -> Result<Vec<AbilityType>, String> {
        self.unlocked_abilities
            .iter()
            .map(|name| Self::parse_ability(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = HeadlessEncounterConfig::from_json("{}").unwrap();
        assert_eq!(config.max_duration_secs, 120.0);
        assert!(config.autopilot);
        assert!(config.random_seed.is_none());
    }

    #[test]
    fn test_rejects_unknown_ability() {
        let err = HeadlessEncounterConfig::from_json(r#"{ "unlocked_abilities": ["Fly"] }"#)
            .unwrap_err();
        assert!(err.contains("Unknown ability"));
    }

    #[test]
    fn test_script_entry_needs_exactly_one_target() {
        let both = r#"{ "input_script": [ { "at": 1.0, "action": "Jump", "key": "Space" } ] }"#;
        assert!(HeadlessEncounterConfig::from_json(both).is_err());

        let neither = r#"{ "input_script": [ { "at": 1.0 } ] }"#;
        assert!(HeadlessEncounterConfig::from_json(neither).is_err());

        let ok = r#"{ "input_script": [ { "at": 1.0, "key": "KeyF", "hold": 0.5 } ] }"#;
        assert!(HeadlessEncounterConfig::from_json(ok).is_ok());
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        assert!(HeadlessEncounterConfig::from_json(r#"{ "max_duration_secs": 0 }"#).is_err());
    }
}
