//! User settings
//!
//! Persists user preferences (currently the keybindings) as a versioned RON
//! file next to the executable.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::keybindings::Keybindings;

/// Current settings file layout
pub const SETTINGS_SCHEMA_VERSION: u32 = 1;

/// User-configurable settings
#[derive(Resource, Clone, Debug, Serialize, Deserialize)]
pub struct GameSettings {
    pub schema_version: u32,
    #[serde(default)]
    pub keybindings: Keybindings,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            schema_version: SETTINGS_SCHEMA_VERSION,
            keybindings: Keybindings::default(),
        }
    }
}

impl GameSettings {
    /// Get the path to the settings file
    pub fn settings_path() -> PathBuf {
        PathBuf::from("settings.ron")
    }

    /// Load settings from the default path, or defaults if missing or unreadable
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    /// Load settings from `path`, or defaults if missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read settings file: {}", e);
                return Self::default();
            }
        };

        match ron::from_str::<GameSettings>(&contents) {
            Ok(settings) if settings.schema_version == SETTINGS_SCHEMA_VERSION => {
                info!("Loaded settings from {:?}", path);
                settings
            }
            Ok(settings) => {
                warn!(
                    "Settings file has schema_version {} (expected {}), using defaults",
                    settings.schema_version, SETTINGS_SCHEMA_VERSION
                );
                Self::default()
            }
            Err(e) => {
                warn!("Failed to parse settings file: {}", e);
                Self::default()
            }
        }
    }

    /// Save settings to the default path
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::settings_path())
    }

    /// Save settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, contents)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// Where the settings file lives for this app
#[derive(Resource, Clone, Debug)]
pub struct SettingsPath(pub PathBuf);

/// Plugin for managing user settings
pub struct SettingsPlugin {
    pub path: PathBuf,
}

impl Default for SettingsPlugin {
    fn default() -> Self {
        Self {
            path: GameSettings::settings_path(),
        }
    }
}

impl Plugin for SettingsPlugin {
    fn build(&self, app: &mut App) {
        let settings = GameSettings::load_from(&self.path);

        // Keybindings are also a separate resource for easy access
        let keybindings = settings.keybindings.clone();

        app.insert_resource(settings)
            .insert_resource(keybindings)
            .insert_resource(SettingsPath(self.path.clone()))
            .add_systems(Update, (save_settings_on_change, sync_keybindings));
    }
}

/// System to save settings when they change
fn save_settings_on_change(settings: Res<GameSettings>, path: Res<SettingsPath>) {
    if settings.is_changed() && !settings.is_added() {
        if let Err(e) = settings.save_to(&path.0) {
            error!("Failed to save settings: {}", e);
        }
    }
}

/// System to keep Keybindings resource in sync with GameSettings
fn sync_keybindings(settings: Res<GameSettings>, mut keybindings: ResMut<Keybindings>) {
    if settings.is_changed() && !settings.is_added() {
        *keybindings = settings.keybindings.clone();
        info!("Synced keybindings from settings");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keybindings::{GameAction, KeyBinding};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("chronoboss_{}_{}.ron", name, std::process::id()))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = GameSettings::load_from(&temp_path("missing"));
        assert_eq!(settings.schema_version, SETTINGS_SCHEMA_VERSION);
    }

    #[test]
    fn test_save_then_load_keeps_custom_binding() {
        let path = temp_path("roundtrip");
        let mut settings = GameSettings::default();
        settings
            .keybindings
            .set(GameAction::Shoot, KeyBinding::new(KeyCode::KeyK));
        settings.save_to(&path).unwrap();

        let loaded = GameSettings::load_from(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(
            loaded.keybindings.primary_key(GameAction::Shoot),
            Some(KeyCode::KeyK)
        );
    }

    #[test]
    fn test_wrong_schema_version_falls_back() {
        let path = temp_path("schema");
        fs::write(&path, "(schema_version: 99)").unwrap();
        let loaded = GameSettings::load_from(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(loaded.schema_version, SETTINGS_SCHEMA_VERSION);
    }

    #[test]
    fn test_plugin_syncs_and_saves_changed_bindings() {
        let path = temp_path("plugin");
        let mut app = App::new();
        app.add_plugins(SettingsPlugin { path: path.clone() });
        app.update();

        app.world_mut()
            .resource_mut::<GameSettings>()
            .keybindings
            .set(GameAction::TimeStop, KeyBinding::new(KeyCode::KeyG));
        app.update();

        assert_eq!(
            app.world()
                .resource::<Keybindings>()
                .primary_key(GameAction::TimeStop),
            Some(KeyCode::KeyG)
        );
        let saved = GameSettings::load_from(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(
            saved.keybindings.primary_key(GameAction::TimeStop),
            Some(KeyCode::KeyG)
        );
    }
}
