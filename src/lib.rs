//! chronoboss - time-manipulation boss encounter core
//!
//! Simulation core of a 2D action platformer boss fight: a single owner of
//! the time scale, the player's time abilities, a phase-driven boss and the
//! shared combat model, hosted on Bevy's ECS.
//!
//! This library exposes the core modules for testing and reuse.

pub mod cli;
pub mod combat;
pub mod encounter;
pub mod headless;
pub mod keybindings;
pub mod settings;

// Re-export commonly used types
pub use combat::log::{CombatLog, CombatLogEventType};
pub use encounter::EncounterPlugin;
pub use headless::HeadlessEncounterConfig;
