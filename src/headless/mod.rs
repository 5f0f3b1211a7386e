//! Headless mode for automated testing
//!
//! Runs a boss encounter without any graphical output, driven by a JSON
//! config and optionally a built-in player bot.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --headless encounter.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "random_seed": 42,
//!   "max_duration_secs": 90,
//!   "unlocked_abilities": ["TimeSlowDown"],
//!   "input_script": [ { "at": 2.0, "action": "TimeSlowDown" } ],
//!   "pickups": [ { "kind": { "Heal": { "amount": 1 } }, "position": [-4.0, -6.0] } ],
//!   "autopilot": true
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{HeadlessEncounterConfig, ScriptedInput};
pub use runner::{
    build_encounter_app, run_headless_encounter, run_until_complete, CombatantResult,
    EncounterResult, HeadlessEncounterState, HeadlessPlugin,
};
