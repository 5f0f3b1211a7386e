//! chronoboss - time-manipulation boss encounter simulator
//!
//! Runs one encounter headlessly and prints the outcome. Without `--headless`
//! the built-in defaults are used (autopilot on, 120 s limit).

use chronoboss::cli;
use chronoboss::headless::{run_headless_encounter, HeadlessEncounterConfig};
use chronoboss::settings::GameSettings;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = cli::parse_args();

    let config = match &args.headless {
        Some(path) => match HeadlessEncounterConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Invalid headless config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => HeadlessEncounterConfig::default(),
    };

    let mut config = config;
    if let Some(output) = &args.output {
        config.output_path = Some(output.display().to_string());
    }
    if let Some(max_duration) = args.max_duration {
        config.max_duration_secs = max_duration;
    }
    if let Some(seed) = args.seed {
        config.random_seed = Some(seed);
    }
    if let Some(settings) = &args.settings {
        config.settings_path = Some(settings.display().to_string());
    } else if config.settings_path.is_none() {
        config.settings_path = Some(GameSettings::settings_path().display().to_string());
    }

    match run_headless_encounter(config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Headless encounter failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
