//! Command-line interface for chronoboss

use clap::Parser;
use std::path::PathBuf;

/// Time-manipulation boss encounter simulator
#[derive(Parser, Debug)]
#[command(name = "chronoboss")]
#[command(about = "Time-manipulation boss encounter simulator")]
#[command(version)]
pub struct Args {
    /// Run the encounter described by this JSON config file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub headless: Option<PathBuf>,

    /// Output path for the encounter log
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum encounter duration in seconds (overrides the config)
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Random seed (overrides the config)
    #[arg(long)]
    pub seed: Option<u64>,

    /// User settings file with keybindings (default: settings.ron)
    #[arg(long, value_name = "SETTINGS_FILE")]
    pub settings: Option<PathBuf>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
