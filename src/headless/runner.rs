//! Headless encounter execution
//!
//! Runs a boss encounter without any graphical output, suitable for automated
//! testing. Time advances by a fixed 1/60 s per frame so a seeded run is
//! reproducible; input comes from the config's script and, optionally, a
//! simple player bot.

use bevy::app::{PluginsState, ScheduleRunnerPlugin};
use bevy::input::{InputPlugin, InputSystem};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::path::PathBuf;
use std::time::Duration;

use crate::combat::log::{CombatLog, CombatLogEventType, CombatantMetadata, EncounterMetadata};
use crate::encounter::constants::HEADLESS_FRAME_SECS;
use crate::encounter::encounter_flow::EncounterState;
use crate::encounter::tunables::EncounterTunables;
// Use the stable systems API instead of importing internal functions directly
use crate::encounter::systems::{
    AbilityController, Boss, BossAi, CombatEntity, EncounterOutcome, EncounterSystemPhase,
    FrameClock, GameRng, Player, PlayerBody,
};
use crate::encounter::{AbilityType, BossPhase, EncounterPlugin};
use crate::keybindings::{parse_key_code, GameAction, Keybindings};
use crate::settings::SettingsPlugin;

use super::config::HeadlessEncounterConfig;

/// Result of a completed headless encounter
#[derive(Debug, Clone)]
pub struct EncounterResult {
    pub outcome: EncounterOutcome,
    /// Real seconds simulated
    pub encounter_time: f32,
    pub player: CombatantResult,
    pub boss: CombatantResult,
    /// Boss phases entered, in order
    pub boss_phases: Vec<String>,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
}

/// Statistics for a single combatant after the encounter
#[derive(Debug, Clone, PartialEq)]
pub struct CombatantResult {
    pub name: String,
    pub max_health: f32,
    /// Health remaining at the end (0 if dead)
    pub final_health: f32,
    pub survived: bool,
    pub damage_dealt: f32,
    pub damage_taken: f32,
}

/// Resource to track headless encounter state
#[derive(Resource)]
pub struct HeadlessEncounterState {
    /// Encounter length before declaring a timeout
    pub max_duration: f32,
    /// Custom output path for the encounter log
    pub output_path: Option<String>,
    /// Write the log when the encounter completes
    pub save_log: bool,
    pub complete: bool,
    pub random_seed: Option<u64>,
    /// Populated when the encounter completes
    pub result: Option<EncounterResult>,
}

/// Scripted key presses still to replay.
#[derive(Resource, Debug, Default)]
pub struct InputScript {
    /// (time, key, hold), sorted by time
    pending: Vec<(f32, KeyCode, f32)>,
    /// Keys currently held and when to let go
    held: Vec<(KeyCode, f32)>,
}

impl InputScript {
    fn from_config(config: &HeadlessEncounterConfig, keybindings: &Keybindings) -> Self {
        let mut pending: Vec<(f32, KeyCode, f32)> = config
            .input_script
            .iter()
            .filter_map(|entry| {
                let key = match (&entry.action, &entry.key) {
                    (Some(action), _) => {
                        GameAction::from_name(action).and_then(|a| keybindings.primary_key(a))
                    }
                    (None, Some(key)) => parse_key_code(key),
                    (None, None) => None,
                }?;
                Some((entry.at, key, entry.hold))
            })
            .collect();
        pending.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self {
            pending,
            held: Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty() && self.held.is_empty()
    }
}

/// Autopilot jumps at most once per this many frames
const JUMP_PERIOD: u64 = 45;

/// Frames the autopilot keeps jump held
const JUMP_HOLD_FRAMES: u64 = 25;

/// Built-in player bot for unattended runs.
#[derive(Resource, Debug, Default)]
pub struct Autopilot {
    pub enabled: bool,
    frame: u64,
}

/// Plugin for headless encounter execution
pub struct HeadlessPlugin {
    pub config: HeadlessEncounterConfig,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        let keybindings = app
            .world()
            .get_resource::<Keybindings>()
            .cloned()
            .unwrap_or_default();

        app.insert_resource(HeadlessEncounterState {
            max_duration: self.config.max_duration_secs,
            output_path: self.config.output_path.clone(),
            save_log: self.config.output_path.is_some(),
            complete: false,
            random_seed: self.config.random_seed,
            result: None,
        })
        .insert_resource(InputScript::from_config(&self.config, &keybindings))
        .insert_resource(Autopilot {
            enabled: self.config.autopilot,
            frame: 0,
        });

        app.add_systems(
            PreUpdate,
            (replay_input_script, autopilot_input)
                .chain()
                .after(InputSystem),
        )
        .add_systems(
            Update,
            headless_check_encounter_end.after(EncounterSystemPhase::CombatResolution),
        )
        .add_systems(PostUpdate, headless_exit_on_complete);
    }
}

/// Press and release scripted keys at their scheduled times.
fn replay_input_script(
    real_time: Res<Time<Real>>,
    mut script: ResMut<InputScript>,
    mut keyboard: ResMut<ButtonInput<KeyCode>>,
) {
    let now = real_time.elapsed_secs();

    let script = &mut *script;
    script.held.retain(|(key, release_at)| {
        if now >= *release_at {
            keyboard.release(*key);
            false
        } else {
            true
        }
    });

    let due = script.pending.iter().take_while(|(at, _, _)| *at <= now).count();
    for (at, key, hold) in script.pending.drain(..due) {
        debug!("Scripted press {:?} at {:.2}s", key, now);
        keyboard.press(key);
        script.held.push((key, at + hold));
    }
}

fn tap(keyboard: &mut ButtonInput<KeyCode>, keybindings: &Keybindings, action: GameAction) {
    if let Some(key) = keybindings.primary_key(action) {
        keyboard.press(key);
    }
}

fn release(keyboard: &mut ButtonInput<KeyCode>, keybindings: &Keybindings, action: GameAction) {
    if let Some(key) = keybindings.primary_key(action) {
        keyboard.release(key);
    }
}

/// Drive the player: face the boss, keep some distance, hop toward it when
/// it hovers above, shoot constantly and slow time during the heavy phases.
fn autopilot_input(
    mut autopilot: ResMut<Autopilot>,
    keybindings: Res<Keybindings>,
    controller: Res<AbilityController>,
    mut keyboard: ResMut<ButtonInput<KeyCode>>,
    players: Query<(&Transform, &PlayerBody, &CombatEntity), With<Player>>,
    bosses: Query<(&Transform, &BossAi), (With<Boss>, Without<Player>)>,
) {
    if !autopilot.enabled {
        return;
    }
    autopilot.frame += 1;
    let frame = autopilot.frame;

    for action in [
        GameAction::MoveLeft,
        GameAction::MoveRight,
        GameAction::TimeSlowDown,
    ] {
        release(&mut keyboard, &keybindings, action);
    }
    // Jump is held for a while so the full jump height is reached
    if frame % JUMP_PERIOD == JUMP_HOLD_FRAMES {
        release(&mut keyboard, &keybindings, GameAction::Jump);
    }

    let Ok((player_transform, body, combat)) = players.get_single() else {
        return;
    };
    let Ok((boss_transform, ai)) = bosses.get_single() else {
        return;
    };
    if !combat.is_alive() {
        return;
    }

    let offset = boss_transform.translation.truncate() - player_transform.translation.truncate();

    let facing_boss = (offset.x < 0.0) == body.facing_left;
    if offset.x.abs() > 4.0 || !facing_boss {
        let toward = if offset.x < 0.0 {
            GameAction::MoveLeft
        } else {
            GameAction::MoveRight
        };
        tap(&mut keyboard, &keybindings, toward);
    }

    if offset.y > 1.5 && body.grounded && frame % JUMP_PERIOD == 0 {
        tap(&mut keyboard, &keybindings, GameAction::Jump);
    }

    // Alternate so every other frame is a fresh press
    if frame % 2 == 0 {
        tap(&mut keyboard, &keybindings, GameAction::Shoot);
    } else {
        release(&mut keyboard, &keybindings, GameAction::Shoot);
    }

    let heavy_phase = matches!(ai.phase(), BossPhase::RageMode | BossPhase::RotationAttack);
    if heavy_phase
        && controller.is_unlocked(AbilityType::TimeSlowDown)
        && controller.remaining_cooldown(AbilityType::TimeSlowDown) <= 0.0
        && !controller.any_time_ability_active()
    {
        tap(&mut keyboard, &keybindings, GameAction::TimeSlowDown);
    }
}

/// Check if the encounter has ended (victory, defeat or timeout)
fn headless_check_encounter_end(
    clock: Res<FrameClock>,
    tunables: Res<EncounterTunables>,
    mut encounter: ResMut<EncounterState>,
    mut headless_state: ResMut<HeadlessEncounterState>,
    mut combat_log: ResMut<CombatLog>,
    players: Query<(&Transform, &CombatEntity), With<Player>>,
    bosses: Query<(&Transform, &CombatEntity), With<Boss>>,
) {
    if headless_state.complete {
        return;
    }

    if encounter.outcome.is_none() && clock.elapsed >= headless_state.max_duration {
        info!("Encounter timed out after {:.1}s", clock.elapsed);
        combat_log.log(
            CombatLogEventType::EncounterEvent,
            format!("Encounter timed out after {:.1}s", clock.elapsed),
        );
        encounter.outcome = Some(EncounterOutcome::Timeout);
    }

    let Some(outcome) = encounter.outcome else {
        return;
    };

    let player = players.get_single().ok();
    let boss = bosses.get_single().ok();

    let player_result = combatant_result("Player", player.map(|(_, c)| c), &combat_log, tunables.player.max_health);
    let boss_result = combatant_result("Boss", boss.map(|(_, c)| c), &combat_log, tunables.boss.max_health);

    if headless_state.save_log {
        let position = |t: Option<&Transform>| t.map_or((0.0, 0.0), |t| (t.translation.x, t.translation.y));
        let metadata = EncounterMetadata {
            outcome: outcome.name().to_string(),
            duration_secs: clock.elapsed,
            random_seed: headless_state.random_seed,
            combatants: vec![
                metadata_for(&player_result, position(player.map(|(t, _)| t))),
                metadata_for(&boss_result, position(boss.map(|(t, _)| t))),
            ],
        };
        match combat_log.save_to_file(&metadata, headless_state.output_path.as_deref()) {
            Ok(filename) => println!("Encounter complete. Log saved to: {}", filename),
            Err(e) => eprintln!("Failed to save encounter log: {}", e),
        }
    }

    headless_state.result = Some(EncounterResult {
        outcome,
        encounter_time: clock.elapsed,
        player: player_result,
        boss: boss_result,
        boss_phases: combat_log.phase_history(),
        random_seed: headless_state.random_seed,
    });
    headless_state.complete = true;
}

/// Build a result from the live entity, or from the log once it is gone
fn combatant_result(
    name: &str,
    combat: Option<&CombatEntity>,
    combat_log: &CombatLog,
    configured_max: f32,
) -> CombatantResult {
    match combat {
        Some(combat) => CombatantResult {
            name: name.to_string(),
            max_health: combat.max_health,
            final_health: combat.health,
            survived: combat.is_alive(),
            damage_dealt: combat.damage_dealt,
            damage_taken: combat.damage_taken,
        },
        None => CombatantResult {
            name: name.to_string(),
            max_health: configured_max,
            final_health: 0.0,
            survived: false,
            damage_dealt: combat_log.damage_by_cause(name).values().sum(),
            damage_taken: combat_log.damage_taken_by(name),
        },
    }
}

fn metadata_for(result: &CombatantResult, final_position: (f32, f32)) -> CombatantMetadata {
    CombatantMetadata {
        name: result.name.clone(),
        max_health: result.max_health,
        final_health: result.final_health,
        damage_dealt: result.damage_dealt,
        damage_taken: result.damage_taken,
        final_position,
    }
}

/// Exit the app when the encounter is complete
fn headless_exit_on_complete(
    headless_state: Res<HeadlessEncounterState>,
    mut exit: EventWriter<AppExit>,
) {
    if headless_state.complete {
        exit.send(AppExit::Success);
    }
}

/// Build a windowless app for `config` without running it.
///
/// Frames advance by exactly [`HEADLESS_FRAME_SECS`] regardless of wall time.
pub fn build_encounter_app(config: &HeadlessEncounterConfig) -> Result<App, String> {
    config.validate()?;
    let unlocked = config.unlocked()?;

    let mut app = App::new();
    app
        // Minimal plugins - no window, no rendering
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(
            Duration::from_secs_f64(HEADLESS_FRAME_SECS),
        )))
        // Transform and hierarchy plugins needed for entity positions
        .add_plugins((TransformPlugin, HierarchyPlugin, InputPlugin))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            HEADLESS_FRAME_SECS,
        )));

    let game_rng = match config.random_seed {
        Some(seed) => {
            info!("Using deterministic RNG with seed: {}", seed);
            GameRng::from_seed(seed)
        }
        None => GameRng::from_entropy(),
    };
    app.insert_resource(game_rng).insert_resource(EncounterState {
        pickups: config.pickups.clone(),
        ..default()
    });

    // Keybindings must exist before the encounter and the input script read them
    if let Some(path) = &config.settings_path {
        app.add_plugins(SettingsPlugin {
            path: PathBuf::from(path),
        });
    }

    app.add_plugins(EncounterPlugin)
        .add_plugins(HeadlessPlugin {
            config: config.clone(),
        });

    let mut controller = app.world_mut().resource_mut::<AbilityController>();
    for ability in unlocked {
        controller.unlock(ability);
    }

    Ok(app)
}

/// Step `app` until the headless encounter completes or `max_frames` pass.
pub fn run_until_complete(app: &mut App, max_frames: u64) -> Option<EncounterResult> {
    if app.plugins_state() == PluginsState::Ready {
        app.finish();
        app.cleanup();
    }

    for _ in 0..max_frames {
        app.update();
        let state = app.world().resource::<HeadlessEncounterState>();
        if state.complete {
            return state.result.clone();
        }
    }
    None
}

/// Run a headless encounter with the given configuration
pub fn run_headless_encounter(config: HeadlessEncounterConfig) -> Result<EncounterResult, String> {
    println!("Starting headless encounter simulation...");
    println!("  Max duration: {:.0}s", config.max_duration_secs);
    println!("  Seed: {:?}", config.random_seed);
    println!("  Unlocked: {:?}", config.unlocked_abilities);
    println!("  Autopilot: {}", config.autopilot);

    let mut app = build_encounter_app(&config)?;
    app.add_plugins(bevy::log::LogPlugin::default());
    app.world_mut()
        .resource_mut::<HeadlessEncounterState>()
        .save_log = true;

    // Finish a few frames past the limit so the timeout check gets to run
    let max_frames = (config.max_duration_secs as f64 / HEADLESS_FRAME_SECS).ceil() as u64 + 10;
    let result = run_until_complete(&mut app, max_frames)
        .ok_or_else(|| "Encounter did not complete".to_string())?;

    println!();
    println!("Outcome: {}", result.outcome.name());
    println!("Time: {:.1}s", result.encounter_time);
    for combatant in [&result.player, &result.boss] {
        println!(
            "  {}: {:.0}/{:.0} HP, dealt {:.0}, took {:.0}",
            combatant.name,
            combatant.final_health,
            combatant.max_health,
            combatant.damage_dealt,
            combatant.damage_taken
        );
    }
    println!("Boss phases: {}", result.boss_phases.join(" -> "));

    Ok(result)
}
