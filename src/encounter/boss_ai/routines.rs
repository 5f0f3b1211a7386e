//! Boss attack routines
//!
//! Multi-second attacks are explicit state objects advanced once per tick
//! with the scaled delta. Spread, cross and rage attacks are scripts of
//! wait / fire steps; the rotation attack is a continuous spin.
//!
//! A routine never touches the boss directly. Each call to `advance` reports
//! what happened this tick in a [`RoutineTick`] and the owner applies it.

use bevy::prelude::*;
use smallvec::SmallVec;

use crate::encounter::constants::*;

/// Projectile directions fired in one tick.
pub type Shots = SmallVec<[Vec2; 16]>;

/// Unit direction for an angle in degrees (0 = +X, counter-clockwise).
pub fn direction_from_degrees(degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians())
}

/// Which diagonals a cross volley adds to the four cardinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagonals {
    None,
    /// Cardinals rotated by +45 degrees
    Positive,
    /// Cardinals rotated by both +45 and -45 degrees
    Both,
}

/// One burst of projectiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Volley {
    /// `count` projectiles evenly spaced, first one at `offset_deg`
    Ring { count: usize, offset_deg: f32 },
    /// The four cardinals plus optional diagonals
    Cross { diagonals: Diagonals },
}

impl Volley {
    pub fn directions(&self) -> Shots {
        let mut shots = Shots::new();
        match *self {
            Volley::Ring { count, offset_deg } => {
                if count == 0 {
                    return shots;
                }
                let step = 360.0 / count as f32;
                for i in 0..count {
                    shots.push(direction_from_degrees(offset_deg + step * i as f32));
                }
            }
            Volley::Cross { diagonals } => {
                for i in 0..4 {
                    let base = 90.0 * i as f32;
                    shots.push(direction_from_degrees(base));
                    match diagonals {
                        Diagonals::None => {}
                        Diagonals::Positive => {
                            shots.push(direction_from_degrees(base + CROSS_DIAGONAL_DEG));
                        }
                        Diagonals::Both => {
                            shots.push(direction_from_degrees(base + CROSS_DIAGONAL_DEG));
                            shots.push(direction_from_degrees(base - CROSS_DIAGONAL_DEG));
                        }
                    }
                }
            }
        }
        shots
    }
}

/// A single step of a scripted routine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoutineStep {
    /// Play the attack animation and wait for it to finish
    Windup(f32),
    Fire(Volley),
    Wait(f32),
}

/// What a routine did during one tick.
#[derive(Debug, Default)]
pub struct RoutineTick {
    pub shots: Shots,
    /// The attack animation should (re)start
    pub attack_cue: bool,
    /// Facing to display, for routines that rotate the boss
    pub facing_degrees: Option<f32>,
    pub finished: bool,
}

/// A linear script of waits and volleys.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedRoutine {
    steps: Vec<RoutineStep>,
    index: usize,
    /// Time left in the current wait step, set when the step is entered
    wait_remaining: Option<f32>,
}

impl ScriptedRoutine {
    pub fn new(steps: Vec<RoutineStep>) -> Self {
        Self {
            steps,
            index: 0,
            wait_remaining: None,
        }
    }

    /// Wind-up, then two 12-projectile rings with the second offset by half a step.
    pub fn spread(windup: f32) -> Self {
        let half_step = 360.0 / SPREAD_PROJECTILES as f32 / 2.0;
        let mut steps = vec![RoutineStep::Windup(windup)];
        for volley in 0..SPREAD_VOLLEYS {
            let offset_deg = if volley % 2 == 1 { half_step } else { 0.0 };
            steps.push(RoutineStep::Fire(Volley::Ring {
                count: SPREAD_PROJECTILES,
                offset_deg,
            }));
            steps.push(RoutineStep::Wait(SPREAD_VOLLEY_GAP));
        }
        steps.push(RoutineStep::Wait(ATTACK_RECOVERY));
        Self::new(steps)
    }

    /// Three cardinal volleys; the later ones add both diagonals.
    pub fn cross() -> Self {
        let mut steps = Vec::new();
        for volley in 0..CROSS_VOLLEYS {
            let diagonals = if volley == 0 {
                Diagonals::None
            } else {
                Diagonals::Both
            };
            steps.push(RoutineStep::Fire(Volley::Cross { diagonals }));
            steps.push(RoutineStep::Wait(CROSS_VOLLEY_GAP));
        }
        steps.push(RoutineStep::Wait(ATTACK_RECOVERY));
        Self::new(steps)
    }

    /// Rounds of a single ring followed by a reduced cross.
    pub fn rage() -> Self {
        let mut steps = Vec::new();
        for _ in 0..RAGE_ROUNDS {
            steps.push(RoutineStep::Fire(Volley::Ring {
                count: RAGE_SPREAD_PROJECTILES,
                offset_deg: 0.0,
            }));
            steps.push(RoutineStep::Wait(SPREAD_VOLLEY_GAP));
            steps.push(RoutineStep::Wait(RAGE_PAUSE));

            for volley in 0..RAGE_CROSS_VOLLEYS {
                let diagonals = if volley == 0 {
                    Diagonals::None
                } else {
                    Diagonals::Positive
                };
                steps.push(RoutineStep::Fire(Volley::Cross { diagonals }));
                steps.push(RoutineStep::Wait(RAGE_CROSS_GAP));
            }
            steps.push(RoutineStep::Wait(ATTACK_RECOVERY));
            steps.push(RoutineStep::Wait(RAGE_PAUSE));
        }
        Self::new(steps)
    }

    pub fn steps(&self) -> &[RoutineStep] {
        &self.steps
    }

    /// Total time the script takes to run to completion.
    pub fn total_duration(&self) -> f32 {
        self.steps
            .iter()
            .map(|step| match step {
                RoutineStep::Windup(t) | RoutineStep::Wait(t) => *t,
                RoutineStep::Fire(_) => 0.0,
            })
            .sum()
    }

    /// Run steps until `dt` is used up. Leftover time from a finished wait
    /// carries into the next step.
    pub fn advance(&mut self, dt: f32) -> RoutineTick {
        let mut tick = RoutineTick::default();
        let mut budget = dt.max(0.0);

        while let Some(step) = self.steps.get(self.index).copied() {
            match step {
                RoutineStep::Fire(volley) => {
                    tick.shots.extend(volley.directions());
                    tick.attack_cue = true;
                    self.index += 1;
                }
                RoutineStep::Windup(duration) | RoutineStep::Wait(duration) => {
                    let remaining = match self.wait_remaining {
                        Some(remaining) => remaining,
                        None => {
                            if matches!(step, RoutineStep::Windup(_)) {
                                tick.attack_cue = true;
                            }
                            duration
                        }
                    };

                    if budget >= remaining {
                        budget -= remaining;
                        self.wait_remaining = None;
                        self.index += 1;
                    } else {
                        self.wait_remaining = Some(remaining - budget);
                        break;
                    }
                }
            }
        }

        tick.finished = self.index >= self.steps.len();
        tick
    }
}

/// Continuous spin firing facing and facing+180 at a fixed interval.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationRoutine {
    pub elapsed: f32,
    pub shot_timer: f32,
    pub facing_degrees: f32,
    pub clockwise: bool,
}

impl RotationRoutine {
    pub fn new(clockwise: bool) -> Self {
        Self {
            elapsed: 0.0,
            shot_timer: 0.0,
            facing_degrees: 0.0,
            clockwise,
        }
    }

    pub fn advance(&mut self, dt: f32) -> RoutineTick {
        let dt = dt.max(0.0);
        let mut tick = RoutineTick::default();
        if self.elapsed == 0.0 && dt > 0.0 {
            tick.attack_cue = true;
        }

        let sign = if self.clockwise { -1.0 } else { 1.0 };
        self.facing_degrees = (self.facing_degrees + sign * ROTATION_SPEED_DEG * dt).rem_euclid(360.0);

        self.shot_timer += dt;
        if self.shot_timer >= ROTATION_SHOT_INTERVAL {
            let forward = direction_from_degrees(self.facing_degrees);
            tick.shots.push(forward);
            tick.shots.push(-forward);
            tick.attack_cue = true;
            self.shot_timer = 0.0;
        }

        self.elapsed += dt;
        if self.elapsed >= ROTATION_DURATION {
            self.facing_degrees = 0.0;
            tick.finished = true;
        }
        tick.facing_degrees = Some(self.facing_degrees);
        tick
    }
}

/// Stats changed for the duration of a rage routine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedStats {
    pub move_speed: f32,
    pub attack_interval: f32,
}

/// The attack routine currently in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum AttackRoutine {
    Rotation(RotationRoutine),
    Spread(ScriptedRoutine),
    Cross(ScriptedRoutine),
    Rage {
        script: ScriptedRoutine,
        saved: SavedStats,
    },
}

impl AttackRoutine {
    pub fn advance(&mut self, dt: f32) -> RoutineTick {
        match self {
            AttackRoutine::Rotation(routine) => routine.advance(dt),
            AttackRoutine::Spread(script)
            | AttackRoutine::Cross(script)
            | AttackRoutine::Rage { script, .. } => script.advance(dt),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttackRoutine::Rotation(_) => "Rotation",
            AttackRoutine::Spread(_) => "Spread",
            AttackRoutine::Cross(_) => "Cross",
            AttackRoutine::Rage { .. } => "Rage",
        }
    }
}

/// Movement away from the player after being hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscapeRoutine {
    pub direction: Vec2,
    pub remaining: f32,
}

/// Fan volley scheduled right after a teleport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingFan {
    pub delay: f32,
}

/// Three projectiles toward `aim`, spread by [`TELEPORT_FAN_DEG`].
pub fn fan_toward(aim: Vec2) -> Shots {
    let aim = if aim.length_squared() > 0.0 {
        aim.normalize()
    } else {
        Vec2::X
    };
    let mut shots = Shots::new();
    for offset in [-TELEPORT_FAN_DEG, 0.0, TELEPORT_FAN_DEG] {
        shots.push(Vec2::from_angle(offset.to_radians()).rotate(aim));
    }
    shots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_end(script: &mut ScriptedRoutine, dt: f32) -> (usize, usize, f32) {
        let mut volleys = 0;
        let mut shots = 0;
        let mut time = 0.0;
        for _ in 0..10_000 {
            let tick = script.advance(dt);
            time += dt;
            if !tick.shots.is_empty() {
                volleys += 1;
                shots += tick.shots.len();
            }
            if tick.finished {
                return (volleys, shots, time);
            }
        }
        panic!("routine never finished");
    }

    #[test]
    fn test_spread_fires_two_offset_rings() {
        let mut spread = ScriptedRoutine::spread(0.5);
        let (volleys, shots, time) = run_to_end(&mut spread, 0.01);
        assert_eq!(volleys, 2);
        assert_eq!(shots, 24);
        assert!((time - 1.6).abs() < 0.05, "spread took {}", time);

        let second = Volley::Ring {
            count: SPREAD_PROJECTILES,
            offset_deg: 15.0,
        };
        let first_dir = second.directions()[0];
        assert!((first_dir.y.atan2(first_dir.x).to_degrees() - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_cross_adds_diagonals_after_first_volley() {
        let mut cross = ScriptedRoutine::cross();
        let mut sizes = Vec::new();
        for _ in 0..1000 {
            let tick = cross.advance(0.01);
            if !tick.shots.is_empty() {
                sizes.push(tick.shots.len());
            }
            if tick.finished {
                break;
            }
        }
        assert_eq!(sizes, vec![4, 12, 12]);
    }

    #[test]
    fn test_rage_script_shape() {
        let mut rage = ScriptedRoutine::rage();
        let mut sizes = Vec::new();
        for _ in 0..10_000 {
            let tick = rage.advance(0.01);
            if !tick.shots.is_empty() {
                sizes.push(tick.shots.len());
            }
            if tick.finished {
                break;
            }
        }
        assert_eq!(sizes, vec![8, 4, 8, 8, 4, 8]);
    }

    #[test]
    fn test_large_step_fires_everything_and_finishes() {
        let mut cross = ScriptedRoutine::cross();
        let tick = cross.advance(100.0);
        assert_eq!(tick.shots.len(), 28);
        assert!(tick.finished);
    }

    #[test]
    fn test_rotation_spins_fires_pairs_and_resets() {
        let mut rotation = RotationRoutine::new(false);
        let mut pairs = 0;
        let mut finished = false;
        for _ in 0..500 {
            let tick = rotation.advance(0.01);
            if !tick.shots.is_empty() {
                assert_eq!(tick.shots.len(), 2);
                assert!((tick.shots[0] + tick.shots[1]).length() < 1e-4);
                pairs += 1;
            }
            if tick.finished {
                finished = true;
                assert_eq!(tick.facing_degrees, Some(0.0));
                break;
            }
        }
        assert!(finished);
        assert!((19..=20).contains(&pairs), "fired {} pairs", pairs);
    }

    #[test]
    fn test_fan_is_centered_on_aim() {
        let shots = fan_toward(Vec2::new(0.0, -3.0));
        assert_eq!(shots.len(), 3);
        assert!((shots[1] - Vec2::NEG_Y).length() < 1e-5);
        let angle = shots[0].dot(shots[2]).clamp(-1.0, 1.0).acos().to_degrees();
        assert!((angle - 60.0).abs() < 1e-3);
    }
}
