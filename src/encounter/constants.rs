//! Encounter Constants
//!
//! Fixed timings and shapes of the boss attack routines, plus the handful of
//! simulation constants that are not exposed as tunables. Everything a
//! designer is expected to rebalance lives in `tunables.rs` instead.

// ============================================================================
// Rotation Attack
// ============================================================================

/// Spin speed while the rotation attack is running (degrees per second).
pub const ROTATION_SPEED_DEG: f32 = 180.0;

/// Total length of the rotation attack in seconds.
pub const ROTATION_DURATION: f32 = 4.0;

/// Time between the paired shots fired while spinning.
pub const ROTATION_SHOT_INTERVAL: f32 = 0.2;

// ============================================================================
// Spread Attack
// ============================================================================

/// Projectiles per ring in a spread volley.
pub const SPREAD_PROJECTILES: usize = 12;

/// Number of rings fired by one spread attack. Odd rings are offset by half a step.
pub const SPREAD_VOLLEYS: usize = 2;

/// Pause after each spread ring.
pub const SPREAD_VOLLEY_GAP: f32 = 0.3;

// ============================================================================
// Cross Attack
// ============================================================================

/// Number of cardinal volleys in a cross attack.
pub const CROSS_VOLLEYS: usize = 3;

/// Pause after each cross volley.
pub const CROSS_VOLLEY_GAP: f32 = 0.3;

/// Diagonal offset added to cross volleys after the first (degrees).
pub const CROSS_DIAGONAL_DEG: f32 = 45.0;

/// Recovery pause after a spread or cross attack finishes, before Normal resumes.
pub const ATTACK_RECOVERY: f32 = 0.5;

// ============================================================================
// Rage Mode
// ============================================================================

/// Move speed multiplier while raging.
pub const RAGE_SPEED_MULTIPLIER: f32 = 1.2;

/// Attack interval multiplier while raging (lower is faster).
pub const RAGE_INTERVAL_MULTIPLIER: f32 = 0.7;

/// Number of ring + cross rounds in one rage routine.
pub const RAGE_ROUNDS: usize = 2;

/// Projectiles in the single rage ring.
pub const RAGE_SPREAD_PROJECTILES: usize = 8;

/// Pause between the ring and the cross inside a rage round, and after each round.
pub const RAGE_PAUSE: f32 = 0.8;

/// Volleys in the reduced rage cross.
pub const RAGE_CROSS_VOLLEYS: usize = 2;

/// Pause after each rage cross volley.
pub const RAGE_CROSS_GAP: f32 = 0.4;

// ============================================================================
// Teleport
// ============================================================================

/// Delay between a teleport and its follow-up fan volley.
pub const TELEPORT_VOLLEY_DELAY: f32 = 0.2;

/// Angular spacing of the three-projectile teleport fan (degrees).
pub const TELEPORT_FAN_DEG: f32 = 30.0;

// ============================================================================
// Simulation
// ============================================================================

/// Fixed frame length used by the headless runner (seconds).
pub const HEADLESS_FRAME_SECS: f64 = 1.0 / 60.0;

/// Distance under which the boss counts as having reached its move target.
pub const ARRIVAL_EPSILON: f32 = 0.05;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_fires_multiple_pairs() {
        let pairs = (ROTATION_DURATION / ROTATION_SHOT_INTERVAL).floor();
        assert!(pairs >= 10.0);
    }

    #[test]
    fn test_rage_multipliers_make_boss_faster() {
        assert!(RAGE_SPEED_MULTIPLIER > 1.0);
        assert!(RAGE_INTERVAL_MULTIPLIER > 0.0 && RAGE_INTERVAL_MULTIPLIER < 1.0);
    }

    #[test]
    fn test_volley_counts_are_positive() {
        assert!(SPREAD_PROJECTILES > 0);
        assert!(SPREAD_VOLLEYS > 0);
        assert!(CROSS_VOLLEYS > 0);
        assert!(RAGE_ROUNDS > 0);
        assert!(RAGE_SPREAD_PROJECTILES > 0);
    }
}
