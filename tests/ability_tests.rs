//! Integration tests for player abilities and time scale ownership
//!
//! These tests verify that:
//! - The shipped ability config is valid
//! - Timed abilities expire on unscaled time and then cool down
//! - Only one time ability holds the time scale at once
//! - Toggle abilities never expire

use chronoboss::encounter::ability_config::{
    load_ability_definitions, parse_ability_definitions, AbilityDefinitions,
};
use chronoboss::encounter::{AbilityController, AbilityType, ActivationRejection, TimeAuthority};

fn unlocked_controller() -> AbilityController {
    let mut controller = AbilityController::new(&AbilityDefinitions::default());
    for ability in AbilityType::ALL {
        controller.unlock(ability);
    }
    controller
}

/// Tick in quarter-second steps, which sum exactly in f32
fn run_for(
    controller: &mut AbilityController,
    authority: &mut TimeAuthority,
    seconds: f32,
) -> Vec<AbilityType> {
    let steps = (seconds / 0.25).round() as usize;
    let mut expired = Vec::new();
    for _ in 0..steps {
        expired.extend(controller.tick(0.25, authority));
    }
    expired
}

// =============================================================================
// Config Validation Tests
// =============================================================================

#[test]
fn test_shipped_definitions_are_valid() {
    let definitions = load_ability_definitions().expect("shipped abilities.ron should load");

    for ability in AbilityType::ALL {
        let config = definitions
            .get(&ability)
            .unwrap_or_else(|| panic!("{:?} missing from abilities.ron", ability));
        assert!(config.cooldown >= 0.0, "{:?} has a negative cooldown", ability);
        if ability.is_time_ability() {
            let scale = config.time_scale.expect("time abilities need a time_scale");
            assert!(scale > 0.0 && scale <= 1.0, "{:?} scale out of range", ability);
        }
    }
}

#[test]
fn test_anti_gravity_is_a_grounded_toggle() {
    let definitions = AbilityDefinitions::default();
    let config = definitions.get(&AbilityType::AntiGravity).unwrap();
    assert!(config.is_toggle());
    assert!(config.requires_grounded);
}

#[test]
fn test_time_ability_without_scale_is_rejected() {
    let contents = r#"(
        abilities: {
            AntiGravity: (name: "Anti Gravity", duration: 0.0, cooldown: 0.0),
            TimeStop: (name: "Time Stop", duration: 3.0, cooldown: 10.0),
            TimeSlowDown: (name: "Time Slow Down", duration: 5.0, cooldown: 8.0, time_scale: Some(0.3)),
        },
    )"#;
    assert!(parse_ability_definitions(contents).is_err());
}

// =============================================================================
// Activation Lifecycle Tests
// =============================================================================

#[test]
fn test_time_stop_lifecycle() {
    let mut controller = unlocked_controller();
    let mut authority = TimeAuthority::default();

    assert!(controller.activate(AbilityType::TimeStop, &mut authority));
    assert!((authority.effective_scale() - 0.01).abs() < 1e-6);

    let expired = run_for(&mut controller, &mut authority, 3.0);
    assert_eq!(expired, vec![AbilityType::TimeStop]);
    assert!(!controller.is_active(AbilityType::TimeStop));
    assert_eq!(authority.effective_scale(), 1.0);

    // Still cooling down: 10 s cooldown started at activation
    assert_eq!(
        controller.try_activate(AbilityType::TimeStop, &mut authority),
        Err(ActivationRejection::CoolingDown)
    );

    run_for(&mut controller, &mut authority, 7.0);
    assert_eq!(controller.remaining_cooldown(AbilityType::TimeStop), 0.0);
    assert!(controller.activate(AbilityType::TimeStop, &mut authority));
}

#[test]
fn test_locked_ability_cannot_activate() {
    let mut controller = AbilityController::new(&AbilityDefinitions::default());
    let mut authority = TimeAuthority::default();

    assert_eq!(
        controller.try_activate(AbilityType::TimeSlowDown, &mut authority),
        Err(ActivationRejection::Locked)
    );
    assert_eq!(authority.effective_scale(), 1.0);

    assert!(controller.unlock(AbilityType::TimeSlowDown));
    assert!(!controller.unlock(AbilityType::TimeSlowDown), "unlock only reports the first time");
    assert!(controller.activate(AbilityType::TimeSlowDown, &mut authority));
}

#[test]
fn test_time_abilities_are_mutually_exclusive() {
    let mut controller = unlocked_controller();
    let mut authority = TimeAuthority::default();

    assert!(controller.activate(AbilityType::TimeSlowDown, &mut authority));
    assert_eq!(
        controller.try_activate(AbilityType::TimeStop, &mut authority),
        Err(ActivationRejection::OtherTimeAbilityActive(AbilityType::TimeSlowDown))
    );
    assert!((authority.effective_scale() - 0.3).abs() < 1e-6);
    // The refused ability did not start its cooldown
    assert_eq!(controller.remaining_cooldown(AbilityType::TimeStop), 0.0);

    assert!(controller.deactivate(AbilityType::TimeSlowDown, &mut authority));
    assert!(controller.activate(AbilityType::TimeStop, &mut authority));
    assert!((authority.effective_scale() - 0.01).abs() < 1e-6);
}

#[test]
fn test_anti_gravity_toggle_never_expires() {
    let mut controller = unlocked_controller();
    let mut authority = TimeAuthority::default();

    assert_eq!(controller.toggle(AbilityType::AntiGravity, &mut authority), Ok(true));
    let expired = run_for(&mut controller, &mut authority, 30.0);
    assert!(expired.is_empty());
    assert!(controller.is_active(AbilityType::AntiGravity));
    // Not a time ability
    assert_eq!(authority.effective_scale(), 1.0);

    assert_eq!(controller.toggle(AbilityType::AntiGravity, &mut authority), Ok(false));
    assert!(!controller.is_active(AbilityType::AntiGravity));
}

#[test]
fn test_anti_gravity_runs_alongside_time_ability() {
    let mut controller = unlocked_controller();
    let mut authority = TimeAuthority::default();

    assert!(controller.activate(AbilityType::AntiGravity, &mut authority));
    assert!(controller.activate(AbilityType::TimeStop, &mut authority));
    assert!(controller.is_active(AbilityType::AntiGravity));
    assert!(controller.any_time_ability_active());
    controller.debug_validate(&authority);
}

#[test]
fn test_deactivate_is_idempotent() {
    let mut controller = unlocked_controller();
    let mut authority = TimeAuthority::default();

    assert!(!controller.deactivate(AbilityType::TimeStop, &mut authority));
    assert!(controller.activate(AbilityType::TimeStop, &mut authority));
    assert!(controller.deactivate(AbilityType::TimeStop, &mut authority));
    assert!(!controller.deactivate(AbilityType::TimeStop, &mut authority));
    assert_eq!(authority.effective_scale(), 1.0);
}
