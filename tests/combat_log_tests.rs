//! Unit tests for combat log query and aggregation methods
//!
//! These tests verify that the CombatLog correctly:
//! - Aggregates damage by cause and by target
//! - Counts killing blows
//! - Records the boss phase history
//! - Writes messages the live systems produce in a stable format

use chronoboss::combat::log::{
    CombatLog, CombatLogEventType, CombatantMetadata, EncounterMetadata, StructuredEventData,
};
use chronoboss::headless::{build_encounter_app, run_until_complete, HeadlessEncounterConfig};
use regex::Regex;

fn create_test_log() -> CombatLog {
    CombatLog::default()
}

fn hit(log: &mut CombatLog, source: &str, target: &str, cause: &str, amount: f32, killing_blow: bool) {
    log.log_damage(
        source.to_string(),
        target.to_string(),
        cause.to_string(),
        amount,
        killing_blow,
        format!("{}'s {} hits {} for {:.0} damage", source, cause, target, amount),
    );
}

// =============================================================================
// Damage Aggregation Tests
// =============================================================================

#[test]
fn test_damage_by_cause_empty_log() {
    let log = create_test_log();
    let damage = log.damage_by_cause("Player");
    assert!(damage.is_empty(), "Empty log should return empty damage map");
}

#[test]
fn test_damage_by_cause_groups_per_cause() {
    let mut log = create_test_log();
    hit(&mut log, "Boss", "Player", "Projectile", 2.0, false);
    hit(&mut log, "Boss", "Player", "Contact", 1.0, false);
    hit(&mut log, "Boss", "Player", "Projectile", 2.0, true);
    hit(&mut log, "Player", "Boss", "Projectile", 1.0, false);

    let damage = log.damage_by_cause("Boss");
    assert_eq!(damage.len(), 2);
    assert_eq!(damage.get("Projectile"), Some(&4.0));
    assert_eq!(damage.get("Contact"), Some(&1.0));

    assert_eq!(log.damage_taken_by("Player"), 5.0);
    assert_eq!(log.damage_taken_by("Boss"), 1.0);
}

#[test]
fn test_killing_blows_only_counts_source() {
    let mut log = create_test_log();
    hit(&mut log, "Player", "Boss", "Projectile", 1.0, true);
    hit(&mut log, "Boss", "Player", "Contact", 1.0, false);

    assert_eq!(log.killing_blows("Player"), 1);
    assert_eq!(log.killing_blows("Boss"), 0);
}

#[test]
fn test_healing_received() {
    let mut log = create_test_log();
    log.log_healing("Player".into(), "Sugar".into(), 1.0, "Player heals 1 from Sugar".into());
    log.log_healing("Player".into(), "Sugar".into(), 1.0, "Player heals 1 from Sugar".into());
    assert_eq!(log.healing_received_by("Player"), 2.0);
    assert_eq!(log.healing_received_by("Boss"), 0.0);
    assert_eq!(log.hp_changes_only().len(), 2);
}

// =============================================================================
// Query Tests
// =============================================================================

#[test]
fn test_phase_history_in_order() {
    let mut log = create_test_log();
    log.log_phase_change("Idle", "Normal");
    log.log(CombatLogEventType::EncounterEvent, "Boss awakens".into());
    log.log_phase_change("Normal", "Spread Attack");
    log.log_phase_change("Spread Attack", "Normal");

    assert_eq!(log.phase_history(), vec!["Normal", "Spread Attack", "Normal"]);
    assert_eq!(log.filter_by_type(CombatLogEventType::PhaseChange).len(), 3);
    assert_eq!(
        log.entries[0].data,
        Some(StructuredEventData::PhaseChange {
            from: "Idle".into(),
            to: "Normal".into()
        })
    );
}

#[test]
fn test_recent_keeps_order() {
    let mut log = create_test_log();
    for i in 0..5 {
        log.encounter_time = i as f32;
        log.log(CombatLogEventType::EncounterEvent, format!("event {}", i));
    }
    let recent: Vec<&str> = log.recent(2).iter().map(|e| e.message.as_str()).collect();
    assert_eq!(recent, vec!["event 3", "event 4"]);
    assert_eq!(log.recent(2)[1].timestamp, 4.0);
}

#[test]
fn test_clear_resets_time() {
    let mut log = create_test_log();
    log.encounter_time = 12.0;
    log.log(CombatLogEventType::Death, "Boss has been defeated".into());
    log.clear();
    assert!(log.entries.is_empty());
    assert_eq!(log.encounter_time, 0.0);
}

#[test]
fn test_save_to_file_writes_metadata_and_entries() {
    let mut log = create_test_log();
    hit(&mut log, "Player", "Boss", "Projectile", 1.0, false);
    let metadata = EncounterMetadata {
        outcome: "Timeout".into(),
        duration_secs: 3.0,
        random_seed: Some(5),
        combatants: vec![CombatantMetadata {
            name: "Boss".into(),
            max_health: 50.0,
            final_health: 49.0,
            damage_dealt: 0.0,
            damage_taken: 1.0,
            final_position: (0.0, 2.0),
        }],
    };

    let path = std::env::temp_dir().join(format!("chronoboss_log_{}.json", std::process::id()));
    let written = log
        .save_to_file(&metadata, Some(path.to_str().unwrap()))
        .expect("log should save");
    let contents = std::fs::read_to_string(&written).unwrap();
    let _ = std::fs::remove_file(&written);

    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(json["metadata"]["outcome"], "Timeout");
    assert_eq!(json["metadata"]["random_seed"], 5);
    assert_eq!(json["entries"].as_array().map(|e| e.len()), Some(1));
}

// =============================================================================
// Live Message Format Tests
// =============================================================================

#[test]
fn test_live_encounter_messages_follow_format() {
    let config = HeadlessEncounterConfig {
        random_seed: Some(7),
        max_duration_secs: 20.0,
        unlocked_abilities: vec!["TimeSlowDown".into()],
        ..Default::default()
    };
    let mut app = build_encounter_app(&config).unwrap();
    run_until_complete(&mut app, 20 * 60 + 10).expect("encounter should finish");

    let damage = Regex::new(
        r"^(Player|Boss)'s (Bullet|Contact|Scripted Hit) hits (Player|Boss) for \d+ damage \(\d+ HP left\)$",
    )
    .unwrap();
    let phase = Regex::new(r"^Boss phase: [A-Za-z ]+ -> [A-Za-z ]+$").unwrap();

    let log = app.world().resource::<CombatLog>();
    assert!(!log.entries.is_empty());
    for entry in &log.entries {
        match entry.event_type {
            CombatLogEventType::Damage => {
                assert!(damage.is_match(&entry.message), "bad damage line: {}", entry.message)
            }
            CombatLogEventType::PhaseChange => {
                assert!(phase.is_match(&entry.message), "bad phase line: {}", entry.message)
            }
            _ => {}
        }
    }
    let mut last = 0.0;
    for entry in &log.entries {
        assert!(entry.timestamp >= last, "log timestamps must not go backwards");
        last = entry.timestamp;
    }
}
