//! Encounter logging
//!
//! Records everything that happens in an encounter for post-run analysis.
//! Entries carry a human-readable message plus optional structured data so
//! tests and tools can aggregate without parsing text.

use bevy::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Directory used when no output path is given
pub const DEFAULT_LOG_DIR: &str = "encounter_logs";

/// A single entry in the encounter log
#[derive(Debug, Clone, Serialize)]
pub struct CombatLogEntry {
    /// Real seconds since the encounter started
    pub timestamp: f32,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
    /// Machine-readable payload, when the event has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StructuredEventData>,
}

/// Types of log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CombatLogEventType {
    Damage,
    Healing,
    /// Ability switched on
    AbilityUsed,
    /// Ability switched off or ran out
    AbilityEnded,
    /// Activation refused
    AbilityRejected,
    /// Boss changed phase
    PhaseChange,
    Death,
    /// Encounter lifecycle (start, boss wake-up, restart, end)
    EncounterEvent,
}

/// Structured payloads for aggregation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StructuredEventData {
    Damage {
        source: String,
        target: String,
        cause: String,
        amount: f32,
        killing_blow: bool,
    },
    Healing {
        target: String,
        source_name: String,
        amount: f32,
    },
    PhaseChange {
        from: String,
        to: String,
    },
}

/// Final state of one combatant, written with the log
#[derive(Debug, Clone, Serialize)]
pub struct CombatantMetadata {
    pub name: String,
    pub max_health: f32,
    pub final_health: f32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub final_position: (f32, f32),
}

/// Summary of a finished encounter
#[derive(Debug, Clone, Serialize)]
pub struct EncounterMetadata {
    /// "Victory", "Defeat" or "Timeout"
    pub outcome: String,
    pub duration_secs: f32,
    pub random_seed: Option<u64>,
    pub combatants: Vec<CombatantMetadata>,
}

#[derive(Serialize)]
struct SavedLog<'a> {
    metadata: &'a EncounterMetadata,
    entries: &'a [CombatLogEntry],
}

/// The encounter log resource storing all events
#[derive(Resource, Default, Debug)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current encounter time
    pub encounter_time: f32,
}

impl CombatLog {
    /// Clear the log for a new encounter
    pub fn clear(&mut self) {
        self.entries.clear();
        self.encounter_time = 0.0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.push(event_type, message, None);
    }

    fn push(&mut self, event_type: CombatLogEventType, message: String, data: Option<StructuredEventData>) {
        self.entries.push(CombatLogEntry {
            timestamp: self.encounter_time,
            event_type,
            message,
            data,
        });
    }

    /// Log damage with structured data
    pub fn log_damage(
        &mut self,
        source: String,
        target: String,
        cause: String,
        amount: f32,
        killing_blow: bool,
        message: String,
    ) {
        self.push(
            CombatLogEventType::Damage,
            message,
            Some(StructuredEventData::Damage {
                source,
                target,
                cause,
                amount,
                killing_blow,
            }),
        );
    }

    /// Log healing with structured data
    pub fn log_healing(&mut self, target: String, source_name: String, amount: f32, message: String) {
        self.push(
            CombatLogEventType::Healing,
            message,
            Some(StructuredEventData::Healing {
                target,
                source_name,
                amount,
            }),
        );
    }

    /// Log a boss phase transition
    pub fn log_phase_change(&mut self, from: &str, to: &str) {
        self.push(
            CombatLogEventType::PhaseChange,
            format!("Boss phase: {} -> {}", from, to),
            Some(StructuredEventData::PhaseChange {
                from: from.to_string(),
                to: to.to_string(),
            }),
        );
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get only HP-changing events (damage and healing)
    pub fn hp_changes_only(&self) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    CombatLogEventType::Damage | CombatLogEventType::Healing
                )
            })
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Total damage dealt by `source`, grouped by cause
    pub fn damage_by_cause(&self, source_name: &str) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for entry in &self.entries {
            if let Some(StructuredEventData::Damage {
                source,
                cause,
                amount,
                ..
            }) = &entry.data
            {
                if source == source_name {
                    *totals.entry(cause.clone()).or_insert(0.0) += amount;
                }
            }
        }
        totals
    }

    /// Total damage taken by `target`
    pub fn damage_taken_by(&self, target_name: &str) -> f32 {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.data {
                Some(StructuredEventData::Damage { target, amount, .. }) if target == target_name => {
                    Some(*amount)
                }
                _ => None,
            })
            .sum()
    }

    /// Total healing received by `target`
    pub fn healing_received_by(&self, target_name: &str) -> f32 {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.data {
                Some(StructuredEventData::Healing { target, amount, .. })
                    if target == target_name =>
                {
                    Some(*amount)
                }
                _ => None,
            })
            .sum()
    }

    /// Number of killing blows landed by `source`
    pub fn killing_blows(&self, source_name: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| {
                matches!(
                    &entry.data,
                    Some(StructuredEventData::Damage { source, killing_blow: true, .. })
                        if source == source_name
                )
            })
            .count()
    }

    /// Boss phases entered, in order
    pub fn phase_history(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.data {
                Some(StructuredEventData::PhaseChange { to, .. }) => Some(to.clone()),
                _ => None,
            })
            .collect()
    }

    /// Write the log and metadata as pretty JSON.
    ///
    /// Without `output_path` a timestamped file is created under
    /// [`DEFAULT_LOG_DIR`]. Returns the path written.
    pub fn save_to_file(
        &self,
        metadata: &EncounterMetadata,
        output_path: Option<&str>,
    ) -> Result<String, String> {
        let path = match output_path {
            Some(path) => PathBuf::from(path),
            None => {
                let stamp = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default();
                PathBuf::from(DEFAULT_LOG_DIR).join(format!("encounter_{}.json", stamp))
            }
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }

        let saved = SavedLog {
            metadata,
            entries: &self.entries,
        };
        let json = serde_json::to_string_pretty(&saved)
            .map_err(|e| format!("Failed to serialize encounter log: {}", e))?;
        std::fs::write(&path, json)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;

        Ok(path.display().to_string())
    }
}
