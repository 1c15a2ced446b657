//! Ground-truth scenario record
//!
//! The single source of truth for grounding checks. Created once per
//! evaluation unit and never mutated by evaluation; grounding values are
//! always read from here, never re-derived from the plan.

use serde::{Deserialize, Serialize};

/// Authoritative context record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// People attending
    pub attendees: Vec<String>,
    /// Meeting organizer
    pub organizer: String,
    /// Date (ISO `YYYY-MM-DD`)
    pub date: String,
    /// Start time (`HH:MM`)
    pub time: String,
    /// Timezone name
    pub timezone: String,
    /// Supporting artifacts (documents, decks)
    pub artifacts: Vec<String>,
    /// Discussion points
    pub topics: Vec<String>,
    /// Cross-task dependencies
    pub dependencies: Vec<String>,
}

impl Scenario {
    /// Fixed fallback scenario used when synthesis output is unusable
    ///
    /// Non-empty placeholders so downstream stages never receive a null
    /// scenario.
    #[must_use]
    pub fn minimal_default() -> Self {
        Self {
            attendees: vec!["Placeholder Attendee".to_string()],
            organizer: "Placeholder Organizer".to_string(),
            date: "2025-01-01".to_string(),
            time: "09:00".to_string(),
            timezone: "UTC".to_string(),
            artifacts: vec!["placeholder.docx".to_string()],
            topics: vec!["placeholder topic".to_string()],
            dependencies: Vec::new(),
        }
    }

    /// Authoritative values for a grounding source field
    ///
    /// Field names match [`pqa_taxonomy::GroundingDimension::source_field`].
    /// Unknown fields yield an empty list.
    #[must_use]
    pub fn values_for(&self, source_field: &str) -> Vec<String> {
        match source_field {
            "attendees" => self.attendees.clone(),
            "organizer" => vec![self.organizer.clone()],
            "schedule" => vec![format!("{} {} {}", self.date, self.time, self.timezone)],
            "artifacts" => self.artifacts.clone(),
            "topics" => self.topics.clone(),
            "dependencies" => self.dependencies.clone(),
            _ => Vec::new(),
        }
    }

    /// Compact rendering for oracle payloads
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "attendees: {}; organizer: {}; schedule: {} {} {}; artifacts: {}; topics: {}; dependencies: {}",
            self.attendees.join(", "),
            self.organizer,
            self.date,
            self.time,
            self.timezone,
            self.artifacts.join(", "),
            self.topics.join(", "),
            self.dependencies.join(", "),
        )
    }
}
