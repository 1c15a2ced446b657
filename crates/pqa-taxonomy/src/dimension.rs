//! Dimension identifiers
//!
//! Closed enumerations for the two assertion layers:
//! - Structural dimensions test whether an expected plan element is present
//! - Grounding dimensions test whether a present value matches the scenario
//!
//! IDs are closed enums rather than free strings so an unregistered ID is a
//! parse error at the boundary, never silent drift inside the pipeline.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which evaluation discipline an assertion belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Presence/shape of an expected element, independent of correctness
    Structural,
    /// Accuracy of a present value against the scenario
    Grounding,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structural => write!(f, "structural"),
            Self::Grounding => write!(f, "grounding"),
        }
    }
}

/// Assertion severity band
///
/// Assigned by a fixed dimension precedence table, never by the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionLevel {
    /// Must hold for any acceptable plan
    Critical,
    /// Expected of a good plan
    Expected,
    /// Nice to have
    Aspirational,
}

/// Structural dimension catalog (presence checks)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StructuralDimension {
    /// S1 - the plan states its objective
    ObjectiveStated,
    /// S2 - the plan lists attendees/participants
    AttendeesListed,
    /// S3 - the plan specifies date, time, and timezone
    ScheduleSpecified,
    /// S4 - the plan carries agenda topics
    AgendaTopics,
    /// S5 - tasks have named owners
    TaskOwnership,
    /// S6 - supporting artifacts are referenced
    ArtifactsReferenced,
    /// S7 - cross-task dependencies are noted
    DependenciesNoted,
    /// S8 - risks or open issues are anticipated
    RisksAnticipated,
}

impl StructuralDimension {
    /// All structural dimensions, catalog order
    pub const ALL: [Self; 8] = [
        Self::ObjectiveStated,
        Self::AttendeesListed,
        Self::ScheduleSpecified,
        Self::AgendaTopics,
        Self::TaskOwnership,
        Self::ArtifactsReferenced,
        Self::DependenciesNoted,
        Self::RisksAnticipated,
    ];

    /// Stable catalog ID ("S1".."S8")
    #[inline]
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::ObjectiveStated => "S1",
            Self::AttendeesListed => "S2",
            Self::ScheduleSpecified => "S3",
            Self::AgendaTopics => "S4",
            Self::TaskOwnership => "S5",
            Self::ArtifactsReferenced => "S6",
            Self::DependenciesNoted => "S7",
            Self::RisksAnticipated => "S8",
        }
    }

    /// Human-readable name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ObjectiveStated => "Objective Stated",
            Self::AttendeesListed => "Attendees Listed",
            Self::ScheduleSpecified => "Schedule Specified",
            Self::AgendaTopics => "Agenda Topics",
            Self::TaskOwnership => "Task Ownership",
            Self::ArtifactsReferenced => "Artifacts Referenced",
            Self::DependenciesNoted => "Dependencies Noted",
            Self::RisksAnticipated => "Risks Anticipated",
        }
    }

    /// Scoring weight (1-3)
    #[inline]
    #[must_use]
    pub fn weight(&self) -> u32 {
        match self {
            Self::ObjectiveStated | Self::AttendeesListed | Self::ScheduleSpecified => 3,
            Self::AgendaTopics | Self::TaskOwnership | Self::ArtifactsReferenced => 2,
            Self::DependenciesNoted | Self::RisksAnticipated => 1,
        }
    }

    /// Placeholder text pattern for assertion generation, where one exists
    #[must_use]
    pub fn template(&self) -> Option<&'static str> {
        match self {
            Self::AttendeesListed => Some("The plan lists {attendees} as participants"),
            Self::ScheduleSpecified => Some("The plan schedules the meeting for {date} at {time} {timezone}"),
            Self::TaskOwnership => Some("Each task in the plan names an owner"),
            _ => None,
        }
    }
}

impl FromStr for StructuralDimension {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|d| d.id() == s)
            .copied()
            .ok_or_else(|| CatalogError::UnknownDimension(s.to_string()))
    }
}

impl std::fmt::Display for StructuralDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Grounding dimension catalog (accuracy checks)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GroundingDimension {
    /// G1 - named people exist in the scenario attendee list
    AttendeeGrounding,
    /// G2 - stated date/time/timezone match the scenario schedule
    DateTimeGrounding,
    /// G3 - referenced artifacts exist in the scenario artifact list
    ArtifactGrounding,
    /// G4 - agenda topics match the scenario discussion points
    TopicGrounding,
    /// G5 - the stated organizer matches the scenario organizer
    OrganizerGrounding,
    /// G6 - stated dependencies match the scenario dependency list
    DependencyGrounding,
}

impl GroundingDimension {
    /// All grounding dimensions, catalog order
    pub const ALL: [Self; 6] = [
        Self::AttendeeGrounding,
        Self::DateTimeGrounding,
        Self::ArtifactGrounding,
        Self::TopicGrounding,
        Self::OrganizerGrounding,
        Self::DependencyGrounding,
    ];

    /// Stable catalog ID ("G1".."G6")
    #[inline]
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::AttendeeGrounding => "G1",
            Self::DateTimeGrounding => "G2",
            Self::ArtifactGrounding => "G3",
            Self::TopicGrounding => "G4",
            Self::OrganizerGrounding => "G5",
            Self::DependencyGrounding => "G6",
        }
    }

    /// Human-readable name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AttendeeGrounding => "Attendee Grounding",
            Self::DateTimeGrounding => "Date/Time Grounding",
            Self::ArtifactGrounding => "Artifact Grounding",
            Self::TopicGrounding => "Topic Grounding",
            Self::OrganizerGrounding => "Organizer Grounding",
            Self::DependencyGrounding => "Dependency Grounding",
        }
    }

    /// Scenario attribute this dimension verifies against
    #[inline]
    #[must_use]
    pub fn source_field(&self) -> &'static str {
        match self {
            Self::AttendeeGrounding => "attendees",
            Self::DateTimeGrounding => "schedule",
            Self::ArtifactGrounding => "artifacts",
            Self::TopicGrounding => "topics",
            Self::OrganizerGrounding => "organizer",
            Self::DependencyGrounding => "dependencies",
        }
    }

    /// Scoring weight (1-3)
    #[inline]
    #[must_use]
    pub fn weight(&self) -> u32 {
        match self {
            Self::AttendeeGrounding | Self::DateTimeGrounding => 3,
            Self::ArtifactGrounding | Self::OrganizerGrounding => 2,
            Self::TopicGrounding | Self::DependencyGrounding => 1,
        }
    }
}

impl FromStr for GroundingDimension {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|d| d.id() == s)
            .copied()
            .ok_or_else(|| CatalogError::UnknownDimension(s.to_string()))
    }
}

impl std::fmt::Display for GroundingDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Tagged dimension identifier
///
/// `Unmapped` is the classifier's degraded value for input it could not
/// classify; it never appears in the static catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DimensionId {
    /// A structural dimension
    Structural(StructuralDimension),
    /// A grounding dimension
    Grounding(GroundingDimension),
    /// Sentinel for unclassifiable input
    Unmapped,
}

impl DimensionId {
    /// Stable ID string
    #[inline]
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::Structural(d) => d.id(),
            Self::Grounding(d) => d.id(),
            Self::Unmapped => "UNMAPPED",
        }
    }

    /// Layer of this dimension; `Unmapped` reports as structural since it
    /// only ever tags primary records
    #[inline]
    #[must_use]
    pub fn layer(&self) -> Layer {
        match self {
            Self::Structural(_) | Self::Unmapped => Layer::Structural,
            Self::Grounding(_) => Layer::Grounding,
        }
    }

    /// True for the unmapped sentinel
    #[inline]
    #[must_use]
    pub fn is_unmapped(&self) -> bool {
        matches!(self, Self::Unmapped)
    }
}

impl FromStr for DimensionId {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "UNMAPPED" || s == "UNKNOWN" {
            return Ok(Self::Unmapped);
        }
        if let Ok(d) = StructuralDimension::from_str(s) {
            return Ok(Self::Structural(d));
        }
        if let Ok(d) = GroundingDimension::from_str(s) {
            return Ok(Self::Grounding(d));
        }
        Err(CatalogError::UnknownDimension(s.to_string()))
    }
}

impl std::fmt::Display for DimensionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl From<StructuralDimension> for DimensionId {
    fn from(d: StructuralDimension) -> Self {
        Self::Structural(d)
    }
}

impl From<GroundingDimension> for DimensionId {
    fn from(d: GroundingDimension) -> Self {
        Self::Grounding(d)
    }
}

// String conversions for serde (IDs persist as "S1", "G4", "UNMAPPED")

impl TryFrom<String> for StructuralDimension {
    type Error = CatalogError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<StructuralDimension> for String {
    fn from(d: StructuralDimension) -> Self {
        d.id().to_string()
    }
}

impl TryFrom<String> for GroundingDimension {
    type Error = CatalogError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<GroundingDimension> for String {
    fn from(d: GroundingDimension) -> Self {
        d.id().to_string()
    }
}

impl TryFrom<String> for DimensionId {
    type Error = CatalogError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DimensionId> for String {
    fn from(d: DimensionId) -> Self {
        d.id().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_ids_round_trip() {
        for dim in StructuralDimension::ALL {
            assert_eq!(dim.id().parse::<StructuralDimension>().unwrap(), dim);
        }
    }

    #[test]
    fn grounding_ids_round_trip() {
        for dim in GroundingDimension::ALL {
            assert_eq!(dim.id().parse::<GroundingDimension>().unwrap(), dim);
        }
    }

    #[test]
    fn unknown_id_is_an_error() {
        let err = "S99".parse::<DimensionId>().unwrap_err();
        assert!(matches!(err, CatalogError::UnknownDimension(_)));
    }

    #[test]
    fn unmapped_sentinel_parses() {
        assert_eq!("UNMAPPED".parse::<DimensionId>().unwrap(), DimensionId::Unmapped);
        assert_eq!("UNKNOWN".parse::<DimensionId>().unwrap(), DimensionId::Unmapped);
    }

    #[test]
    fn dimension_id_serde_as_string() {
        let id: DimensionId = StructuralDimension::AttendeesListed.into();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"S2\"");
        let back: DimensionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn weights_are_in_band() {
        for dim in StructuralDimension::ALL {
            assert!((1..=3).contains(&dim.weight()));
        }
        for dim in GroundingDimension::ALL {
            assert!((1..=3).contains(&dim.weight()));
        }
    }

    #[test]
    fn grounding_source_fields_are_nonempty() {
        for dim in GroundingDimension::ALL {
            assert!(!dim.source_field().is_empty());
        }
    }
}
