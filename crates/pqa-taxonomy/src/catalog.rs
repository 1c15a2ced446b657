//! Dimension catalog and the Structural→Grounding applicability map
//!
//! The catalog is built once at startup via [`Catalog::load`], which parses
//! the static map declaration and rejects any reference to an unregistered
//! dimension. Lookups after load are infallible except for unknown ID
//! strings, which fail fast.

use crate::dimension::{
    AssertionLevel, DimensionId, GroundingDimension, Layer, StructuralDimension,
};
use crate::error::CatalogError;
use indexmap::IndexMap;
use std::str::FromStr;

/// One grounding check applicable to a structural concern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingCandidate {
    /// The grounding dimension
    pub dimension: GroundingDimension,
    /// Why this grounding check applies to the structural concern
    pub rationale: &'static str,
}

/// Read-only view of one catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionInfo {
    /// Stable ID string
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Structural or grounding
    pub layer: Layer,
    /// Scoring weight (1-3; 1 for the unmapped sentinel)
    pub weight: u32,
    /// Severity band from the precedence table
    pub level: AssertionLevel,
    /// Placeholder text pattern, where one exists
    pub template: Option<&'static str>,
    /// Scenario attribute verified against (grounding only)
    pub source_field: Option<&'static str>,
}

/// Static applicability declaration, parsed and validated at load time.
///
/// Structural dimensions with no candidates (S1, S8) are deliberately keyed
/// with empty lists; an absent key would be a load error.
const RAW_MAP: &[(&str, &[(&str, &str)])] = &[
    ("S1", &[]),
    (
        "S2",
        &[
            ("G1", "listed participants must exist in the scenario attendee roster"),
            ("G5", "the stated organizer must match the scenario organizer"),
        ],
    ),
    (
        "S3",
        &[("G2", "stated date, time, and timezone must match the scenario schedule")],
    ),
    (
        "S4",
        &[("G4", "agenda topics must come from the scenario discussion points")],
    ),
    (
        "S5",
        &[("G1", "task owners must be drawn from the scenario attendee roster")],
    ),
    (
        "S6",
        &[("G3", "referenced artifacts must exist in the scenario artifact list")],
    ),
    (
        "S7",
        &[("G6", "noted dependencies must match the scenario dependency list")],
    ),
    ("S8", &[]),
];

/// The dimension catalog
///
/// Immutable after [`Catalog::load`]; shared by reference everywhere.
#[derive(Debug, Clone)]
pub struct Catalog {
    map: IndexMap<StructuralDimension, Vec<GroundingCandidate>>,
}

impl Catalog {
    /// Build the catalog, validating the applicability map
    ///
    /// # Errors
    /// - `CatalogError::DanglingMapKey` if a map key is not a structural ID
    /// - `CatalogError::DanglingCandidate` if a candidate is not a grounding ID
    /// - `CatalogError::DuplicateMapKey` if a structural ID is keyed twice
    pub fn load() -> Result<Self, CatalogError> {
        let mut map = IndexMap::with_capacity(RAW_MAP.len());

        for (key, candidates) in RAW_MAP {
            let structural = StructuralDimension::from_str(key)
                .map_err(|_| CatalogError::DanglingMapKey((*key).to_string()))?;

            let mut parsed = Vec::with_capacity(candidates.len());
            for (id, rationale) in *candidates {
                let dimension =
                    GroundingDimension::from_str(id).map_err(|_| CatalogError::DanglingCandidate {
                        structural: (*key).to_string(),
                        grounding: (*id).to_string(),
                    })?;
                parsed.push(GroundingCandidate {
                    dimension,
                    rationale,
                });
            }

            if map.insert(structural, parsed).is_some() {
                return Err(CatalogError::DuplicateMapKey((*key).to_string()));
            }
        }

        Ok(Self { map })
    }

    /// Look up catalog info for an ID string
    ///
    /// # Errors
    /// `CatalogError::UnknownDimension` for unregistered IDs.
    pub fn get(&self, id: &str) -> Result<DimensionInfo, CatalogError> {
        let dimension = DimensionId::from_str(id)?;
        Ok(self.info(dimension))
    }

    /// Catalog info for a parsed dimension
    #[must_use]
    pub fn info(&self, dimension: DimensionId) -> DimensionInfo {
        match dimension {
            DimensionId::Structural(d) => DimensionInfo {
                id: d.id(),
                name: d.name(),
                layer: Layer::Structural,
                weight: d.weight(),
                level: self.level_of(dimension),
                template: d.template(),
                source_field: None,
            },
            DimensionId::Grounding(d) => DimensionInfo {
                id: d.id(),
                name: d.name(),
                layer: Layer::Grounding,
                weight: d.weight(),
                level: self.level_of(dimension),
                template: None,
                source_field: Some(d.source_field()),
            },
            DimensionId::Unmapped => DimensionInfo {
                id: "UNMAPPED",
                name: "Unmapped",
                layer: Layer::Structural,
                weight: 1,
                level: AssertionLevel::Expected,
                template: None,
                source_field: None,
            },
        }
    }

    /// Scoring weight for a dimension
    ///
    /// Defaults to 1 for the unmapped sentinel: weighting must never block
    /// scoring.
    #[inline]
    #[must_use]
    pub fn weight_of(&self, dimension: DimensionId) -> u32 {
        match dimension {
            DimensionId::Structural(d) => d.weight(),
            DimensionId::Grounding(d) => d.weight(),
            DimensionId::Unmapped => 1,
        }
    }

    /// Severity band from the fixed precedence table
    ///
    /// S1-S3 and G1-G2 are always critical, S8 is always aspirational, the
    /// remainder default to expected.
    #[must_use]
    pub fn level_of(&self, dimension: DimensionId) -> AssertionLevel {
        match dimension {
            DimensionId::Structural(
                StructuralDimension::ObjectiveStated
                | StructuralDimension::AttendeesListed
                | StructuralDimension::ScheduleSpecified,
            )
            | DimensionId::Grounding(
                GroundingDimension::AttendeeGrounding | GroundingDimension::DateTimeGrounding,
            ) => AssertionLevel::Critical,
            DimensionId::Structural(StructuralDimension::RisksAnticipated) => {
                AssertionLevel::Aspirational
            }
            _ => AssertionLevel::Expected,
        }
    }

    /// Ordered candidate grounding checks for a structural dimension
    ///
    /// Empty for dimensions with no applicable grounding concern.
    #[inline]
    #[must_use]
    pub fn candidates_for(&self, structural: StructuralDimension) -> &[GroundingCandidate] {
        self.map.get(&structural).map_or(&[], Vec::as_slice)
    }

    /// Iterate the applicability map in catalog order
    pub fn applicability(
        &self,
    ) -> impl Iterator<Item = (StructuralDimension, &[GroundingCandidate])> {
        self.map.iter().map(|(k, v)| (*k, v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_loads() {
        let catalog = Catalog::load().unwrap();
        assert_eq!(catalog.applicability().count(), StructuralDimension::ALL.len());
    }

    #[test]
    fn every_structural_dimension_is_keyed() {
        let catalog = Catalog::load().unwrap();
        for dim in StructuralDimension::ALL {
            // Empty lists are legal; an absent key is not.
            let _ = catalog.candidates_for(dim);
            assert!(catalog.applicability().any(|(k, _)| k == dim));
        }
    }

    #[test]
    fn empty_candidate_sets_are_legal() {
        let catalog = Catalog::load().unwrap();
        assert!(catalog
            .candidates_for(StructuralDimension::ObjectiveStated)
            .is_empty());
        assert!(catalog
            .candidates_for(StructuralDimension::RisksAnticipated)
            .is_empty());
    }

    #[test]
    fn attendee_candidates_are_ordered() {
        let catalog = Catalog::load().unwrap();
        let candidates = catalog.candidates_for(StructuralDimension::AttendeesListed);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].dimension, GroundingDimension::AttendeeGrounding);
        assert_eq!(candidates[1].dimension, GroundingDimension::OrganizerGrounding);
        assert!(!candidates[0].rationale.is_empty());
    }

    #[test]
    fn weight_of_unmapped_defaults_to_one() {
        let catalog = Catalog::load().unwrap();
        assert_eq!(catalog.weight_of(DimensionId::Unmapped), 1);
    }

    #[test]
    fn level_precedence_table() {
        let catalog = Catalog::load().unwrap();
        assert_eq!(
            catalog.level_of(StructuralDimension::ObjectiveStated.into()),
            AssertionLevel::Critical
        );
        assert_eq!(
            catalog.level_of(StructuralDimension::RisksAnticipated.into()),
            AssertionLevel::Aspirational
        );
        assert_eq!(
            catalog.level_of(StructuralDimension::TaskOwnership.into()),
            AssertionLevel::Expected
        );
        assert_eq!(
            catalog.level_of(GroundingDimension::DateTimeGrounding.into()),
            AssertionLevel::Critical
        );
        assert_eq!(
            catalog.level_of(GroundingDimension::TopicGrounding.into()),
            AssertionLevel::Expected
        );
    }

    #[test]
    fn get_by_id_string() {
        let catalog = Catalog::load().unwrap();
        let info = catalog.get("G1").unwrap();
        assert_eq!(info.layer, Layer::Grounding);
        assert_eq!(info.source_field, Some("attendees"));

        assert!(catalog.get("S99").is_err());
    }
}
