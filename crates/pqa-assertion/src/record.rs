//! Assertion records
//!
//! The atomic unit of evaluation. Records form a two-level forest: primary
//! assertions (structural, standalone grounding, or unmapped) at the roots,
//! derived grounding assertions as children linked by an explicit
//! `parent_id` foreign key validated at insertion time.

use crate::error::AssertionError;
use pqa_taxonomy::{AssertionLevel, Catalog, DimensionId, GroundingDimension, Layer};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique assertion identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssertionId(pub Ulid);

impl AssertionId {
    /// Generate a new assertion ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for AssertionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AssertionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One atomic, testable assertion
///
/// Immutable after creation; evaluation results reference it by ID rather
/// than mutating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionRecord {
    /// Unique, stable within a run
    pub id: AssertionId,
    /// Owning structural assertion, for derived grounding assertions
    pub parent_id: Option<AssertionId>,
    /// Catalog dimension (or the unmapped sentinel)
    pub dimension: DimensionId,
    /// Structural or grounding discipline
    pub layer: Layer,
    /// Severity band from the precedence table
    pub level: AssertionLevel,
    /// The testable claim
    pub text: String,
    /// Source free-form input this record was decomposed from
    pub original_text: String,
    /// Scoring weight
    pub weight: u32,
}

impl AssertionRecord {
    /// True for root records
    #[inline]
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A validated set of assertion records
///
/// Insertion enforces the forest invariants:
/// - a grounding child's parent must exist and be structural (depth two, never deeper)
/// - a child's dimension must be among the catalog candidates for the
///   parent's dimension (the classifier narrows, never invents)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssertionSet {
    records: Vec<AssertionRecord>,
}

impl AssertionSet {
    /// Empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a primary (root) assertion
    ///
    /// The dimension may be structural, a standalone grounding dimension, or
    /// the unmapped sentinel. Level and weight come from the catalog.
    pub fn insert_primary(
        &mut self,
        catalog: &Catalog,
        dimension: DimensionId,
        text: impl Into<String>,
        original_text: impl Into<String>,
    ) -> AssertionId {
        let id = AssertionId::new();
        self.records.push(AssertionRecord {
            id,
            parent_id: None,
            dimension,
            layer: dimension.layer(),
            level: catalog.level_of(dimension),
            text: text.into(),
            original_text: original_text.into(),
            weight: catalog.weight_of(dimension),
        });
        id
    }

    /// Insert a grounding assertion under a structural parent
    ///
    /// # Errors
    /// - `AssertionError::UnknownParent` if the parent is not in this set
    /// - `AssertionError::ParentNotStructural` if the parent is not a
    ///   structural-layer record
    /// - `AssertionError::CandidateNotAllowed` if the grounding dimension is
    ///   not a catalog candidate for the parent's dimension
    pub fn insert_grounding(
        &mut self,
        catalog: &Catalog,
        parent_id: AssertionId,
        dimension: GroundingDimension,
        text: impl Into<String>,
        original_text: impl Into<String>,
    ) -> Result<AssertionId, AssertionError> {
        let parent = self
            .get(parent_id)
            .ok_or(AssertionError::UnknownParent(parent_id))?;

        if parent.layer != Layer::Structural || parent.parent_id.is_some() {
            return Err(AssertionError::ParentNotStructural(parent_id));
        }

        let allowed = match parent.dimension {
            DimensionId::Structural(structural) => catalog
                .candidates_for(structural)
                .iter()
                .any(|c| c.dimension == dimension),
            // The unmapped sentinel has no candidate set.
            _ => false,
        };
        if !allowed {
            return Err(AssertionError::CandidateNotAllowed {
                parent_dimension: parent.dimension.id().to_string(),
                grounding: dimension.id().to_string(),
            });
        }

        let id = AssertionId::new();
        let grounding: DimensionId = dimension.into();
        self.records.push(AssertionRecord {
            id,
            parent_id: Some(parent_id),
            dimension: grounding,
            layer: Layer::Grounding,
            level: catalog.level_of(grounding),
            text: text.into(),
            original_text: original_text.into(),
            weight: catalog.weight_of(grounding),
        });
        Ok(id)
    }

    /// Look up a record by ID
    #[must_use]
    pub fn get(&self, id: AssertionId) -> Option<&AssertionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// All records, insertion order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[AssertionRecord] {
        &self.records
    }

    /// Iterate records
    pub fn iter(&self) -> impl Iterator<Item = &AssertionRecord> {
        self.records.iter()
    }

    /// Structural-layer records
    pub fn structural(&self) -> impl Iterator<Item = &AssertionRecord> {
        self.records.iter().filter(|r| r.layer == Layer::Structural)
    }

    /// Grounding-layer records
    pub fn grounding(&self) -> impl Iterator<Item = &AssertionRecord> {
        self.records.iter().filter(|r| r.layer == Layer::Grounding)
    }

    /// Children of a structural record
    pub fn children_of(&self, id: AssertionId) -> impl Iterator<Item = &AssertionRecord> {
        self.records.iter().filter(move |r| r.parent_id == Some(id))
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Re-validate forest invariants (for sets read back from disk)
    ///
    /// # Errors
    /// The first violated invariant, as for insertion.
    pub fn validate(&self, catalog: &Catalog) -> Result<(), AssertionError> {
        for record in &self.records {
            let Some(parent_id) = record.parent_id else {
                continue;
            };
            let parent = self
                .get(parent_id)
                .ok_or(AssertionError::UnknownParent(parent_id))?;
            if parent.layer != Layer::Structural || parent.parent_id.is_some() {
                return Err(AssertionError::ParentNotStructural(parent_id));
            }
            let DimensionId::Grounding(grounding) = record.dimension else {
                return Err(AssertionError::CandidateNotAllowed {
                    parent_dimension: parent.dimension.id().to_string(),
                    grounding: record.dimension.id().to_string(),
                });
            };
            let allowed = match parent.dimension {
                DimensionId::Structural(structural) => catalog
                    .candidates_for(structural)
                    .iter()
                    .any(|c| c.dimension == grounding),
                _ => false,
            };
            if !allowed {
                return Err(AssertionError::CandidateNotAllowed {
                    parent_dimension: parent.dimension.id().to_string(),
                    grounding: grounding.id().to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqa_taxonomy::StructuralDimension;

    fn catalog() -> Catalog {
        Catalog::load().unwrap()
    }

    #[test]
    fn primary_insertion_assigns_catalog_level_and_weight() {
        let catalog = catalog();
        let mut set = AssertionSet::new();
        let id = set.insert_primary(
            &catalog,
            StructuralDimension::AttendeesListed.into(),
            "plan lists attendees",
            "the plan should list everyone attending",
        );

        let record = set.get(id).unwrap();
        assert_eq!(record.layer, Layer::Structural);
        assert_eq!(record.level, AssertionLevel::Critical);
        assert_eq!(record.weight, 3);
        assert!(record.is_primary());
    }

    #[test]
    fn grounding_child_links_to_parent() {
        let catalog = catalog();
        let mut set = AssertionSet::new();
        let parent = set.insert_primary(
            &catalog,
            StructuralDimension::AttendeesListed.into(),
            "plan lists attendees",
            "orig",
        );
        let child = set
            .insert_grounding(
                &catalog,
                parent,
                GroundingDimension::AttendeeGrounding,
                "attendees must exist in the scenario",
                "orig",
            )
            .unwrap();

        let record = set.get(child).unwrap();
        assert_eq!(record.parent_id, Some(parent));
        assert_eq!(record.layer, Layer::Grounding);
        assert_eq!(set.children_of(parent).count(), 1);
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let catalog = catalog();
        let mut set = AssertionSet::new();
        let err = set
            .insert_grounding(
                &catalog,
                AssertionId::new(),
                GroundingDimension::AttendeeGrounding,
                "t",
                "o",
            )
            .unwrap_err();
        assert!(matches!(err, AssertionError::UnknownParent(_)));
    }

    #[test]
    fn grounding_under_grounding_is_rejected() {
        let catalog = catalog();
        let mut set = AssertionSet::new();
        let standalone = set.insert_primary(
            &catalog,
            GroundingDimension::DateTimeGrounding.into(),
            "date must match",
            "o",
        );
        let err = set
            .insert_grounding(
                &catalog,
                standalone,
                GroundingDimension::AttendeeGrounding,
                "t",
                "o",
            )
            .unwrap_err();
        assert!(matches!(err, AssertionError::ParentNotStructural(_)));
    }

    #[test]
    fn non_candidate_grounding_is_rejected() {
        let catalog = catalog();
        let mut set = AssertionSet::new();
        let parent = set.insert_primary(
            &catalog,
            StructuralDimension::ScheduleSpecified.into(),
            "schedule present",
            "o",
        );
        // G3 is not a candidate for S3
        let err = set
            .insert_grounding(
                &catalog,
                parent,
                GroundingDimension::ArtifactGrounding,
                "t",
                "o",
            )
            .unwrap_err();
        assert!(matches!(err, AssertionError::CandidateNotAllowed { .. }));
    }

    #[test]
    fn unmapped_parent_accepts_no_children() {
        let catalog = catalog();
        let mut set = AssertionSet::new();
        let parent = set.insert_primary(&catalog, DimensionId::Unmapped, "???", "o");
        let err = set
            .insert_grounding(
                &catalog,
                parent,
                GroundingDimension::AttendeeGrounding,
                "t",
                "o",
            )
            .unwrap_err();
        assert!(matches!(err, AssertionError::CandidateNotAllowed { .. }));
    }

    #[test]
    fn serde_round_trip_revalidates() {
        let catalog = catalog();
        let mut set = AssertionSet::new();
        let parent = set.insert_primary(
            &catalog,
            StructuralDimension::TaskOwnership.into(),
            "tasks have owners",
            "o",
        );
        set.insert_grounding(
            &catalog,
            parent,
            GroundingDimension::AttendeeGrounding,
            "owners must be attendees",
            "o",
        )
        .unwrap();

        let json = serde_json::to_string(&set).unwrap();
        let back: AssertionSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        back.validate(&catalog).unwrap();
    }
}
