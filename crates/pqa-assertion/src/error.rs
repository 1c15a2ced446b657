//! Error types for assertion records

use crate::record::AssertionId;

/// Forest-invariant violations
#[derive(Debug, Clone, thiserror::Error)]
pub enum AssertionError {
    /// Parent ID does not reference a record in the set
    #[error("unknown parent assertion: {0}")]
    UnknownParent(AssertionId),

    /// Parent exists but is not a structural root
    #[error("parent assertion {0} is not a structural root")]
    ParentNotStructural(AssertionId),

    /// Grounding dimension is outside the parent's catalog candidate set
    #[error("grounding '{grounding}' is not a catalog candidate for '{parent_dimension}'")]
    CandidateNotAllowed {
        /// The parent's dimension ID
        parent_dimension: String,
        /// The offending grounding ID
        grounding: String,
    },
}
