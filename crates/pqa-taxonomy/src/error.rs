//! Error types for the taxonomy catalog

/// Catalog construction and lookup errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    /// ID string does not name a registered dimension
    #[error("unknown dimension id: '{0}'")]
    UnknownDimension(String),

    /// Applicability map references a grounding ID missing from the catalog
    #[error("applicability map references unregistered grounding dimension '{grounding}' under '{structural}'")]
    DanglingCandidate {
        /// Structural dimension whose candidate list is bad
        structural: String,
        /// The unregistered grounding ID
        grounding: String,
    },

    /// Applicability map keys a structural ID that is not in the catalog
    #[error("applicability map keyed by unregistered structural dimension '{0}'")]
    DanglingMapKey(String),

    /// Applicability map lists the same structural dimension twice
    #[error("duplicate applicability map entry for '{0}'")]
    DuplicateMapKey(String),
}
