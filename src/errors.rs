//! Error types for one diff/patch cycle; every failure is local to the cycle
//! that raised it and there is no retry policy.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The virtual tree is malformed (empty tag name, structured value under
    /// a non-reserved property name, thunk rendering to another thunk).
    /// Raised at the
    /// point of first traversal; no partial patch list is returned.
    #[error("invalid virtual tree: {details}")]
    Validation { details: String },

    /// A property is configured in a way the diff cannot honor, e.g. a hook
    /// value under one of the reserved `attributes`/`style` sub-mappings.
    #[error("invalid configuration for property '{property}': {details}")]
    Config { property: String, details: String },

    /// A patch address could not be resolved against the live tree, or the
    /// resolved node does not have the kind the patch expects. Usually means
    /// the patch list was applied to a live tree it was not computed from.
    #[error("cannot address live node {address}: {details}")]
    Addressing { address: usize, details: String },
}

impl ReconcileError {
    pub(crate) fn validation(details: impl Into<String>) -> Self {
        ReconcileError::Validation { details: details.into() }
    }

    pub(crate) fn addressing(address: usize, details: impl Into<String>) -> Self {
        ReconcileError::Addressing { address, details: details.into() }
    }
}
