//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`SpaceHubError`] via `#[from]`.

use crate::description::EntityKind;

/// Top-level error shared by the domain and application layers.
#[derive(Debug, thiserror::Error)]
pub enum SpaceHubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    InvalidReference(#[from] InvalidReferenceError),
}

/// A domain invariant was violated while building a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("identifier must not be empty")]
    EmptyId,

    #[error("name must not be empty")]
    EmptyName,

    #[error("identifier {0} is already registered")]
    DuplicateId(String),
}

/// A lookup by identity did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A caller handed in a reference that cannot be used where it was given.
///
/// This is a wiring defect, never a recoverable runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidReferenceError {
    /// The model belongs to a different collection than the one it is used with.
    #[error("{id} is not owned by the collection it was used with")]
    ForeignModel { id: String },

    /// The entity exists but is not of the kind the operation needs.
    #[error("{id} is a {actual} entity, expected {expected}")]
    WrongKind {
        id: String,
        expected: EntityKind,
        actual: EntityKind,
    },
}
