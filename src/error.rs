use std::fmt;

use thiserror::Error;

use crate::model::BarrierId;

/// Top-level error type for hole placement.
#[derive(Debug, Error)]
pub enum PerforaError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// A host resource that must resolve before any element is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The mechanical model, looked up by a title substring.
    SourceModel { needle: String },
    /// The model that receives the placeholders.
    TargetModel,
    /// The placeholder family type in the target model.
    PlaceholderType { family: String },
    /// A non-template 3D view in the target model.
    View3D,
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceModel { needle } => write!(f, "model with title containing {needle:?}"),
            Self::TargetModel => f.write_str("active target model"),
            Self::PlaceholderType { family } => write!(f, "placeholder family {family:?}"),
            Self::View3D => f.write_str("non-template 3D view"),
        }
    }
}

/// Errors raised before the batch touches the model.
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("unresolved preconditions: {}", join(.missing))]
    Unresolved { missing: Vec<Precondition> },
}

impl PreconditionError {
    /// Returns the preconditions that failed to resolve.
    #[must_use]
    pub fn missing(&self) -> &[Precondition] {
        match self {
            Self::Unresolved { missing } => missing,
        }
    }
}

/// Errors related to centerline geometry and ray queries.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("ray query failed: {0}")]
    RayQuery(String),
}

/// Errors raised while turning a hit into a placement request.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("barrier {barrier} has no resolvable level")]
    MissingLevel { barrier: BarrierId },
}

/// Errors raised by the placement sink or the transaction host.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("placeholder creation failed: {0}")]
    CreationFailed(String),

    #[error("placeholder has no parameter {name:?}")]
    ParameterMissing { name: String },

    #[error("placeholder type {family:?} is not active")]
    TypeInactive { family: String },

    #[error("transaction error: {0}")]
    Transaction(String),
}

fn join(items: &[Precondition]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience type alias for results using [`PerforaError`].
pub type Result<T> = std::result::Result<T, PerforaError>;
