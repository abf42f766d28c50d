//! Shared data contracts between the matching layer, the resolver and the dialogue layer.
//! Candidate matches flow in, analysis situations flow out; both sides are validated here.

mod candidate;
mod category;
mod situation;

pub use candidate::*;
pub use category::*;
pub use situation::*;

/// Identifier of a cube (an IRI in the metadata store).
pub type CubeId = String;
/// Identifier of a cube element: measure, level, predicate.
pub type ElementId = String;
/// Identifier of a dimension.
pub type DimensionId = String;
/// Identifier of an element type.
pub type TypeId = String;

/// Shared error type for contract validation routines.
#[derive(thiserror::Error, Debug)]
pub enum ContractError {
    #[error("score {score} of element {element} is outside [0, 1]")]
    ScoreOutOfRange { element: String, score: f64 },
    #[error("{category} matches require {expected}")]
    MissingExtra {
        category: CategoryTag,
        expected: &'static str,
    },
    #[error("{category} matches do not carry extra attributes")]
    UnexpectedExtra { category: CategoryTag },
    #[error("field must not be empty: {0}")]
    EmptyField(&'static str),
    #[error("match of category {found} filed under {expected}")]
    CategoryMismatch {
        expected: CategoryTag,
        found: CategoryTag,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Semantic validation on top of schema-compatible deserialization. Input from the
/// matching layer passes through this before it reaches the resolver.
pub trait Validate {
    fn validate(&self) -> Result<(), ContractError>;
}
