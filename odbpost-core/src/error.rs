//! Error types for odbpost operations.

use thiserror::Error;

/// Result type alias using odbpost Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving coordinates or reconciling records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed nodal-coordinate or natural-coordinate shapes.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Element type without a shape-function implementation.
    ///
    /// The evaluator absorbs this case with a warning and a degenerate point;
    /// the variant exists so callers can report it.
    #[error("unsupported element type: {0}")]
    UnsupportedElementType(String),

    /// The requested field or entity subset yielded nothing.
    #[error("empty subset: {0}")]
    EmptySubset(String),

    /// Archive data that contradicts itself (instance counts, channel widths,
    /// sample ordinals, missing labels).
    #[error("structural inconsistency: {0}")]
    StructuralInconsistency(String),

    /// A record was not positionally aligned with the expected label.
    ///
    /// Only surfaced when strict ordering is requested.
    #[error("ordering mismatch: label {label} of instance {instance:?} is out of position")]
    OrderingMismatch {
        /// Instance of the misplaced entity.
        instance: Option<String>,
        /// Label of the misplaced entity.
        label: i64,
    },

    /// Error reported by the result archive.
    #[error("archive error: {0}")]
    Archive(String),

    /// Error reported by the table sink.
    #[error("sink error: {0}")]
    Sink(String),
}
