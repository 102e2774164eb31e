//! Error types for path matching and value setting.

use crate::document::node::NodeKind;
use thiserror::Error;

/// Errors returned by the matcher, the setters and the batch applier.
///
/// The first error aborts the traversal or batch that produced it. Nodes
/// mutated before the error stay mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A path segment needed a container of one kind but found another.
    #[error("path '{path}' expected a {expected} but found a {found}")]
    PathTypeMismatch {
        path: String,
        expected: NodeKind,
        found: NodeKind,
    },
    /// `set_entry` was applied to something other than a mapping.
    #[error("cannot set entry '{key}' on a {found}, expected a mapping")]
    TargetNotMapping { key: String, found: NodeKind },
    /// `set_scalar` was applied to something other than a scalar.
    #[error("cannot set a scalar value on a {found}")]
    TargetNotScalar { found: NodeKind },
    /// The path specification is malformed.
    #[error("invalid path specification '{path}': {message}")]
    InvalidPathSpecification { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
