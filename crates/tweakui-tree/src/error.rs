//! Tree and value errors.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `TreeError::Path` | Path text has no segments or an empty segment | Hard failure at the accessor |
//! | `TreeError::DuplicatePath` | Path already holds a node of another variant | Hard failure (type confusion) |
//! | `TreeError::UnknownNode` | Stale or foreign `NodeId` | Returned, never panics |
//! | `ValueError::*` | Loaded value does not fit the node | Caller falls back to the default |

use std::fmt;

use tweakui_core::path::{PathError, PathKey};

use crate::node::{NodeId, NodeVariant};

/// Errors from structural tree operations.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeError {
    /// The path could not be parsed.
    Path(PathError),
    /// The path is occupied by a live node of a different variant.
    DuplicatePath {
        path: PathKey,
        existing: NodeVariant,
        requested: NodeVariant,
    },
    /// No live node has this id.
    UnknownNode(NodeId),
    /// The index and the arena disagree. Only produced by `NodeTree::validate`.
    Inconsistent(String),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::Path(e) => write!(f, "{e}"),
            TreeError::DuplicatePath {
                path,
                existing,
                requested,
            } => write!(
                f,
                "path {path} already holds a {existing} node, cannot declare a {requested}"
            ),
            TreeError::UnknownNode(id) => write!(f, "unknown node {id}"),
            TreeError::Inconsistent(msg) => write!(f, "tree inconsistent: {msg}"),
        }
    }
}

impl std::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TreeError::Path(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PathError> for TreeError {
    fn from(e: PathError) -> Self {
        TreeError::Path(e)
    }
}

/// Errors from applying a stored value onto a node.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueError {
    /// The value kind does not match the node variant.
    TypeMismatch {
        variant: NodeVariant,
        found: &'static str,
    },
    /// The value lies outside a constrained slider's range, or is not finite.
    OutOfRange { value: f32, min: f32, max: f32 },
    /// The variant has no persisted value.
    NotPersisted(NodeVariant),
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::TypeMismatch { variant, found } => {
                write!(f, "{variant} node cannot hold a {found} value")
            }
            ValueError::OutOfRange { value, min, max } => {
                write!(f, "value {value} outside [{min}, {max}]")
            }
            ValueError::NotPersisted(variant) => write!(f, "{variant} node has no stored value"),
        }
    }
}

impl std::error::Error for ValueError {}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
