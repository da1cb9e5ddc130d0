//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::arena::NodeId;

/// Domain errors represent violations of tree and property preconditions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    #[error("node {child:?} is already attached to {parent:?}")]
    AlreadyAttached { child: NodeId, parent: NodeId },

    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    CycleDetected { parent: NodeId, child: NodeId },

    #[error("index {index} out of range for {len} children of {parent:?}")]
    IndexOutOfRange {
        parent: NodeId,
        index: usize,
        len: usize,
    },

    #[error("child {child:?} expected at index {index} of {parent:?}")]
    ChildMismatch {
        parent: NodeId,
        index: usize,
        child: NodeId,
    },

    #[error("property not found: {path} on {node:?}")]
    PropertyNotFound { node: NodeId, path: String },

    #[error("property {path} on {node:?} is not an object")]
    NotAnObject { node: NodeId, path: String },

    #[error("empty property path")]
    EmptyPath,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
