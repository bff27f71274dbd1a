//! Error types for the annotation editor

use thiserror::Error;

/// Errors from tree-index operations and the command history.
///
/// Every failure is synchronous and non-corrupting: a failed operation
/// leaves the tree exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("region id already present: {0}")]
    DuplicateId(String),

    #[error("unknown region id: {0}")]
    UnknownId(String),

    #[error("unknown parent id: {0}")]
    UnknownParent(String),

    #[error("reparenting {id} under {new_parent} would create a cycle")]
    CycleDetected { id: String, new_parent: String },

    #[error("field `{0}` cannot be edited through a metadata patch")]
    ImmutableFieldViolation(String),

    #[error("region {id} refers to parent {parent}, which does not exist")]
    DanglingParent { id: String, parent: String },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}

/// Errors from reading or writing the exchange format.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("region {id}: image blob is not valid base64: {source}")]
    BadImageData {
        id: String,
        source: base64::DecodeError,
    },

    #[error("region {0}: coordinates must not be empty")]
    EmptyCoordinates(String),
}

/// Top-level error for callers of the editor crate.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error("invalid region outline: {0}")]
    Geometry(#[from] pagemark_model::GeometryError),

    #[error("document has no backing file; use save_as")]
    NoBackingFile,
}
