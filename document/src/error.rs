//! Error types for document operations.
//!
//! Covers file loading, structural edits that would break the tree, and
//! schema inconsistencies found while reconciling children.

use thiserror::Error;

use crate::LineId;

/// Errors that can occur while loading or editing a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// No line with this id was ever created in the document.
    #[error("line {0} does not exist")]
    UnknownLine(LineId),

    /// The reference line is not a child of the given parent.
    #[error("line {child} is not a child of line {parent}")]
    NotAChild { parent: LineId, child: LineId },

    /// The line is detached or is the root.
    #[error("line {0} has no parent")]
    NoParent(LineId),

    /// Deletion was refused by the deletion rules.
    #[error("line {0} cannot be deleted")]
    NotDeletable(LineId),

    /// The parent's child policy is `no_child`.
    #[error("line {0} does not accept children")]
    ChildrenNotAllowed(LineId),

    /// The parent's children are the fixed set its order declares.
    #[error("line {0} has predefined children and takes no new lines")]
    FixedChildren(LineId),

    /// The move would make a line its own ancestor.
    #[error("moving line {child} under line {parent} would create a cycle")]
    Cycle { parent: LineId, child: LineId },

    /// The root line has no text and is never moved.
    #[error("the root line cannot be edited or moved")]
    RootLine,

    /// A `pre_defined_child` line whose order no longer resolves.
    #[error("line {line}: predefined children of «{name}» cannot be resolved")]
    UnresolvedPredefinedOrder { line: LineId, name: String },

    /// A catalog file failed definition validation.
    #[error("invalid catalog {path}: {errors}")]
    InvalidCatalog { path: String, errors: String },

    /// Malformed outline text.
    #[error("outline line {line}: {message}")]
    Outline { line: usize, message: String },

    /// The file extension does not name a known format.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
}

/// Convenience alias for results with [`DocumentError`].
pub type Result<T> = std::result::Result<T, DocumentError>;
