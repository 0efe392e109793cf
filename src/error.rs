//! Error types surfaced by tree mutation and cursor positioning.

use thiserror::Error;

/// Failure conditions a caller must be able to react to.
///
/// `NotFound` is intentionally absent here: a missing key on `get`/`remove`
/// is a normal return (`None`/`false`), not an error.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TreeError {
    /// An internal allocation failed while inserting a key. The tree remains
    /// structurally valid, though the attempted insert did not complete.
    #[error("allocation failure while inserting into the tree")]
    OutOfMemory,

    /// `Cursor::try_seek` was given an operator string it doesn't recognize.
    /// The cursor is left positioned at EOF.
    #[error("unrecognized seek operator: {0:?}")]
    InvalidSeekOp(String),
}
