//! Error types for choice authoring and field validation.

use thiserror::Error;

/// Structural errors in an authored choice tree.
///
/// These surface to whoever edits the choice text and fail the settings save.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChoiceError {
    /// A text line that does not match `<path> : <label>`.
    #[error("line {line}: {reason} (`{content}`)")]
    MalformedLine {
        /// 1-based line number in the decoded text.
        line: usize,
        content: String,
        reason: &'static str,
    },

    /// A choice that cannot be written back to text.
    #[error("choice '{path}' cannot be encoded: {reason}")]
    MalformedChoice { path: String, reason: &'static str },

    /// Two siblings share the same key.
    #[error("duplicate choice key '{key}' under '{parent}'")]
    DuplicateKey {
        /// `/`-joined path of the parent, empty at root level.
        parent: String,
        key: String,
    },
}

/// Validation failures for a submitted selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("field '{field}' requires a selection")]
    Required { field: String },

    /// The selection names a key that is not in the current tree.
    #[error("field '{field}': '{key}' is not a valid choice at depth {depth}")]
    BrokenPath {
        field: String,
        depth: usize,
        key: String,
    },

    /// A non-leaf choice was selected while parent selection is disabled.
    #[error("field '{field}': '{path}' has sub-choices, select one of them")]
    ParentNotAllowed { field: String, path: String },
}
