//! Choice codec: line-oriented text ⇄ [`ChoiceTree`].
//!
//! ## Text format
//!
//! ```text
//! region : Region
//! region / north : North
//! region / north / store-12 : Store 12
//! online : Online
//! ```
//!
//! Each line is `<ancestor keys> / <key> : <label>`. Root lines have no
//! ancestor prefix. The encoder writes ancestors separated by `" / "`; the
//! decoder also accepts the compact `region/north` form, since keys never
//! contain `/` (it is the storage separator of [`SelectionPath`]).
//!
//! Decoding creates missing ancestors on first reference with the key as a
//! placeholder label, so lines may appear in any order.
//!
//! [`SelectionPath`]: crate::SelectionPath

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ChoiceError;
use crate::form::VALUE_KEY;
use crate::path::STORAGE_SEPARATOR;
use crate::tree::{position, Choice, ChoiceTree};

/// Separator written between path segments.
pub const PATH_SEPARATOR: &str = " / ";

/// Separator between a line's path and its label.
pub const LABEL_SEPARATOR: &str = " : ";

/// What to do with a line that does not match `<path> : <label>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnMalformed {
    /// Fail the whole decode (default).
    #[default]
    Error,
    /// Drop the line, log a warning and report it in [`Decoded::skipped`].
    Skip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub on_malformed: OnMalformed,
}

impl DecodeOptions {
    /// Legacy behaviour: malformed lines are skipped instead of failing.
    pub fn lenient() -> Self {
        Self {
            on_malformed: OnMalformed::Skip,
        }
    }
}

/// Result of [`decode_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub tree: ChoiceTree,
    /// `MalformedLine` errors for lines dropped in [`OnMalformed::Skip`] mode.
    pub skipped: Vec<ChoiceError>,
}

// =============================================================================
// Encode
// =============================================================================

/// Write a tree as one line per choice, parent before children.
///
/// Returns an empty string for an empty tree.
///
/// # Errors
///
/// `MalformedChoice` if a key or label could not be decoded back to the same
/// tree, or a key is reserved for form values.
pub fn encode(tree: &ChoiceTree) -> Result<String, ChoiceError> {
    let mut out = String::new();
    let mut result = Ok(());

    tree.walk(|entry| {
        if result.is_err() {
            return;
        }
        if let Err(e) = check_encodable(entry.ancestors, entry.choice) {
            result = Err(e);
            return;
        }
        for ancestor in entry.ancestors {
            out.push_str(ancestor);
            out.push_str(PATH_SEPARATOR);
        }
        out.push_str(entry.choice.key());
        out.push_str(LABEL_SEPARATOR);
        out.push_str(entry.choice.label());
        out.push('\n');
    });

    result?;
    debug!(choices = tree.len(), bytes = out.len(), "encoded choice tree");
    Ok(out)
}

fn check_encodable(ancestors: &[&str], choice: &Choice) -> Result<(), ChoiceError> {
    let label = choice.label();
    let reason = key_problem(choice.key()).or_else(|| {
        if label.trim().is_empty() {
            Some("empty label")
        } else if label.trim() != label {
            Some("label has surrounding whitespace")
        } else if label.contains(['\n', '\r']) {
            Some("line break")
        } else {
            None
        }
    });

    match reason {
        None => Ok(()),
        Some(reason) => {
            let mut path = ancestors.join("/");
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(choice.key());
            Err(ChoiceError::MalformedChoice { path, reason })
        }
    }
}

// =============================================================================
// Decode
// =============================================================================

/// Decode choice text strictly.
pub fn decode(text: &str) -> Result<ChoiceTree, ChoiceError> {
    decode_with(text, DecodeOptions::default()).map(|decoded| decoded.tree)
}

/// Decode choice text with explicit options.
///
/// Blank lines are ignored in every mode. `DuplicateKey` always fails,
/// regardless of [`OnMalformed`].
pub fn decode_with(text: &str, options: DecodeOptions) -> Result<Decoded, ChoiceError> {
    let mut tree = ChoiceTree::new();
    let mut explicit: HashSet<Vec<String>> = HashSet::new();
    let mut skipped = Vec::new();

    for (idx, raw) in text.split('\n').enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let (segments, label) = match tokenize(line, idx + 1) {
            Ok(parsed) => parsed,
            Err(e) => match options.on_malformed {
                OnMalformed::Error => return Err(e),
                OnMalformed::Skip => {
                    warn!(error = %e, "skipping malformed choice line");
                    skipped.push(e);
                    continue;
                }
            },
        };

        if !explicit.insert(segments.clone()) {
            let (key, parents) = segments
                .split_last()
                .map(|(k, p)| (k.clone(), p.join("/")))
                .unwrap_or_default();
            return Err(ChoiceError::DuplicateKey { parent: parents, key });
        }

        insert_line(&mut tree, &segments, label);
    }

    debug!(
        choices = tree.len(),
        skipped = skipped.len(),
        "decoded choice text"
    );
    Ok(Decoded { tree, skipped })
}

/// Why `key` cannot appear as a path segment, if it cannot.
///
/// A key must survive a write/read cycle: it may not be blank, carry
/// surrounding whitespace, contain the storage separator, or form `" : "`
/// together with the spaces of a neighbouring `" / "`. `value` and brackets
/// are taken by the nested form value and selector names.
pub(crate) fn key_problem(key: &str) -> Option<&'static str> {
    if key.is_empty() {
        Some("empty key")
    } else if key.trim() != key {
        Some("key has surrounding whitespace")
    } else if key.contains(STORAGE_SEPARATOR) {
        Some("key contains '/'")
    } else if format!(" {key} ").contains(LABEL_SEPARATOR) {
        Some("key contains the label separator")
    } else if key.contains(['\n', '\r']) {
        Some("line break")
    } else if key == VALUE_KEY || key.contains(['[', ']']) {
        Some("reserved key")
    } else {
        None
    }
}

/// Split one line into its key path and label.
fn tokenize(line: &str, line_no: usize) -> Result<(Vec<String>, String), ChoiceError> {
    let malformed = |reason| ChoiceError::MalformedLine {
        line: line_no,
        content: line.to_string(),
        reason,
    };

    let (path, label) = line
        .split_once(LABEL_SEPARATOR)
        .ok_or_else(|| malformed("missing ' : ' separator"))?;

    let label = label.trim();
    if label.is_empty() {
        return Err(malformed("empty label"));
    }
    if line.contains('\r') {
        return Err(malformed("stray carriage return"));
    }

    let segments: Vec<String> = path
        .split(STORAGE_SEPARATOR)
        .map(|s| s.trim().to_string())
        .collect();
    if let Some(reason) = segments.iter().find_map(|s| key_problem(s)) {
        return Err(malformed(reason));
    }

    Ok((segments, label.to_string()))
}

/// Create-or-fetch each ancestor by index, then set the final node.
///
/// `segments` is non-empty (guaranteed by [`tokenize`]).
fn insert_line(tree: &mut ChoiceTree, segments: &[String], label: String) {
    let Some((key, ancestors)) = segments.split_last() else {
        return;
    };

    let mut level = tree.roots_mut();
    for ancestor in ancestors {
        let idx = match position(level, ancestor) {
            Some(idx) => idx,
            None => {
                level.push(Choice::new(ancestor.as_str(), ancestor.as_str()));
                level.len() - 1
            }
        };
        level = level[idx].children_mut();
    }

    match position(level, key) {
        Some(idx) => level[idx].set_label(label),
        None => level.push(Choice::new(key.as_str(), label)),
    }
}
